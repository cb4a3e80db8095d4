// SPDX-License-Identifier: GPL-3.0-only

//! Sensor/display orientation arithmetic

use super::types::{Facing, Rotation};

/// Angular correction aligning sensor output with the current display rotation.
///
/// Front sensors are mirrored, so their correction depends on both the
/// mounting angle and the display rotation. Back and external sensors keep
/// the display rotation unchanged.
pub fn display_orientation_delta(
    device_rotation: Rotation,
    sensor_orientation: Rotation,
    facing: Facing,
) -> Rotation {
    match facing {
        Facing::Front => {
            let sum = (sensor_orientation.degrees() + device_rotation.degrees()) % 360;
            Rotation::from_degrees_int(((360 - sum) % 360) as i32)
        }
        Facing::Back | Facing::External => device_rotation,
    }
}

/// Inverse of [`display_orientation_delta`]: the device rotation that produced `delta`.
pub fn device_rotation_for_delta(
    delta: Rotation,
    sensor_orientation: Rotation,
    facing: Facing,
) -> Rotation {
    match facing {
        Facing::Front => {
            let degrees = 720 - delta.degrees() as i32 - sensor_orientation.degrees() as i32;
            Rotation::from_degrees_int(degrees)
        }
        Facing::Back | Facing::External => delta,
    }
}

/// Rotation a captured still needs to appear upright for the current device rotation.
pub fn picture_orientation(
    device_rotation: Rotation,
    sensor_orientation: Rotation,
    facing: Facing,
) -> Rotation {
    let sensor = sensor_orientation.degrees() as i32;
    let device = device_rotation.degrees() as i32;
    match facing {
        Facing::Front => Rotation::from_degrees_int(sensor + device),
        Facing::Back | Facing::External => Rotation::from_degrees_int(sensor - device),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_camera_keeps_device_rotation() {
        for rotation in Rotation::ALL {
            for sensor in Rotation::ALL {
                assert_eq!(
                    display_orientation_delta(rotation, sensor, Facing::Back),
                    rotation
                );
            }
        }
    }

    #[test]
    fn test_front_camera_delta() {
        // sensor 270, device 0 -> (360 - 270) % 360 = 90
        assert_eq!(
            display_orientation_delta(Rotation::Deg0, Rotation::Deg270, Facing::Front),
            Rotation::Deg90
        );
        // sensor 270, device 90 -> (360 - 0) % 360 = 0
        assert_eq!(
            display_orientation_delta(Rotation::Deg90, Rotation::Deg270, Facing::Front),
            Rotation::Deg0
        );
    }

    #[test]
    fn test_round_trip_all_rotations() {
        for facing in [Facing::Front, Facing::Back, Facing::External] {
            for sensor in Rotation::ALL {
                for rotation in Rotation::ALL {
                    let delta = display_orientation_delta(rotation, sensor, facing);
                    assert_eq!(
                        device_rotation_for_delta(delta, sensor, facing),
                        rotation,
                        "facing {facing} sensor {sensor} rotation {rotation}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_picture_orientation() {
        assert_eq!(
            picture_orientation(Rotation::Deg0, Rotation::Deg90, Facing::Back),
            Rotation::Deg90
        );
        assert_eq!(
            picture_orientation(Rotation::Deg90, Rotation::Deg90, Facing::Back),
            Rotation::Deg0
        );
        assert_eq!(
            picture_orientation(Rotation::Deg90, Rotation::Deg270, Facing::Front),
            Rotation::Deg0
        );
    }
}
