// SPDX-License-Identifier: GPL-3.0-only

//! Touch-to-focus coordinate mapping
//!
//! A touch has to travel through four coordinate systems before a driver can
//! use it: view pixels, sensor-aligned view pixels (undoing the display
//! rotation), preview pixels (undoing letterbox/crop and scale), and finally
//! the driver's own space, which is either the active sensor array or a
//! fixed `[-1000, 1000]` square.

use super::types::{Rect, Rotation, Size};
use crate::constants::{
    FOCUS_RECT_FRACTION, LEGACY_FOCUS_AREA_SIZE, LEGACY_FOCUS_SPACE_MAX, LEGACY_FOCUS_SPACE_MIN,
    METERING_WEIGHT_MAX,
};
use serde::{Deserialize, Serialize};

/// Coordinate space a driver expects focus regions in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverCoordinateSpace {
    /// Native pixels of the active sensor array
    ActiveArray(Rect),
    /// Fixed symmetric square from -1000 to 1000 on both axes
    Normalized,
}

/// Weighted region handed to the driver for autofocus/auto-exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    pub rect: Rect,
    pub weight: i32,
}

/// Map a touch in view coordinates to a focus rectangle in preview pixels.
///
/// Returns `None` when the touch lands outside the visible part of the
/// preview or when the inputs are degenerate.
pub fn compute_focus_region(
    view: Size,
    preview: Size,
    scale: f32,
    delta: Rotation,
    touch_x: f32,
    touch_y: f32,
) -> Option<Rect> {
    if view.is_unknown() || preview.is_unknown() || !(scale > 0.0) {
        return None;
    }
    if !touch_x.is_finite() || !touch_y.is_finite() {
        return None;
    }

    let view_w = view.width as f32;
    let view_h = view.height as f32;
    let preview_w = preview.width as f32;
    let preview_h = preview.height as f32;

    // View dimensions along the sensor axes
    let (rotated_view_w, rotated_view_h) = if delta.swaps_dimensions() {
        (view_h, view_w)
    } else {
        (view_w, view_h)
    };

    let (x, y) = match delta {
        Rotation::Deg0 => (touch_x, touch_y),
        Rotation::Deg90 => (touch_y, view_w - touch_x),
        Rotation::Deg180 => (view_w - touch_x, view_h - touch_y),
        Rotation::Deg270 => (view_h - touch_y, touch_x),
    };

    let scaled_w = preview_w * scale;
    let scaled_h = preview_h * scale;

    // Negative when the preview overflows the view (fill), positive when letterboxed
    let offset_x = (rotated_view_w - scaled_w) / 2.0;
    let offset_y = (rotated_view_h - scaled_h) / 2.0;

    let visible_left = offset_x.max(0.0);
    let visible_top = offset_y.max(0.0);
    let visible_right = (offset_x + scaled_w).min(rotated_view_w);
    let visible_bottom = (offset_y + scaled_h).min(rotated_view_h);
    if x < visible_left || x > visible_right || y < visible_top || y > visible_bottom {
        return None;
    }

    let preview_x = (x - offset_x) / scale;
    let preview_y = (y - offset_y) / scale;

    let rect_w = preview_w * FOCUS_RECT_FRACTION;
    let rect_h = preview_h * FOCUS_RECT_FRACTION;
    let left = (preview_x - rect_w / 2.0).clamp(0.0, preview_w - rect_w) as i32;
    let top = (preview_y - rect_h / 2.0).clamp(0.0, preview_h - rect_h) as i32;
    let right = (left + rect_w as i32).min(preview.width as i32 - 1);
    let bottom = (top + rect_h as i32).min(preview.height as i32 - 1);

    Some(Rect::new(left, top, right, bottom))
}

/// Rescale a preview-pixel focus region into the driver's coordinate space.
pub fn map_focus_region_to_driver_space(
    region: Rect,
    preview: Size,
    space: DriverCoordinateSpace,
) -> Option<FocusArea> {
    if preview.is_unknown() {
        return None;
    }

    match space {
        DriverCoordinateSpace::ActiveArray(active) => {
            if active.is_empty() {
                return None;
            }
            let scale_x = active.width() as f32 / preview.width as f32;
            let scale_y = active.height() as f32 / preview.height as f32;
            Some(FocusArea {
                rect: Rect::new(
                    (scale_x * region.left as f32) as i32,
                    (scale_y * region.top as f32) as i32,
                    (scale_x * region.right as f32) as i32,
                    (scale_y * region.bottom as f32) as i32,
                ),
                weight: METERING_WEIGHT_MAX,
            })
        }
        DriverCoordinateSpace::Normalized => {
            let span = (LEGACY_FOCUS_SPACE_MAX - LEGACY_FOCUS_SPACE_MIN) as f32;
            let ratio_w = span / preview.width as f32;
            let ratio_h = span / preview.height as f32;
            let min = LEGACY_FOCUS_SPACE_MIN as f32;
            let max = (LEGACY_FOCUS_SPACE_MAX - LEGACY_FOCUS_AREA_SIZE) as f32;

            let left = (ratio_w * region.left as f32 + min).clamp(min, max) as i32;
            let top = (ratio_h * region.top as f32 + min).clamp(min, max) as i32;
            let right = (left + LEGACY_FOCUS_AREA_SIZE).min(LEGACY_FOCUS_SPACE_MAX);
            let bottom = (top + LEGACY_FOCUS_AREA_SIZE).min(LEGACY_FOCUS_SPACE_MAX);

            Some(FocusArea {
                rect: Rect::new(left, top, right, bottom),
                weight: METERING_WEIGHT_MAX,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_touch_is_centered() {
        let rect = compute_focus_region(
            Size::new(1000, 1000),
            Size::new(1000, 1000),
            1.0,
            Rotation::Deg0,
            500.0,
            500.0,
        )
        .unwrap();
        assert_eq!(rect, Rect::new(450, 450, 550, 550));
    }

    #[test]
    fn test_touch_in_letterbox_is_rejected() {
        // 2000x1000 preview fitted into 1000x1000 view: visible band y in [250, 750]
        let view = Size::new(1000, 1000);
        let preview = Size::new(2000, 1000);
        assert!(compute_focus_region(view, preview, 0.5, Rotation::Deg0, 500.0, 100.0).is_none());
        assert!(compute_focus_region(view, preview, 0.5, Rotation::Deg0, 500.0, 400.0).is_some());
    }

    #[test]
    fn test_corner_touch_is_clamped() {
        let rect = compute_focus_region(
            Size::new(1000, 1000),
            Size::new(1000, 1000),
            1.0,
            Rotation::Deg0,
            1000.0,
            1000.0,
        )
        .unwrap();
        assert_eq!(rect.right, 999);
        assert_eq!(rect.bottom, 999);
        assert_eq!(rect.left, 900);
    }

    #[test]
    fn test_rotated_touch_maps_to_sensor_axes() {
        // Portrait view, landscape sensor buffer rotated by 90: a touch at the
        // top center of the view is the left middle of the sensor buffer.
        let view = Size::new(1080, 1920);
        let preview = Size::new(1920, 1080);
        let rect =
            compute_focus_region(view, preview, 1.0, Rotation::Deg90, 540.0, 0.0).unwrap();
        assert_eq!(rect.left, 0);
        assert_eq!(rect.top, 486);
    }

    #[test]
    fn test_region_stays_within_preview() {
        let view = Size::new(1080, 1920);
        let preview = Size::new(640, 480);
        for delta in Rotation::ALL {
            for step_x in 0..=10 {
                for step_y in 0..=10 {
                    let x = step_x as f32 * 108.0;
                    let y = step_y as f32 * 192.0;
                    if let Some(rect) = compute_focus_region(view, preview, 2.25, delta, x, y) {
                        assert!(rect.left >= 0 && rect.top >= 0);
                        assert!(rect.right < 640 && rect.bottom < 480);
                        assert!(rect.left <= rect.right && rect.top <= rect.bottom);
                    }
                }
            }
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        let size = Size::new(100, 100);
        assert!(compute_focus_region(Size::UNKNOWN, size, 1.0, Rotation::Deg0, 1.0, 1.0).is_none());
        assert!(compute_focus_region(size, size, 0.0, Rotation::Deg0, 1.0, 1.0).is_none());
        assert!(
            compute_focus_region(size, size, 1.0, Rotation::Deg0, f32::NAN, 1.0).is_none()
        );
    }

    #[test]
    fn test_active_array_mapping() {
        let area = map_focus_region_to_driver_space(
            Rect::new(100, 50, 200, 100),
            Size::new(1000, 500),
            DriverCoordinateSpace::ActiveArray(Rect::new(0, 0, 4000, 3000)),
        )
        .unwrap();
        assert_eq!(area.rect, Rect::new(400, 300, 800, 600));
    }

    #[test]
    fn test_normalized_mapping_is_clamped() {
        let preview = Size::new(1000, 1000);
        let area = map_focus_region_to_driver_space(
            Rect::new(950, 950, 999, 999),
            preview,
            DriverCoordinateSpace::Normalized,
        )
        .unwrap();
        assert_eq!(area.rect, Rect::new(800, 800, 1000, 1000));

        let area = map_focus_region_to_driver_space(
            Rect::new(0, 0, 100, 100),
            preview,
            DriverCoordinateSpace::Normalized,
        )
        .unwrap();
        assert_eq!(area.rect, Rect::new(-1000, -1000, -800, -800));
    }
}
