// SPDX-License-Identifier: GPL-3.0-only

//! Preview scaling and the view transform
//!
//! A rendering surface stretches whatever buffer it receives to fill the view,
//! which distorts the preview whenever the view and the preview buffer differ
//! in aspect ratio. The transform computed here first undoes that stretch,
//! then applies one uniform scale chosen by the [`PreviewScale`] policy, and
//! finally rotates the content when sensor and display axes are swapped.

use super::focus::compute_focus_region;
use super::matrix::Matrix;
use super::orientation::display_orientation_delta;
use super::types::{Facing, PreviewScale, Rect, Rotation, ScaleFactors, Size};
use serde::{Deserialize, Serialize};

/// Ratios needed to stretch the preview onto the view, plus the policy scale.
///
/// When `delta` is 90° or 270° the preview buffer is rotated on screen, so its
/// width and height are exchanged before the ratios are taken.
pub fn compute_scale_factors(
    view: Size,
    preview: Size,
    delta: Rotation,
    policy: PreviewScale,
) -> ScaleFactors {
    if view.is_unknown() || preview.is_unknown() {
        return ScaleFactors::ZERO;
    }

    let oriented = if delta.swaps_dimensions() {
        preview.swapped()
    } else {
        preview
    };

    let scale_x = view.width as f32 / oriented.width as f32;
    let scale_y = view.height as f32 / oriented.height as f32;
    let scale = match policy {
        PreviewScale::ManualFill | PreviewScale::AutoFill => scale_x.max(scale_y),
        PreviewScale::ManualFit | PreviewScale::AutoFit => scale_x.min(scale_y),
        PreviewScale::Manual => 1.0,
    };

    ScaleFactors {
        scale_x,
        scale_y,
        scale,
    }
}

/// Transform that renders the preview undistorted inside the view.
///
/// Returns a scale-to-zero matrix when the view is not measured yet or the
/// preview size is unknown.
pub fn compute_preview_transform(
    view: Size,
    preview: Size,
    delta: Rotation,
    facing: Facing,
    factors: ScaleFactors,
) -> Matrix {
    if view.is_unknown() || preview.is_unknown() || factors.is_degenerate() {
        return Matrix::scale_to_zero();
    }

    let view_w = view.width as f32;
    let view_h = view.height as f32;
    let (cx, cy) = (view_w / 2.0, view_h / 2.0);
    let ScaleFactors {
        scale_x,
        scale_y,
        scale,
    } = factors;

    let mut matrix = Matrix::IDENTITY;
    if delta.swaps_dimensions() {
        // The buffer is laid out along the other axis once rotated, so the
        // stretch is undone with the view's own aspect ratio folded in.
        matrix.post_scale(
            view_h / view_w / scale_y * scale,
            view_w / view_h / scale_x * scale,
            cx,
            cy,
        );
        let angle = delta.degrees() as f32;
        let angle = if facing == Facing::Front { -angle } else { angle };
        matrix.post_rotate(angle, cx, cy);
    } else {
        matrix.post_scale(1.0 / scale_x * scale, 1.0 / scale_y * scale, cx, cy);
    }

    matrix
}

/// Everything needed to place one preview stream inside one view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviewGeometry {
    /// Measured view size
    pub view: Size,
    /// Preview buffer size as delivered by the sensor
    pub preview: Size,
    /// Current display rotation (or the caller's override)
    pub device_rotation: Rotation,
    /// Fixed sensor mounting orientation
    pub sensor_orientation: Rotation,
    pub facing: Facing,
    pub policy: PreviewScale,
    /// Flip the preview horizontally on top of everything else
    pub mirror: bool,
}

impl PreviewGeometry {
    pub fn delta(&self) -> Rotation {
        display_orientation_delta(self.device_rotation, self.sensor_orientation, self.facing)
    }

    pub fn scale_factors(&self) -> ScaleFactors {
        compute_scale_factors(self.view, self.preview, self.delta(), self.policy)
    }

    /// View transform including the optional mirror flip
    pub fn transform(&self) -> Matrix {
        let mut matrix = compute_preview_transform(
            self.view,
            self.preview,
            self.delta(),
            self.facing,
            self.scale_factors(),
        );
        if self.mirror && !self.view.is_unknown() {
            matrix.post_scale(
                -1.0,
                1.0,
                self.view.width as f32 / 2.0,
                self.view.height as f32 / 2.0,
            );
        }
        matrix
    }

    /// Focus rectangle in preview pixels for a touch in view coordinates
    pub fn focus_region(&self, touch_x: f32, touch_y: f32) -> Option<Rect> {
        // A mirrored view shows the right edge of the sensor on the left
        let x = if self.mirror {
            self.view.width as f32 - touch_x
        } else {
            touch_x
        };
        compute_focus_region(
            self.view,
            self.preview,
            self.scale_factors().scale,
            self.delta(),
            x,
            touch_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_scale_factors_without_rotation() {
        let factors = compute_scale_factors(
            Size::new(1000, 1000),
            Size::new(2000, 1000),
            Rotation::Deg0,
            PreviewScale::AutoFit,
        );
        assert!((factors.scale_x - 0.5).abs() < EPS);
        assert!((factors.scale_y - 1.0).abs() < EPS);
        assert!((factors.scale - 0.5).abs() < EPS);
    }

    #[test]
    fn test_scale_factors_swap_for_quarter_turns() {
        let factors = compute_scale_factors(
            Size::new(1080, 1920),
            Size::new(1920, 1080),
            Rotation::Deg90,
            PreviewScale::AutoFill,
        );
        assert!((factors.scale_x - 1.0).abs() < EPS);
        assert!((factors.scale_y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_manual_policy_keeps_unit_scale() {
        let factors = compute_scale_factors(
            Size::new(500, 300),
            Size::new(1920, 1080),
            Rotation::Deg0,
            PreviewScale::Manual,
        );
        assert_eq!(factors.scale, 1.0);
    }

    #[test]
    fn test_fit_never_exceeds_fill() {
        let views = [Size::new(1080, 1920), Size::new(1920, 1080), Size::new(640, 640)];
        let previews = [Size::new(1920, 1080), Size::new(640, 480), Size::new(1080, 1080)];
        for view in views {
            for preview in previews {
                for delta in Rotation::ALL {
                    let fit = compute_scale_factors(view, preview, delta, PreviewScale::AutoFit);
                    let fill =
                        compute_scale_factors(view, preview, delta, PreviewScale::ManualFill);
                    assert!(fit.scale <= fill.scale);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_render_nothing() {
        let factors = ScaleFactors {
            scale_x: 1.0,
            scale_y: 1.0,
            scale: 1.0,
        };
        let m = compute_preview_transform(
            Size::UNKNOWN,
            Size::new(1920, 1080),
            Rotation::Deg0,
            Facing::Back,
            factors,
        );
        assert!(m.is_degenerate());

        let m = compute_preview_transform(
            Size::new(100, 100),
            Size::UNKNOWN,
            Rotation::Deg0,
            Facing::Back,
            factors,
        );
        assert!(m.is_degenerate());
    }

    #[test]
    fn test_fit_transform_letterboxes_landscape_preview() {
        // 1000x1000 view, 2000x1000 preview: fit shows 1000x500 centered
        let view = Size::new(1000, 1000);
        let preview = Size::new(2000, 1000);
        let factors = compute_scale_factors(view, preview, Rotation::Deg0, PreviewScale::AutoFit);
        let m = compute_preview_transform(view, preview, Rotation::Deg0, Facing::Back, factors);

        // Surface stretches the buffer over the full view; corners map to the letterbox
        let (x0, y0) = m.map_point(0.0, 0.0);
        let (x1, y1) = m.map_point(1000.0, 1000.0);
        assert!((x0 - 0.0).abs() < EPS && (y0 - 250.0).abs() < EPS);
        assert!((x1 - 1000.0).abs() < EPS && (y1 - 750.0).abs() < EPS);
    }

    #[test]
    fn test_rotated_transform_keeps_center() {
        let view = Size::new(1920, 1080);
        let preview = Size::new(1920, 1080);
        let factors = compute_scale_factors(view, preview, Rotation::Deg90, PreviewScale::AutoFit);
        let m = compute_preview_transform(view, preview, Rotation::Deg90, Facing::Back, factors);
        let (cx, cy) = m.map_point(960.0, 540.0);
        assert!((cx - 960.0).abs() < EPS && (cy - 540.0).abs() < EPS);
    }

    #[test]
    fn test_rotated_fit_transform_extent() {
        // Preview rotated by 90 in a landscape view: 1080 wide, 1920 tall before fitting,
        // fit scale = min(1920/1080, 1080/1920) = 0.5625 -> on screen 607.5 x 1080
        let view = Size::new(1920, 1080);
        let preview = Size::new(1920, 1080);
        let factors = compute_scale_factors(view, preview, Rotation::Deg90, PreviewScale::AutoFit);
        let m = compute_preview_transform(view, preview, Rotation::Deg90, Facing::Back, factors);

        let (ax, ay) = m.map_point(0.0, 0.0);
        let (bx, by) = m.map_point(1920.0, 1080.0);
        let width = (ax - bx).abs();
        let height = (ay - by).abs();
        assert!((width - 607.5).abs() < 0.01, "width {width}");
        assert!((height - 1080.0).abs() < 0.01, "height {height}");
    }

    #[test]
    fn test_front_camera_rotates_the_other_way() {
        let view = Size::new(1920, 1080);
        let preview = Size::new(1920, 1080);
        let factors = compute_scale_factors(view, preview, Rotation::Deg90, PreviewScale::AutoFit);
        let back = compute_preview_transform(view, preview, Rotation::Deg90, Facing::Back, factors);
        let front =
            compute_preview_transform(view, preview, Rotation::Deg90, Facing::Front, factors);
        assert!((back.kx + front.kx).abs() < EPS);
        assert!((back.ky + front.ky).abs() < EPS);
    }

    #[test]
    fn test_mirror_flips_horizontally() {
        let geometry = PreviewGeometry {
            view: Size::new(1000, 1000),
            preview: Size::new(1000, 1000),
            device_rotation: Rotation::Deg0,
            sensor_orientation: Rotation::Deg90,
            facing: Facing::Back,
            policy: PreviewScale::AutoFit,
            mirror: true,
        };
        let m = geometry.transform();
        let (x, _) = m.map_point(0.0, 500.0);
        assert!((x - 1000.0).abs() < EPS);
    }

    #[test]
    fn test_mirrored_touch_focuses_unmirrored_point() {
        let geometry = PreviewGeometry {
            view: Size::new(1000, 1000),
            preview: Size::new(1000, 1000),
            device_rotation: Rotation::Deg0,
            sensor_orientation: Rotation::Deg90,
            facing: Facing::Back,
            policy: PreviewScale::AutoFit,
            mirror: true,
        };
        // Buffer point (100, 500) is drawn at (900, 500) in the mirrored view
        let (x, y) = geometry.transform().map_point(100.0, 500.0);
        assert!((x - 900.0).abs() < EPS && (y - 500.0).abs() < EPS);

        let region = geometry.focus_region(x, y).unwrap();
        assert_eq!(region, Rect::new(50, 450, 150, 550));
    }
}
