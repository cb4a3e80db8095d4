// SPDX-License-Identifier: GPL-3.0-only

//! Geometry engine
//!
//! Pure functions that keep the preview, touch-to-focus coordinates and zoom
//! regions consistent across sensor orientation, display rotation and view
//! aspect ratio. Nothing in here fails: degenerate input produces a defined
//! fallback (a scale-to-zero matrix, no focus region, or [`Size::UNKNOWN`]).
//!
//! ```text
//!  touch (view px) ──rotate──▶ sensor axes ──offset/descale──▶ preview px
//!                                                                  │
//!                              driver space ◀──map_focus_region────┘
//! ```

pub mod focus;
pub mod matrix;
pub mod orientation;
pub mod preview;
pub mod types;
pub mod zoom;

pub use focus::{DriverCoordinateSpace, FocusArea, compute_focus_region, map_focus_region_to_driver_space};
pub use matrix::Matrix;
pub use orientation::{device_rotation_for_delta, display_orientation_delta, picture_orientation};
pub use preview::{PreviewGeometry, compute_preview_transform, compute_scale_factors};
pub use types::{Facing, PreviewScale, Rect, Rotation, ScaleFactors, Size};
pub use zoom::{compute_zoom_crop_region, nearest_zoom_index, zoom_level_to_ratio_percent};

/// Pick the candidate size matching the aspect ratio of `reference`.
///
/// Falls back to the first candidate in device order, then to [`Size::UNKNOWN`]
/// when there are no candidates.
pub fn best_matching_size(reference: Size, candidates: &[Size]) -> Size {
    candidates
        .iter()
        .find(|candidate| candidate.same_aspect_ratio(&reference))
        .or_else(|| candidates.first())
        .copied()
        .unwrap_or(Size::UNKNOWN)
}
