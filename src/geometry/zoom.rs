// SPDX-License-Identifier: GPL-3.0-only

//! Zoom arithmetic for both device APIs
//!
//! The legacy API zooms through a list of discrete ratios, the modern API
//! through a crop rectangle inside the active sensor array. Callers only see
//! a normalized level from 0 to 100 that is mapped onto either.

use super::types::Rect;
use crate::constants::zoom::{MAX_LEVEL, UNZOOMED_RATIO_PERCENT};

/// Crop window of the active sensor array for a zoom ratio given in percent.
///
/// 100 returns `active` unchanged; larger values shrink the window around the
/// center. The result never leaves `active`. Non-positive or non-finite
/// ratios fall back to `active`.
pub fn compute_zoom_crop_region(active: Rect, zoom_percentage: f32) -> Rect {
    if active.is_empty() || !zoom_percentage.is_finite() || zoom_percentage <= 0.0 {
        return active;
    }

    let ratio = zoom_percentage / 100.0;
    let width = active.width();
    let height = active.height();

    let zoomed_width = (width as f32 / ratio) as i32;
    let zoomed_height = (height as f32 / ratio) as i32;
    let half_width_diff = (width - zoomed_width) / 2;
    let half_height_diff = (height - zoomed_height) / 2;

    Rect::new(
        active.left + half_width_diff.max(0),
        active.top + half_height_diff.max(0),
        (active.left + half_width_diff + zoomed_width).min(active.right),
        (active.top + half_height_diff + zoomed_height).min(active.bottom),
    )
}

/// Map a normalized zoom level (0-100) onto `[100, max_ratio_percent]`.
pub fn zoom_level_to_ratio_percent(level: u32, max_ratio_percent: u32) -> u32 {
    let level = level.min(MAX_LEVEL);
    let max = max_ratio_percent.max(UNZOOMED_RATIO_PERCENT);
    UNZOOMED_RATIO_PERCENT + (max - UNZOOMED_RATIO_PERCENT) * level / MAX_LEVEL
}

/// Index of the discrete zoom ratio closest to `target_percent`.
///
/// Returns 0 for an empty list so the device stays unzoomed.
pub fn nearest_zoom_index(ratios: &[u32], target_percent: u32) -> usize {
    ratios
        .iter()
        .enumerate()
        .min_by_key(|(_, ratio)| ratio.abs_diff(target_percent))
        .map(|(index, _)| index)
        .unwrap_or(0)
}
