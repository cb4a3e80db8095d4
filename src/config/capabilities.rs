// SPDX-License-Identifier: GPL-3.0-only

//! Device-advertised capability set
//!
//! Captured once when a session opens and immutable for the rest of it.
//! Every validated setter on [`CameraConfig`](super::CameraConfig) checks
//! against this snapshot.

use super::features::{AntibandingMode, ColorEffectMode, FlashMode, FocusMode, WhiteBalanceMode};
use crate::geometry::{DriverCoordinateSpace, Rect, Size};
use serde::{Deserialize, Serialize};

/// How a device expresses zoom
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoomCapability {
    /// No zoom support
    #[default]
    None,
    /// Enumerated ratios in percent, ascending, first entry is 100
    Discrete { ratios_percent: Vec<u32> },
    /// Any crop of the active array up to the given ratio in percent
    Continuous { max_ratio_percent: u32 },
}

impl ZoomCapability {
    pub fn is_supported(&self) -> bool {
        match self {
            ZoomCapability::None => false,
            ZoomCapability::Discrete { ratios_percent } => ratios_percent.len() > 1,
            ZoomCapability::Continuous { max_ratio_percent } => *max_ratio_percent > 100,
        }
    }

    /// Largest zoom ratio in percent (100 when zoom is unsupported)
    pub fn max_ratio_percent(&self) -> u32 {
        match self {
            ZoomCapability::None => 100,
            ZoomCapability::Discrete { ratios_percent } => {
                ratios_percent.iter().copied().max().unwrap_or(100)
            }
            ZoomCapability::Continuous { max_ratio_percent } => *max_ratio_percent,
        }
    }
}

/// Inclusive exposure compensation range in device steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExposureRange {
    pub min: i32,
    pub max: i32,
}

impl ExposureRange {
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn is_supported(&self) -> bool {
        self.min < self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub flash_modes: Vec<FlashMode>,
    pub focus_modes: Vec<FocusMode>,
    pub white_balance_modes: Vec<WhiteBalanceMode>,
    pub antibanding_modes: Vec<AntibandingMode>,
    pub color_effects: Vec<ColorEffectMode>,
    /// Preview stream sizes in device order
    pub preview_sizes: Vec<Size>,
    /// Still capture sizes in device order
    pub picture_sizes: Vec<Size>,
    pub video_sizes: Vec<Size>,
    pub video_frame_rates: Vec<u32>,
    pub video_stabilization: bool,
    pub zoom: ZoomCapability,
    /// Active sensor array; only reported by the modern API
    pub active_array: Option<Rect>,
    /// Space the driver expects focus regions in
    pub focus_space: DriverCoordinateSpace,
    /// Maximum number of simultaneous focus regions (0 = unsupported)
    pub max_focus_areas: u32,
    pub exposure_compensation: ExposureRange,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            flash_modes: Vec::new(),
            focus_modes: Vec::new(),
            white_balance_modes: Vec::new(),
            antibanding_modes: Vec::new(),
            color_effects: Vec::new(),
            preview_sizes: Vec::new(),
            picture_sizes: Vec::new(),
            video_sizes: Vec::new(),
            video_frame_rates: Vec::new(),
            video_stabilization: false,
            zoom: ZoomCapability::None,
            active_array: None,
            focus_space: DriverCoordinateSpace::Normalized,
            max_focus_areas: 0,
            exposure_compensation: ExposureRange::default(),
        }
    }
}

impl Capabilities {
    pub fn supports_focus_regions(&self) -> bool {
        self.max_focus_areas > 0
    }

    /// Region zoom crops are computed in: the active array, or the largest
    /// picture size when the device does not report one.
    pub fn zoom_reference_rect(&self) -> Rect {
        self.active_array.unwrap_or_else(|| {
            self.picture_sizes
                .iter()
                .max_by_key(|size| size.area())
                .map(|size| Rect::from_size(*size))
                .unwrap_or_default()
        })
    }
}

/// Pick `preferred` when advertised, else the first advertised value, else the default.
pub(crate) fn preferred_or_first<T: Copy + PartialEq + Default>(supported: &[T], preferred: T) -> T {
    if supported.contains(&preferred) {
        preferred
    } else {
        supported.first().copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_capability() {
        assert!(!ZoomCapability::None.is_supported());
        assert!(!ZoomCapability::Discrete { ratios_percent: vec![100] }.is_supported());
        let discrete = ZoomCapability::Discrete {
            ratios_percent: vec![100, 150, 200, 400],
        };
        assert!(discrete.is_supported());
        assert_eq!(discrete.max_ratio_percent(), 400);
        let continuous = ZoomCapability::Continuous {
            max_ratio_percent: 800,
        };
        assert_eq!(continuous.max_ratio_percent(), 800);
    }

    #[test]
    fn test_zoom_reference_falls_back_to_largest_picture() {
        let caps = Capabilities {
            picture_sizes: vec![Size::new(640, 480), Size::new(4000, 3000)],
            ..Default::default()
        };
        assert_eq!(caps.zoom_reference_rect(), Rect::new(0, 0, 4000, 3000));
    }

    #[test]
    fn test_preferred_or_first() {
        let modes = [FocusMode::Auto, FocusMode::Macro];
        assert_eq!(
            preferred_or_first(&modes, FocusMode::ContinuousPicture),
            FocusMode::Auto
        );
        assert_eq!(preferred_or_first(&modes, FocusMode::Macro), FocusMode::Macro);
        assert_eq!(
            preferred_or_first::<FlashMode>(&[], FlashMode::Auto),
            FlashMode::Off
        );
    }
}
