// SPDX-License-Identifier: GPL-3.0-only

//! Device feature modes
//!
//! Each enum lists every value either device API can express. Which values a
//! particular camera accepts is decided by its [`Capabilities`](super::Capabilities).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
    /// Continuous light, also used while recording
    Torch,
    RedEye,
}

impl FlashMode {
    pub const ALL: [FlashMode; 5] = [
        FlashMode::Off,
        FlashMode::On,
        FlashMode::Auto,
        FlashMode::Torch,
        FlashMode::RedEye,
    ];
}

impl fmt::Display for FlashMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlashMode::Off => "off",
            FlashMode::On => "on",
            FlashMode::Auto => "auto",
            FlashMode::Torch => "torch",
            FlashMode::RedEye => "red-eye",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FocusMode {
    /// Single-shot autofocus, triggered by tap or capture
    Auto,
    #[default]
    ContinuousPicture,
    ContinuousVideo,
    Macro,
    Infinity,
    /// Fixed-focus lens, no driver control
    Fixed,
    /// Extended depth of field
    Edof,
}

impl FocusMode {
    pub const ALL: [FocusMode; 7] = [
        FocusMode::Auto,
        FocusMode::ContinuousPicture,
        FocusMode::ContinuousVideo,
        FocusMode::Macro,
        FocusMode::Infinity,
        FocusMode::Fixed,
        FocusMode::Edof,
    ];

    /// Whether the driver accepts metering regions in this mode
    pub fn accepts_focus_regions(&self) -> bool {
        matches!(
            self,
            FocusMode::Auto
                | FocusMode::ContinuousPicture
                | FocusMode::ContinuousVideo
                | FocusMode::Macro
        )
    }
}

impl fmt::Display for FocusMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FocusMode::Auto => "auto",
            FocusMode::ContinuousPicture => "continuous-picture",
            FocusMode::ContinuousVideo => "continuous-video",
            FocusMode::Macro => "macro",
            FocusMode::Infinity => "infinity",
            FocusMode::Fixed => "fixed",
            FocusMode::Edof => "edof",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WhiteBalanceMode {
    #[default]
    Auto,
    Incandescent,
    Fluorescent,
    WarmFluorescent,
    Daylight,
    CloudyDaylight,
    Twilight,
    Shade,
}

impl WhiteBalanceMode {
    pub const ALL: [WhiteBalanceMode; 8] = [
        WhiteBalanceMode::Auto,
        WhiteBalanceMode::Incandescent,
        WhiteBalanceMode::Fluorescent,
        WhiteBalanceMode::WarmFluorescent,
        WhiteBalanceMode::Daylight,
        WhiteBalanceMode::CloudyDaylight,
        WhiteBalanceMode::Twilight,
        WhiteBalanceMode::Shade,
    ];
}

impl fmt::Display for WhiteBalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Flicker compensation for artificial light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AntibandingMode {
    Off,
    #[default]
    Auto,
    Hz50,
    Hz60,
}

impl fmt::Display for AntibandingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AntibandingMode::Off => f.write_str("off"),
            AntibandingMode::Auto => f.write_str("auto"),
            AntibandingMode::Hz50 => f.write_str("50Hz"),
            AntibandingMode::Hz60 => f.write_str("60Hz"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorEffectMode {
    #[default]
    None,
    Mono,
    Negative,
    Solarize,
    Sepia,
    Posterize,
    Aqua,
}

impl fmt::Display for ColorEffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_regions_only_for_adjustable_lenses() {
        assert!(FocusMode::Auto.accepts_focus_regions());
        assert!(!FocusMode::Fixed.accepts_focus_regions());
        assert!(!FocusMode::Infinity.accepts_focus_regions());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(FlashMode::RedEye.to_string(), "red-eye");
        assert_eq!(AntibandingMode::Hz50.to_string(), "50Hz");
        assert_eq!(WhiteBalanceMode::CloudyDaylight.to_string(), "CloudyDaylight");
    }
}
