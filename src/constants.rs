// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Focus rectangle side as a fraction of the preview side
pub const FOCUS_RECT_FRACTION: f32 = 0.1;

/// Lower bound of the legacy driver focus coordinate space
pub const LEGACY_FOCUS_SPACE_MIN: i32 = -1000;

/// Upper bound of the legacy driver focus coordinate space
pub const LEGACY_FOCUS_SPACE_MAX: i32 = 1000;

/// Side of the fixed focus window in the legacy coordinate space
pub const LEGACY_FOCUS_AREA_SIZE: i32 = 200;

/// Weight given to a single metering region
pub const METERING_WEIGHT_MAX: i32 = 1000;

/// Zoom level bounds (normalized percentage of the device zoom range)
pub mod zoom {
    pub const MIN_LEVEL: u32 = 0;
    pub const MAX_LEVEL: u32 = 100;

    /// Device zoom ratio of an unzoomed image, in percent
    pub const UNZOOMED_RATIO_PERCENT: u32 = 100;
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Upper bound for the asynchronous open handshake of the modern API
    pub const OPEN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

    /// Default delay before a tap-to-focus region falls back to continuous focus
    pub const RESET_FOCUS_DELAY: Duration = Duration::from_secs(7);

    /// How long `release_and_wait` waits for the device worker
    pub const RELEASE_WAIT_TIMEOUT: Duration = Duration::from_secs(5);
}

/// Video encoder bitrate presets
///
/// These presets define the target bitrate for video encoding based on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BitratePreset {
    /// Low bitrate - smaller files, reduced quality
    Low,
    /// Medium bitrate - balanced quality and file size (default)
    #[default]
    Medium,
    /// High bitrate - larger files, better quality
    High,
}

impl BitratePreset {
    /// All preset variants
    pub const ALL: [BitratePreset; 3] = [
        BitratePreset::Low,
        BitratePreset::Medium,
        BitratePreset::High,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            BitratePreset::Low => "Low",
            BitratePreset::Medium => "Medium",
            BitratePreset::High => "High",
        }
    }

    /// Get bitrate in kbps for a given resolution width
    ///
    /// - SD (640x480): Low=1, Medium=2, High=4 Mbps
    /// - HD (1280x720): Low=2.5, Medium=5, High=10 Mbps
    /// - Full HD (1920x1080): Low=4, Medium=8, High=16 Mbps
    /// - 2K (2560x1440): Low=8, Medium=16, High=32 Mbps
    /// - 4K (3840x2160): Low=15, Medium=30, High=50 Mbps
    pub fn bitrate_kbps(&self, width: u32) -> u32 {
        let tier_kbps = match get_resolution_tier(width) {
            ResolutionTier::SD => [1_000, 2_000, 4_000],
            ResolutionTier::HD => [2_500, 5_000, 10_000],
            ResolutionTier::FullHD => [4_000, 8_000, 16_000],
            ResolutionTier::TwoK => [8_000, 16_000, 32_000],
            ResolutionTier::FourK => [15_000, 30_000, 50_000],
        };
        match self {
            BitratePreset::Low => tier_kbps[0],
            BitratePreset::Medium => tier_kbps[1],
            BitratePreset::High => tier_kbps[2],
        }
    }
}

/// Resolution tiers for bitrate calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTier {
    /// 640x480 and below
    SD,
    /// 1280x720
    HD,
    /// 1920x1080
    FullHD,
    /// 2560x1440
    TwoK,
    /// 3840x2160 and above
    FourK,
}

/// Get the resolution tier for a given width
pub fn get_resolution_tier(width: u32) -> ResolutionTier {
    match width {
        w if w >= 3840 => ResolutionTier::FourK,
        w if w >= 2560 => ResolutionTier::TwoK,
        w if w >= 1920 => ResolutionTier::FullHD,
        w if w >= 1280 => ResolutionTier::HD,
        _ => ResolutionTier::SD,
    }
}

/// Format bitrate for display (e.g., "8 Mbps" or "2.5 Mbps")
pub fn format_bitrate(kbps: u32) -> String {
    let mbps = kbps as f64 / 1000.0;
    if mbps == mbps.floor() {
        format!("{} Mbps", mbps as u32)
    } else {
        format!("{:.1} Mbps", mbps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_tiers() {
        assert_eq!(get_resolution_tier(3840), ResolutionTier::FourK);
        assert_eq!(get_resolution_tier(1920), ResolutionTier::FullHD);
        assert_eq!(get_resolution_tier(640), ResolutionTier::SD);
    }

    #[test]
    fn test_format_bitrate() {
        assert_eq!(format_bitrate(8_000), "8 Mbps");
        assert_eq!(format_bitrate(2_500), "2.5 Mbps");
    }

    #[test]
    fn test_legacy_focus_window_fits_space() {
        assert!(LEGACY_FOCUS_SPACE_MIN + LEGACY_FOCUS_AREA_SIZE <= LEGACY_FOCUS_SPACE_MAX);
    }
}
