// SPDX-License-Identifier: GPL-3.0-only

//! Per-session camera configuration
//!
//! One [`CameraConfig`] exists per open session. It is built from the
//! capability set the device reports at open time and validates every
//! setter against it: a value the device does not advertise is rejected with
//! [`CameraError::UnsupportedFeature`] and the configuration stays untouched.
//! Zoom is the only field that clamps instead of failing.
//!
//! Advanced features (antibanding, color effects, exposure compensation) are
//! only applied when the facade was built with the opt-in flag. Without it
//! their setters return `Ok(())` and do nothing.
//!
//! The handle is cheap to clone. Once the owning session closes, every
//! operation fails with [`CameraError::DeviceUnavailable`].

mod capabilities;
mod features;

pub use capabilities::{Capabilities, ExposureRange, ZoomCapability};
pub use features::{AntibandingMode, ColorEffectMode, FlashMode, FocusMode, WhiteBalanceMode};

pub(crate) use capabilities::preferred_or_first;

use crate::constants::timing::RESET_FOCUS_DELAY;
use crate::constants::zoom::{MAX_LEVEL, MIN_LEVEL};
use crate::constants::BitratePreset;
use crate::errors::{CameraError, HalResult};
use crate::geometry::{
    PreviewScale, Rect, Rotation, Size, best_matching_size, compute_zoom_crop_region,
    nearest_zoom_index, zoom_level_to_ratio_percent,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Receives every accepted configuration change
pub type ConfigListener = Arc<dyn Fn(ConfigChange) + Send + Sync>;

/// Device-specific form of the current zoom level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoomTarget {
    /// Device cannot zoom
    #[default]
    None,
    /// Crop of the active array (modern API)
    Crop(Rect),
    /// Index into the discrete zoom ratio list (legacy API)
    Index(usize),
}

/// What an accepted setter changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigChange {
    /// Device parameters must be re-applied
    Parameters,
    /// Preview size, scale policy, mirror or rotation override changed;
    /// parameters and the preview transform must both be refreshed
    Geometry,
    /// Zoom level changed (or was requested and clamped to the same value)
    Zoom { level: u32, target: ZoomTarget },
}

impl ConfigChange {
    pub fn affects_geometry(&self) -> bool {
        matches!(self, ConfigChange::Geometry)
    }
}

/// Integration defaults applied when a configuration is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub preview_scale: PreviewScale,
    pub mirror: bool,
    pub bitrate_preset: BitratePreset,
    pub advanced_enabled: bool,
    pub reset_focus_delay: Duration,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            preview_scale: PreviewScale::default(),
            mirror: false,
            bitrate_preset: BitratePreset::default(),
            advanced_enabled: false,
            reset_focus_delay: RESET_FOCUS_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSettings {
    pub size: Size,
    pub frame_rate: u32,
    pub stabilization: bool,
    pub bitrate_preset: BitratePreset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicFeatures {
    pub flash: FlashMode,
    pub focus: FocusMode,
    pub white_balance: WhiteBalanceMode,
    pub preview_scale: PreviewScale,
    pub mirror: bool,
    /// Replaces the display rotation reported by the preview surface
    pub rotation_override: Option<Rotation>,
    pub tap_to_focus: bool,
    pub pinch_to_zoom: bool,
    /// How long a tapped focus region is held before continuous focus resumes
    pub reset_focus_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedFeatures {
    /// Opt-in flag captured from the facade builder
    pub enabled: bool,
    pub antibanding: AntibandingMode,
    pub color_effect: ColorEffectMode,
    pub exposure_compensation: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSelection {
    pub preview: Size,
    pub picture: Size,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomState {
    /// Normalized level, 0 to 100
    pub level: u32,
    pub target: ZoomTarget,
}

/// Full configuration state, also used as the serializable snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub capabilities: Capabilities,
    pub video: VideoSettings,
    pub basic: BasicFeatures,
    pub advanced: AdvancedFeatures,
    pub sizes: SizeSelection,
    pub zoom: ZoomState,
}

impl ConfigSnapshot {
    fn from_capabilities(capabilities: Capabilities, defaults: ConfigDefaults) -> Self {
        let picture = capabilities
            .picture_sizes
            .first()
            .copied()
            .unwrap_or(Size::UNKNOWN);
        let preview = if defaults.preview_scale.is_auto() {
            best_matching_size(picture, &capabilities.preview_sizes)
        } else {
            capabilities
                .preview_sizes
                .first()
                .copied()
                .unwrap_or(Size::UNKNOWN)
        };
        let exposure = &capabilities.exposure_compensation;
        let exposure_compensation = if exposure.contains(0) { 0 } else { exposure.min };

        Self {
            video: VideoSettings {
                size: capabilities
                    .video_sizes
                    .first()
                    .copied()
                    .unwrap_or(Size::UNKNOWN),
                frame_rate: preferred_or_first(&capabilities.video_frame_rates, 30),
                stabilization: false,
                bitrate_preset: defaults.bitrate_preset,
            },
            basic: BasicFeatures {
                flash: preferred_or_first(&capabilities.flash_modes, FlashMode::Off),
                focus: preferred_or_first(&capabilities.focus_modes, FocusMode::ContinuousPicture),
                white_balance: preferred_or_first(
                    &capabilities.white_balance_modes,
                    WhiteBalanceMode::Auto,
                ),
                preview_scale: defaults.preview_scale,
                mirror: defaults.mirror,
                rotation_override: None,
                tap_to_focus: capabilities.supports_focus_regions(),
                pinch_to_zoom: capabilities.zoom.is_supported(),
                reset_focus_delay: defaults.reset_focus_delay,
            },
            advanced: AdvancedFeatures {
                enabled: defaults.advanced_enabled,
                antibanding: preferred_or_first(
                    &capabilities.antibanding_modes,
                    AntibandingMode::Auto,
                ),
                color_effect: preferred_or_first(
                    &capabilities.color_effects,
                    ColorEffectMode::None,
                ),
                exposure_compensation,
            },
            sizes: SizeSelection { preview, picture },
            zoom: ZoomState {
                level: MIN_LEVEL,
                target: zoom_target(&capabilities, MIN_LEVEL),
            },
            capabilities,
        }
    }

    /// Video bitrate for the selected size and preset
    pub fn video_bitrate_kbps(&self) -> u32 {
        self.video.bitrate_preset.bitrate_kbps(self.video.size.width)
    }

    fn rederive_preview_size(&mut self) -> bool {
        if !self.basic.preview_scale.is_auto() {
            return false;
        }
        let preview = best_matching_size(self.sizes.picture, &self.capabilities.preview_sizes);
        let changed = preview != self.sizes.preview;
        self.sizes.preview = preview;
        changed
    }
}

/// Map a normalized zoom level onto the device's zoom representation
pub fn zoom_target(capabilities: &Capabilities, level: u32) -> ZoomTarget {
    let max = capabilities.zoom.max_ratio_percent();
    match &capabilities.zoom {
        ZoomCapability::None => ZoomTarget::None,
        ZoomCapability::Discrete { ratios_percent } => {
            let ratio = zoom_level_to_ratio_percent(level, max);
            ZoomTarget::Index(nearest_zoom_index(ratios_percent, ratio))
        }
        ZoomCapability::Continuous { .. } => {
            let ratio = zoom_level_to_ratio_percent(level, max);
            ZoomTarget::Crop(compute_zoom_crop_region(
                capabilities.zoom_reference_rect(),
                ratio as f32,
            ))
        }
    }
}

struct Shared {
    state: Option<ConfigSnapshot>,
    listener: Option<ConfigListener>,
}

type Update<T> = HalResult<(T, Option<ConfigChange>)>;

/// Handle to the live configuration of one session
#[derive(Clone)]
pub struct CameraConfig {
    shared: Arc<Mutex<Shared>>,
}

impl fmt::Debug for CameraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.lock();
        f.debug_struct("CameraConfig")
            .field("state", &shared.state)
            .field("has_listener", &shared.listener.is_some())
            .finish()
    }
}

impl CameraConfig {
    pub fn new(capabilities: Capabilities, defaults: ConfigDefaults) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                state: Some(ConfigSnapshot::from_capabilities(capabilities, defaults)),
                listener: None,
            })),
        }
    }

    pub(crate) fn set_listener(&self, listener: ConfigListener) {
        self.lock().listener = Some(listener);
    }

    /// Detach from the session; all later calls fail
    pub(crate) fn close(&self) {
        let mut shared = self.lock();
        shared.state = None;
        shared.listener = None;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().state.is_none()
    }

    /// Serializable copy of the full state
    pub fn snapshot(&self) -> HalResult<ConfigSnapshot> {
        self.read(|s| s.clone())
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read<T>(&self, f: impl FnOnce(&ConfigSnapshot) -> T) -> HalResult<T> {
        let shared = self.lock();
        shared
            .state
            .as_ref()
            .map(f)
            .ok_or_else(CameraError::config_closed)
    }

    /// Run a validated mutation and notify the listener outside the lock
    fn update<T>(&self, f: impl FnOnce(&mut ConfigSnapshot) -> Update<T>) -> HalResult<T> {
        let (value, change, listener) = {
            let mut shared = self.lock();
            let state = shared.state.as_mut().ok_or_else(CameraError::config_closed)?;
            let (value, change) = f(state)?;
            (value, change, shared.listener.clone())
        };
        if let Some(change) = change {
            debug!(?change, "Configuration changed");
            if let Some(listener) = listener {
                listener(change);
            }
        }
        Ok(value)
    }

    pub fn capabilities(&self) -> HalResult<Capabilities> {
        self.read(|s| s.capabilities.clone())
    }

    // ===== Video =====

    pub fn video_size(&self) -> HalResult<Size> {
        self.read(|s| s.video.size)
    }

    pub fn set_video_size(&self, size: Size) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.video_sizes.contains(&size) {
                return Err(CameraError::unsupported("video size", size));
            }
            s.video.size = size;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn video_frame_rate(&self) -> HalResult<u32> {
        self.read(|s| s.video.frame_rate)
    }

    pub fn set_video_frame_rate(&self, fps: u32) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.video_frame_rates.contains(&fps) {
                return Err(CameraError::unsupported("frame rate", fps));
            }
            s.video.frame_rate = fps;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn video_stabilization(&self) -> HalResult<bool> {
        self.read(|s| s.video.stabilization)
    }

    pub fn set_video_stabilization(&self, enabled: bool) -> HalResult<()> {
        self.update(|s| {
            if enabled && !s.capabilities.video_stabilization {
                return Err(CameraError::unsupported("video stabilization", enabled));
            }
            s.video.stabilization = enabled;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn bitrate_preset(&self) -> HalResult<BitratePreset> {
        self.read(|s| s.video.bitrate_preset)
    }

    /// Only read when a recording starts, so nothing is re-applied
    pub fn set_bitrate_preset(&self, preset: BitratePreset) -> HalResult<()> {
        self.update(|s| {
            s.video.bitrate_preset = preset;
            Ok(((), None))
        })
    }

    pub fn video_bitrate_kbps(&self) -> HalResult<u32> {
        self.read(ConfigSnapshot::video_bitrate_kbps)
    }

    // ===== Basic features =====

    pub fn flash_mode(&self) -> HalResult<FlashMode> {
        self.read(|s| s.basic.flash)
    }

    pub fn set_flash_mode(&self, mode: FlashMode) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.flash_modes.contains(&mode) {
                return Err(CameraError::unsupported("flash mode", mode));
            }
            s.basic.flash = mode;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn focus_mode(&self) -> HalResult<FocusMode> {
        self.read(|s| s.basic.focus)
    }

    pub fn set_focus_mode(&self, mode: FocusMode) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.focus_modes.contains(&mode) {
                return Err(CameraError::unsupported("focus mode", mode));
            }
            s.basic.focus = mode;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn white_balance(&self) -> HalResult<WhiteBalanceMode> {
        self.read(|s| s.basic.white_balance)
    }

    pub fn set_white_balance(&self, mode: WhiteBalanceMode) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.white_balance_modes.contains(&mode) {
                return Err(CameraError::unsupported("white balance", mode));
            }
            s.basic.white_balance = mode;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn preview_scale(&self) -> HalResult<PreviewScale> {
        self.read(|s| s.basic.preview_scale)
    }

    /// Switching to an `Auto*` policy re-derives the preview size from the picture size
    pub fn set_preview_scale(&self, policy: PreviewScale) -> HalResult<()> {
        self.update(|s| {
            s.basic.preview_scale = policy;
            s.rederive_preview_size();
            Ok(((), Some(ConfigChange::Geometry)))
        })
    }

    pub fn mirror(&self) -> HalResult<bool> {
        self.read(|s| s.basic.mirror)
    }

    pub fn set_mirror(&self, mirror: bool) -> HalResult<()> {
        self.update(|s| {
            s.basic.mirror = mirror;
            Ok(((), Some(ConfigChange::Geometry)))
        })
    }

    pub fn rotation_override(&self) -> HalResult<Option<Rotation>> {
        self.read(|s| s.basic.rotation_override)
    }

    pub fn set_rotation_override(&self, rotation: Option<Rotation>) -> HalResult<()> {
        self.update(|s| {
            s.basic.rotation_override = rotation;
            Ok(((), Some(ConfigChange::Geometry)))
        })
    }

    pub fn tap_to_focus(&self) -> HalResult<bool> {
        self.read(|s| s.basic.tap_to_focus)
    }

    pub fn set_tap_to_focus(&self, enabled: bool) -> HalResult<()> {
        self.update(|s| {
            if enabled && !s.capabilities.supports_focus_regions() {
                return Err(CameraError::unsupported("tap to focus", enabled));
            }
            s.basic.tap_to_focus = enabled;
            Ok(((), None))
        })
    }

    pub fn pinch_to_zoom(&self) -> HalResult<bool> {
        self.read(|s| s.basic.pinch_to_zoom)
    }

    pub fn set_pinch_to_zoom(&self, enabled: bool) -> HalResult<()> {
        self.update(|s| {
            if enabled && !s.capabilities.zoom.is_supported() {
                return Err(CameraError::unsupported("pinch to zoom", enabled));
            }
            s.basic.pinch_to_zoom = enabled;
            Ok(((), None))
        })
    }

    pub fn reset_focus_delay(&self) -> HalResult<Duration> {
        self.read(|s| s.basic.reset_focus_delay)
    }

    pub fn set_reset_focus_delay(&self, delay: Duration) -> HalResult<()> {
        self.update(|s| {
            s.basic.reset_focus_delay = delay;
            Ok(((), None))
        })
    }

    // ===== Advanced features =====

    pub fn advanced_enabled(&self) -> HalResult<bool> {
        self.read(|s| s.advanced.enabled)
    }

    pub fn antibanding(&self) -> HalResult<AntibandingMode> {
        self.read(|s| s.advanced.antibanding)
    }

    pub fn set_antibanding(&self, mode: AntibandingMode) -> HalResult<()> {
        self.update(|s| {
            if !s.advanced.enabled {
                debug!(%mode, "Advanced features disabled, ignoring antibanding");
                return Ok(((), None));
            }
            if !s.capabilities.antibanding_modes.contains(&mode) {
                return Err(CameraError::unsupported("antibanding", mode));
            }
            s.advanced.antibanding = mode;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn color_effect(&self) -> HalResult<ColorEffectMode> {
        self.read(|s| s.advanced.color_effect)
    }

    pub fn set_color_effect(&self, effect: ColorEffectMode) -> HalResult<()> {
        self.update(|s| {
            if !s.advanced.enabled {
                debug!(%effect, "Advanced features disabled, ignoring color effect");
                return Ok(((), None));
            }
            if !s.capabilities.color_effects.contains(&effect) {
                return Err(CameraError::unsupported("color effect", effect));
            }
            s.advanced.color_effect = effect;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    pub fn exposure_compensation(&self) -> HalResult<i32> {
        self.read(|s| s.advanced.exposure_compensation)
    }

    pub fn set_exposure_compensation(&self, steps: i32) -> HalResult<()> {
        self.update(|s| {
            if !s.advanced.enabled {
                debug!(steps, "Advanced features disabled, ignoring exposure compensation");
                return Ok(((), None));
            }
            let range = s.capabilities.exposure_compensation;
            if !range.is_supported() || !range.contains(steps) {
                return Err(CameraError::unsupported("exposure compensation", steps));
            }
            s.advanced.exposure_compensation = steps;
            Ok(((), Some(ConfigChange::Parameters)))
        })
    }

    // ===== Sizes =====

    pub fn preview_size(&self) -> HalResult<Size> {
        self.read(|s| s.sizes.preview)
    }

    pub fn set_preview_size(&self, size: Size) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.preview_sizes.contains(&size) {
                return Err(CameraError::unsupported("preview size", size));
            }
            s.sizes.preview = size;
            Ok(((), Some(ConfigChange::Geometry)))
        })
    }

    pub fn picture_size(&self) -> HalResult<Size> {
        self.read(|s| s.sizes.picture)
    }

    pub fn set_picture_size(&self, size: Size) -> HalResult<()> {
        self.update(|s| {
            if !s.capabilities.picture_sizes.contains(&size) {
                return Err(CameraError::unsupported("picture size", size));
            }
            s.sizes.picture = size;
            let change = if s.rederive_preview_size() {
                ConfigChange::Geometry
            } else {
                ConfigChange::Parameters
            };
            Ok(((), Some(change)))
        })
    }

    // ===== Zoom =====

    pub fn zoom_level(&self) -> HalResult<u32> {
        self.read(|s| s.zoom.level)
    }

    pub fn zoom_target(&self) -> HalResult<ZoomTarget> {
        self.read(|s| s.zoom.target)
    }

    /// Change the zoom level by `delta` percentage points.
    ///
    /// The result is clamped to 0..=100. A change notification is sent even
    /// when clamping leaves the level where it was.
    pub fn set_zoom_delta(&self, delta: i32) -> HalResult<u32> {
        self.update(|s| {
            let level = (s.zoom.level as i64 + delta as i64)
                .clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u32;
            apply_zoom(s, level)
        })
    }

    /// Set an absolute zoom level, clamped to 0..=100
    pub fn set_zoom_level(&self, level: u32) -> HalResult<u32> {
        self.update(|s| apply_zoom(s, level.clamp(MIN_LEVEL, MAX_LEVEL)))
    }
}

fn apply_zoom(state: &mut ConfigSnapshot, level: u32) -> Update<u32> {
    if !state.capabilities.zoom.is_supported() {
        return Err(CameraError::unsupported("zoom level", level));
    }
    let target = zoom_target(&state.capabilities, level);
    state.zoom = ZoomState { level, target };
    Ok((level, Some(ConfigChange::Zoom { level, target })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DriverCoordinateSpace;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn capabilities() -> Capabilities {
        Capabilities {
            flash_modes: vec![FlashMode::Off, FlashMode::Auto, FlashMode::Torch],
            focus_modes: vec![FocusMode::Auto, FocusMode::ContinuousPicture],
            white_balance_modes: vec![WhiteBalanceMode::Auto, WhiteBalanceMode::Daylight],
            antibanding_modes: vec![AntibandingMode::Auto, AntibandingMode::Hz50],
            color_effects: vec![ColorEffectMode::None, ColorEffectMode::Mono],
            preview_sizes: vec![Size::new(1920, 1080), Size::new(1440, 1080)],
            picture_sizes: vec![Size::new(4000, 3000), Size::new(3840, 2160)],
            video_sizes: vec![Size::new(1920, 1080)],
            video_frame_rates: vec![30, 60],
            video_stabilization: false,
            zoom: ZoomCapability::Continuous {
                max_ratio_percent: 400,
            },
            active_array: Some(Rect::new(0, 0, 4000, 3000)),
            focus_space: DriverCoordinateSpace::ActiveArray(Rect::new(0, 0, 4000, 3000)),
            max_focus_areas: 1,
            exposure_compensation: ExposureRange { min: -6, max: 6 },
        }
    }

    #[test]
    fn test_defaults_follow_capabilities() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        assert_eq!(config.picture_size().unwrap(), Size::new(4000, 3000));
        // 4:3 picture under AutoFill picks the 4:3 preview
        assert_eq!(config.preview_size().unwrap(), Size::new(1440, 1080));
        assert_eq!(config.focus_mode().unwrap(), FocusMode::ContinuousPicture);
        assert_eq!(config.video_frame_rate().unwrap(), 30);
        assert_eq!(config.zoom_target().unwrap(), ZoomTarget::Crop(Rect::new(0, 0, 4000, 3000)));
    }

    #[test]
    fn test_unsupported_value_leaves_state() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        let err = config.set_flash_mode(FlashMode::RedEye).unwrap_err();
        assert!(matches!(err, CameraError::UnsupportedFeature(_)));
        assert_eq!(config.flash_mode().unwrap(), FlashMode::Off);

        assert!(config.set_video_stabilization(true).is_err());
        assert!(!config.video_stabilization().unwrap());
    }

    #[test]
    fn test_picture_size_rederives_preview() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        config.set_picture_size(Size::new(3840, 2160)).unwrap();
        assert_eq!(config.preview_size().unwrap(), Size::new(1920, 1080));

        config.set_preview_scale(PreviewScale::ManualFit).unwrap();
        config.set_picture_size(Size::new(4000, 3000)).unwrap();
        assert_eq!(config.preview_size().unwrap(), Size::new(1920, 1080));
    }

    #[test]
    fn test_advanced_features_soft_ignored() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        assert!(config.set_color_effect(ColorEffectMode::Mono).is_ok());
        assert_eq!(config.color_effect().unwrap(), ColorEffectMode::None);
        // Not even validated when disabled
        assert!(config.set_exposure_compensation(100).is_ok());

        let defaults = ConfigDefaults {
            advanced_enabled: true,
            ..Default::default()
        };
        let config = CameraConfig::new(capabilities(), defaults);
        config.set_color_effect(ColorEffectMode::Mono).unwrap();
        assert_eq!(config.color_effect().unwrap(), ColorEffectMode::Mono);
        assert!(config.set_exposure_compensation(100).is_err());
        assert!(config.set_color_effect(ColorEffectMode::Sepia).is_err());
    }

    #[test]
    fn test_zoom_clamps_and_always_notifies() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        let notified = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&notified);
        config.set_listener(Arc::new(move |change| {
            if let ConfigChange::Zoom { .. } = change {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        }));

        assert_eq!(config.set_zoom_delta(50).unwrap(), 50);
        assert_eq!(config.set_zoom_delta(-100).unwrap(), 0);
        assert_eq!(config.set_zoom_delta(-10).unwrap(), 0);
        assert_eq!(config.set_zoom_delta(500).unwrap(), 100);
        assert_eq!(notified.load(Ordering::SeqCst), 4);

        // 100 maps to 4x: a quarter of each side
        assert_eq!(
            config.zoom_target().unwrap(),
            ZoomTarget::Crop(Rect::new(1500, 1125, 2500, 1875))
        );
    }

    #[test]
    fn test_discrete_zoom_picks_index() {
        let caps = Capabilities {
            zoom: ZoomCapability::Discrete {
                ratios_percent: vec![100, 200, 300, 400],
            },
            active_array: None,
            ..capabilities()
        };
        let config = CameraConfig::new(caps, ConfigDefaults::default());
        config.set_zoom_level(50).unwrap();
        // 50 -> 250% -> nearest of [100, 200, 300, 400] is 200 (first on tie)
        assert_eq!(config.zoom_target().unwrap(), ZoomTarget::Index(1));
    }

    #[test]
    fn test_closed_config_fails() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        let handle = config.clone();
        config.close();
        assert!(handle.is_closed());
        assert!(matches!(
            handle.set_mirror(true),
            Err(CameraError::DeviceUnavailable(_))
        ));
        assert!(matches!(
            handle.zoom_level(),
            Err(CameraError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn test_snapshot_serializes() {
        let config = CameraConfig::new(capabilities(), ConfigDefaults::default());
        let snapshot = config.snapshot().unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: ConfigSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
