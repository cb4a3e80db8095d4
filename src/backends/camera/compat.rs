// SPDX-License-Identifier: GPL-3.0-only

//! Backend selection
//!
//! The modern API is preferred. The legacy API is used instead when the
//! modern one is missing, when the primary back camera only reaches the
//! legacy hardware level, or when the device model is known to misbehave
//! with the modern API.

use super::DevicePlatform;
use super::types::{BackendType, HardwareLevel};
use crate::errors::{CameraError, HalResult};
use crate::geometry::Facing;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Requested backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendPreference {
    /// Decide from the device capabilities
    #[default]
    Auto,
    Legacy,
    Modern,
}

impl From<BackendType> for BackendPreference {
    fn from(backend: BackendType) -> Self {
        match backend {
            BackendType::Legacy => BackendPreference::Legacy,
            BackendType::Modern => BackendPreference::Modern,
        }
    }
}

/// Resolve a preference into the backend to build
pub fn select_backend(
    preference: BackendPreference,
    platform: &dyn DevicePlatform,
    incompatible_models: &[String],
) -> HalResult<BackendType> {
    let has_legacy = platform.legacy_api().is_some();
    let has_modern = platform.modern_api().is_some();

    let selected = match preference {
        BackendPreference::Legacy if has_legacy => BackendType::Legacy,
        BackendPreference::Modern if has_modern => BackendType::Modern,
        BackendPreference::Legacy | BackendPreference::Modern => {
            return Err(CameraError::DeviceUnavailable(format!(
                "requested {:?} camera API is not available",
                preference
            )));
        }
        BackendPreference::Auto => auto_select(platform, incompatible_models, has_legacy, has_modern)?,
    };

    info!(backend = %selected, ?preference, "Camera backend selected");
    Ok(selected)
}

fn auto_select(
    platform: &dyn DevicePlatform,
    incompatible_models: &[String],
    has_legacy: bool,
    has_modern: bool,
) -> HalResult<BackendType> {
    if !has_modern {
        return if has_legacy {
            Ok(BackendType::Legacy)
        } else {
            Err(CameraError::DeviceUnavailable(
                "no camera API available".to_string(),
            ))
        };
    }
    if !has_legacy {
        return Ok(BackendType::Modern);
    }

    let model = platform.device_model();
    if is_incompatible_model(&model, incompatible_models) {
        debug!(%model, "Device model is on the incompatible list");
        return Ok(BackendType::Legacy);
    }

    if primary_back_camera_level(platform) == Some(HardwareLevel::Legacy) {
        debug!("Primary back camera reports legacy hardware level");
        return Ok(BackendType::Legacy);
    }

    Ok(BackendType::Modern)
}

/// Case-insensitive match against the incompatible model list
pub fn is_incompatible_model(model: &str, incompatible_models: &[String]) -> bool {
    let model = model.trim();
    incompatible_models
        .iter()
        .any(|entry| entry.trim().eq_ignore_ascii_case(model))
}

/// Hardware level of the first back-facing camera of the modern API
fn primary_back_camera_level(platform: &dyn DevicePlatform) -> Option<HardwareLevel> {
    let api = platform.modern_api()?;
    api.camera_ids()
        .iter()
        .filter_map(|id| api.characteristics(id).ok())
        .find(|characteristics| characteristics.facing == Facing::Back)
        .map(|characteristics| characteristics.hardware_level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::simulated::SimulatedPlatform;

    #[test]
    fn test_prefers_modern() {
        let platform = SimulatedPlatform::phone();
        assert_eq!(
            select_backend(BackendPreference::Auto, &platform, &[]).unwrap(),
            BackendType::Modern
        );
    }

    #[test]
    fn test_legacy_hardware_level_selects_legacy() {
        let platform = SimulatedPlatform::phone();
        platform.set_hardware_level(HardwareLevel::Legacy);
        assert_eq!(
            select_backend(BackendPreference::Auto, &platform, &[]).unwrap(),
            BackendType::Legacy
        );
    }

    #[test]
    fn test_incompatible_model_selects_legacy() {
        let platform = SimulatedPlatform::phone();
        let list = vec![platform.device_model().to_uppercase()];
        assert_eq!(
            select_backend(BackendPreference::Auto, &platform, &list).unwrap(),
            BackendType::Legacy
        );
    }

    #[test]
    fn test_missing_api() {
        let platform = SimulatedPlatform::legacy_only();
        assert_eq!(
            select_backend(BackendPreference::Auto, &platform, &[]).unwrap(),
            BackendType::Legacy
        );
        assert!(matches!(
            select_backend(BackendPreference::Modern, &platform, &[]),
            Err(CameraError::DeviceUnavailable(_))
        ));
    }
}
