// SPDX-License-Identifier: GPL-3.0-only

//! Integration defaults, persisted as JSON

use crate::backends::camera::BackendPreference;
use crate::config::ConfigDefaults;
use crate::constants::BitratePreset;
use crate::constants::timing::{OPEN_HANDSHAKE_TIMEOUT, RESET_FOCUS_DELAY};
use crate::dispatch::DeliveryMode;
use crate::geometry::PreviewScale;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Failure to read or write a settings file
#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings I/O error: {}", e),
            SettingsError::Parse(e) => write!(f, "Invalid settings: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(e) => Some(e),
            SettingsError::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Parse(e)
    }
}

/// Defaults a camera integration is built with
///
/// Missing keys fall back to their defaults, so partial files are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Device API to drive (Auto picks per device)
    pub backend: BackendPreference,
    /// Apply antibanding, color effects and exposure compensation
    pub advanced_features: bool,
    /// Mirror the preview horizontally
    pub mirror_preview: bool,
    pub preview_scale: PreviewScale,
    /// Video encoder bitrate preset (Low, Medium, High)
    pub bitrate_preset: BitratePreset,
    pub delivery_mode: DeliveryMode,
    /// Device models that misbehave with the modern API
    pub incompatible_models: Vec<String>,
    /// Delay before a tapped focus region is dropped again
    pub reset_focus_delay_ms: u64,
    /// Upper bound for the modern open handshake
    pub open_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendPreference::default(),
            advanced_features: false,
            mirror_preview: false,
            preview_scale: PreviewScale::default(),
            bitrate_preset: BitratePreset::default(),
            delivery_mode: DeliveryMode::default(),
            incompatible_models: Vec::new(),
            reset_focus_delay_ms: RESET_FOCUS_DELAY.as_millis() as u64,
            open_timeout_ms: OPEN_HANDSHAKE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&text)?;
        info!(path = %path.display(), backend = ?settings.backend, "Settings loaded");
        Ok(settings)
    }

    /// Read settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match Self::load(path) {
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn reset_focus_delay(&self) -> Duration {
        Duration::from_millis(self.reset_focus_delay_ms)
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Defaults for every configuration created under these settings
    pub fn config_defaults(&self) -> ConfigDefaults {
        ConfigDefaults {
            preview_scale: self.preview_scale,
            mirror: self.mirror_preview,
            bitrate_preset: self.bitrate_preset,
            advanced_enabled: self.advanced_features,
            reset_focus_delay: self.reset_focus_delay(),
        }
    }
}
