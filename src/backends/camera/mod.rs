// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! Two device APIs with different lifecycles sit behind one trait:
//!
//! ```text
//! ┌─────────────────────┐
//! │   Camera (facade)   │  ← Builder, backend selection, callback delivery
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │       Session       │  ← State machine, generations, preview transform
//! └──────────┬──────────┘
//!            │  device worker thread
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐   ┌──────┐
//!   │Legacy│   │Modern│
//!   └──────┘   └──────┘
//! ```

pub mod compat;
pub mod focus_timer;
pub mod legacy;
pub mod modern;
pub mod session;
pub mod simulated;
pub mod types;
pub mod worker;

pub use compat::{BackendPreference, select_backend};
pub use legacy::{LegacyBackend, LegacyCamera, LegacyCameraApi, LegacyCameraInfo, LegacyParameters};
pub use modern::{
    CaptureRequest, DeviceStateCallback, DeviceStateEvent, ModernBackend, ModernCamera,
    ModernCameraApi, ModernCharacteristics, RequestTemplate,
};
pub use session::{
    DiagnosticObserver, FocusObserver, OpenCallbacks, PictureCallbacks, RecordingCallbacks, Session,
    SessionOptions, ZoomObserver,
};
pub use types::*;

use crate::config::{Capabilities, ConfigSnapshot};
use crate::geometry::FocusArea;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Device API access offered by the host platform
pub trait DevicePlatform: Send + Sync {
    /// Whether the process may use the camera at all
    fn has_camera_permission(&self) -> bool;

    /// Device model string, matched against the incompatible-device list
    fn device_model(&self) -> String;

    fn legacy_api(&self) -> Option<Arc<dyn LegacyCameraApi>>;

    fn modern_api(&self) -> Option<Arc<dyn ModernCameraApi>>;
}

/// Complete camera backend trait
///
/// A backend is owned by the device worker; every method runs on that one
/// thread, so implementations never see concurrent calls.
pub trait CameraBackend: Send {
    fn backend_type(&self) -> BackendType;

    // ===== Enumeration =====

    /// Enumerate the cameras of the underlying device API
    fn enumerate_cameras(&self) -> Vec<CameraDescriptor>;

    // ===== Lifecycle =====

    /// Perform the open handshake and report the capability set
    ///
    /// On error nothing stays open.
    fn open(&mut self, camera: &CameraDescriptor) -> BackendResult<Capabilities>;

    /// Push the full configuration to the device
    ///
    /// Called once before the preview starts and again after every accepted
    /// configuration change.
    fn apply_config(&mut self, config: &ConfigSnapshot) -> BackendResult<()>;

    /// Start streaming preview frames to the surface
    fn start_preview(&mut self) -> BackendResult<()>;

    /// Release the device
    ///
    /// Best effort: every step runs even if an earlier one fails, and the
    /// first fault is reported. Stops a running recording and the preview.
    fn close(&mut self) -> BackendResult<()>;

    fn is_open(&self) -> bool;

    // ===== Focus =====

    /// Focus on a region given in the driver's coordinate space
    fn focus(&mut self, area: FocusArea) -> BackendResult<()>;

    /// Drop the tapped region and resume the configured focus mode
    fn reset_focus(&mut self) -> BackendResult<()>;

    // ===== Capture =====

    /// Capture one still as JPEG bytes, calling `on_shutter` once exposure locks
    fn capture(&mut self, on_shutter: &mut dyn FnMut()) -> BackendResult<Vec<u8>>;

    /// Start recording into `destination`
    fn start_recording(&mut self, destination: &Path, profile: &RecordingProfile)
    -> BackendResult<()>;

    /// Finalize the running recording
    fn stop_recording(&mut self) -> BackendResult<()>;
}

/// Create the backend for a device API offered by `platform`
///
/// `open_timeout` bounds the modern open handshake; the legacy open is
/// synchronous and ignores it.
pub fn backend_for_type(
    backend_type: BackendType,
    platform: &dyn DevicePlatform,
    open_timeout: Duration,
) -> Option<Box<dyn CameraBackend>> {
    match backend_type {
        BackendType::Legacy => platform
            .legacy_api()
            .map(|api| Box::new(LegacyBackend::new(api)) as Box<dyn CameraBackend>),
        BackendType::Modern => platform.modern_api().map(|api| {
            Box::new(ModernBackend::new(api).with_open_timeout(open_timeout))
                as Box<dyn CameraBackend>
        }),
    }
}
