// SPDX-License-Identifier: GPL-3.0-only

//! Modern device API
//!
//! Asynchronous: `open` returns immediately and the device reports the
//! outcome through a state callback, possibly from another thread.
//! Characteristics are queried separately from the open handle. Settings
//! travel with each capture request instead of living on the device.

use super::super::types::{BackendResult, HardwareLevel, RecordingProfile};
use crate::config::{
    AntibandingMode, Capabilities, ColorEffectMode, FlashMode, FocusMode, WhiteBalanceMode,
};
use crate::errors::DeviceFault;
use crate::geometry::{Facing, FocusArea, Rect, Rotation, Size};
use std::path::Path;

/// Static description of one camera, queried without opening it
#[derive(Debug, Clone, PartialEq)]
pub struct ModernCharacteristics {
    pub facing: Facing,
    pub sensor_orientation: Rotation,
    pub hardware_level: HardwareLevel,
    /// Includes the active sensor array
    pub capabilities: Capabilities,
}

/// Outcome of an open request
pub enum DeviceStateEvent {
    Opened(Box<dyn ModernCamera>),
    Disconnected,
    Error(DeviceFault),
}

impl std::fmt::Debug for DeviceStateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStateEvent::Opened(_) => write!(f, "Opened"),
            DeviceStateEvent::Disconnected => write!(f, "Disconnected"),
            DeviceStateEvent::Error(fault) => write!(f, "Error({})", fault),
        }
    }
}

pub type DeviceStateCallback = Box<dyn FnOnce(DeviceStateEvent) + Send>;

/// Entry point of the modern API
pub trait ModernCameraApi: Send + Sync {
    fn camera_ids(&self) -> Vec<String>;

    fn characteristics(&self, id: &str) -> BackendResult<ModernCharacteristics>;

    /// Request the device; the outcome arrives through `callback`
    fn open(&self, id: &str, callback: DeviceStateCallback);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestTemplate {
    #[default]
    Preview,
    StillCapture,
    Record,
}

/// Per-frame settings sent with every request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub flash: FlashMode,
    pub focus: FocusMode,
    pub white_balance: WhiteBalanceMode,
    pub antibanding: Option<AntibandingMode>,
    pub color_effect: Option<ColorEffectMode>,
    pub exposure_compensation: i32,
    /// Zoom crop in active-array pixels
    pub crop_region: Option<Rect>,
    /// Focus and metering regions in active-array pixels
    pub metering_regions: Vec<FocusArea>,
    /// Start an autofocus sweep with this request
    pub trigger_autofocus: bool,
    pub stabilization: bool,
    pub frame_rate: u32,
}

/// Open modern camera handle
///
/// Dropping a handle closes the device.
pub trait ModernCamera: Send {
    /// Configure the output streams, replacing any existing capture session
    fn create_session(&mut self, preview: Size, picture: Size) -> BackendResult<()>;

    /// Stream preview frames with the given settings until replaced
    fn set_repeating_request(&mut self, request: &CaptureRequest) -> BackendResult<()>;

    fn stop_repeating(&mut self);

    /// One-shot still capture; `on_shutter` runs when exposure starts
    fn capture(
        &mut self,
        request: &CaptureRequest,
        on_shutter: &mut dyn FnMut(),
    ) -> BackendResult<Vec<u8>>;

    fn start_recording(
        &mut self,
        destination: &Path,
        profile: &RecordingProfile,
        request: &CaptureRequest,
    ) -> BackendResult<()>;

    fn stop_recording(&mut self) -> BackendResult<()>;

    fn close(&mut self);
}
