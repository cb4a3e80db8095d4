// SPDX-License-Identifier: GPL-3.0-only

//! Legacy device API
//!
//! Synchronous: opening a camera returns the handle directly and every call
//! blocks until the driver is done. Parameters are pushed as one block.

use super::super::types::{BackendResult, RecordingProfile};
use crate::config::{
    AntibandingMode, Capabilities, ColorEffectMode, FlashMode, FocusMode, WhiteBalanceMode,
};
use crate::geometry::{Facing, FocusArea, Rotation, Size};
use std::path::Path;

/// Static information about one legacy camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyCameraInfo {
    pub facing: Facing,
    pub orientation: Rotation,
}

/// Parameter block pushed with [`LegacyCamera::set_parameters`]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LegacyParameters {
    pub preview_size: Size,
    pub picture_size: Size,
    pub preview_frame_rate: u32,
    pub flash: FlashMode,
    pub focus: FocusMode,
    pub white_balance: WhiteBalanceMode,
    pub antibanding: Option<AntibandingMode>,
    pub color_effect: Option<ColorEffectMode>,
    pub exposure_compensation: i32,
    /// Index into the advertised zoom ratio list
    pub zoom_index: usize,
    /// Focus and metering areas in the [-1000, 1000] space
    pub focus_areas: Vec<FocusArea>,
    pub video_stabilization: bool,
}

/// Entry point of the legacy API
pub trait LegacyCameraApi: Send + Sync {
    fn number_of_cameras(&self) -> usize;

    fn camera_info(&self, index: usize) -> Option<LegacyCameraInfo>;

    /// Open a camera; blocks until the driver hands out the device
    fn open(&self, index: usize) -> BackendResult<Box<dyn LegacyCamera>>;
}

/// Open legacy camera handle
pub trait LegacyCamera: Send {
    /// Supported values, available as soon as the camera is open
    fn capabilities(&self) -> Capabilities;

    fn set_parameters(&mut self, parameters: &LegacyParameters) -> BackendResult<()>;

    fn start_preview(&mut self) -> BackendResult<()>;

    fn stop_preview(&mut self);

    /// Run one autofocus sweep; returns whether focus was achieved
    fn auto_focus(&mut self) -> BackendResult<bool>;

    fn cancel_auto_focus(&mut self);

    /// Capture a JPEG. `on_shutter` runs when the exposure is locked.
    ///
    /// The preview stops after a capture and must be restarted.
    fn take_picture(&mut self, on_shutter: &mut dyn FnMut()) -> BackendResult<Vec<u8>>;

    fn start_recording(&mut self, destination: &Path, profile: &RecordingProfile)
    -> BackendResult<()>;

    fn stop_recording(&mut self) -> BackendResult<()>;

    /// Give the device back to the system
    fn release(&mut self);
}
