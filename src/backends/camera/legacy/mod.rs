// SPDX-License-Identifier: GPL-3.0-only

//! Legacy camera backend
//!
//! Drives the synchronous device API. Characteristics are available as soon
//! as the camera is open, zoom is an index into a fixed ratio list, and focus
//! areas live in the fixed `[-1000, 1000]` space.

mod api;

pub use api::{LegacyCamera, LegacyCameraApi, LegacyCameraInfo, LegacyParameters};

use super::CameraBackend;
use super::types::*;
use crate::config::{Capabilities, ConfigSnapshot, ZoomTarget};
use crate::errors::DeviceFault;
use crate::geometry::{DriverCoordinateSpace, FocusArea};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Legacy backend implementation
pub struct LegacyBackend {
    api: Arc<dyn LegacyCameraApi>,
    /// Open device handle (if any)
    camera: Option<Box<dyn LegacyCamera>>,
    /// Last parameter block pushed to the device
    parameters: LegacyParameters,
    previewing: bool,
    recording: bool,
}

impl LegacyBackend {
    pub fn new(api: Arc<dyn LegacyCameraApi>) -> Self {
        Self {
            api,
            camera: None,
            parameters: LegacyParameters::default(),
            previewing: false,
            recording: false,
        }
    }

    fn camera_mut(&mut self) -> BackendResult<&mut Box<dyn LegacyCamera>> {
        self.camera
            .as_mut()
            .ok_or_else(|| DeviceFault::Hardware("camera not open".to_string()))
    }

    fn push_parameters(&mut self) -> BackendResult<()> {
        let parameters = self.parameters.clone();
        self.camera_mut()?.set_parameters(&parameters)
    }
}

/// Translate a configuration into the legacy parameter block
fn parameters_from(config: &ConfigSnapshot, focus_areas: Vec<FocusArea>) -> LegacyParameters {
    let advanced = config.advanced.enabled;
    LegacyParameters {
        preview_size: config.sizes.preview,
        picture_size: config.sizes.picture,
        preview_frame_rate: config.video.frame_rate,
        flash: config.basic.flash,
        focus: config.basic.focus,
        white_balance: config.basic.white_balance,
        antibanding: advanced.then_some(config.advanced.antibanding),
        color_effect: advanced.then_some(config.advanced.color_effect),
        exposure_compensation: if advanced {
            config.advanced.exposure_compensation
        } else {
            0
        },
        zoom_index: match config.zoom.target {
            ZoomTarget::Index(index) => index,
            _ => 0,
        },
        focus_areas,
        video_stabilization: config.video.stabilization,
    }
}

impl CameraBackend for LegacyBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Legacy
    }

    fn enumerate_cameras(&self) -> Vec<CameraDescriptor> {
        let cameras: Vec<CameraDescriptor> = (0..self.api.number_of_cameras())
            .filter_map(|index| {
                self.api.camera_info(index).map(|info| CameraDescriptor {
                    id: index.to_string(),
                    sensor_orientation: info.orientation,
                    facing: info.facing,
                    backend: BackendType::Legacy,
                    index,
                })
            })
            .collect();
        info!(count = cameras.len(), "Legacy cameras enumerated");
        cameras
    }

    fn open(&mut self, camera: &CameraDescriptor) -> BackendResult<Capabilities> {
        info!(camera = %camera.id, "Opening legacy camera");

        if self.camera.is_some() {
            warn!("Legacy camera still open, closing before reopening");
            if let Err(fault) = self.close() {
                warn!(%fault, "Closing the previous legacy camera reported an error");
            }
        }

        let device = self.api.open(camera.index)?;
        let mut capabilities = device.capabilities();
        // The legacy API has no notion of the active array
        capabilities.active_array = None;
        capabilities.focus_space = DriverCoordinateSpace::Normalized;

        self.camera = Some(device);
        self.parameters = LegacyParameters::default();
        self.previewing = false;
        self.recording = false;

        debug!(zoom = ?capabilities.zoom, "Legacy camera opened");
        Ok(capabilities)
    }

    fn apply_config(&mut self, config: &ConfigSnapshot) -> BackendResult<()> {
        let parameters = parameters_from(config, self.parameters.focus_areas.clone());
        let restart_preview =
            self.previewing && parameters.preview_size != self.parameters.preview_size;

        let camera = self.camera_mut()?;
        if restart_preview {
            // Preview size cannot change while streaming
            debug!(size = %parameters.preview_size, "Restarting legacy preview for new size");
            camera.stop_preview();
        }
        camera.set_parameters(&parameters)?;
        if restart_preview {
            camera.start_preview()?;
        }
        self.parameters = parameters;
        Ok(())
    }

    fn start_preview(&mut self) -> BackendResult<()> {
        self.camera_mut()?.start_preview()?;
        self.previewing = true;
        info!("Legacy preview started");
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        let Some(mut camera) = self.camera.take() else {
            return Ok(());
        };
        info!("Closing legacy camera");

        let mut first_fault = None;
        if self.recording {
            if let Err(fault) = camera.stop_recording() {
                warn!(%fault, "Failed to stop recording during close");
                first_fault.get_or_insert(fault);
            }
        }
        if self.previewing {
            camera.stop_preview();
        }
        camera.release();

        self.previewing = false;
        self.recording = false;
        first_fault.map_or(Ok(()), Err)
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn focus(&mut self, area: FocusArea) -> BackendResult<()> {
        self.parameters.focus_areas = vec![area];
        self.push_parameters()?;
        let focused = self.camera_mut()?.auto_focus()?;
        debug!(rect = %area.rect, focused, "Legacy autofocus finished");
        Ok(())
    }

    fn reset_focus(&mut self) -> BackendResult<()> {
        self.camera_mut()?.cancel_auto_focus();
        self.parameters.focus_areas.clear();
        self.push_parameters()
    }

    fn capture(&mut self, on_shutter: &mut dyn FnMut()) -> BackendResult<Vec<u8>> {
        let camera = self.camera_mut()?;
        let jpeg = camera.take_picture(on_shutter)?;

        // The legacy API stops the preview after every still
        if let Err(fault) = camera.start_preview() {
            warn!(%fault, "Failed to restart preview after capture");
            self.previewing = false;
        }
        Ok(jpeg)
    }

    fn start_recording(
        &mut self,
        destination: &Path,
        profile: &RecordingProfile,
    ) -> BackendResult<()> {
        info!(destination = %destination.display(), size = %profile.size, "Starting legacy recording");
        self.camera_mut()?.start_recording(destination, profile)?;
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> BackendResult<()> {
        if !self.recording {
            return Err(DeviceFault::Hardware("not recording".to_string()));
        }
        self.recording = false;
        self.camera_mut()?.stop_recording()
    }
}
