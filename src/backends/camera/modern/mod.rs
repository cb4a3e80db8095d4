// SPDX-License-Identifier: GPL-3.0-only

//! Modern camera backend
//!
//! Drives the asynchronous device API. The open handshake completes through
//! a state callback and is bounded by a timeout. Zoom is a crop of the active
//! sensor array and focus regions are given in active-array pixels.

mod api;

pub use api::{
    CaptureRequest, DeviceStateCallback, DeviceStateEvent, ModernCamera, ModernCameraApi,
    ModernCharacteristics, RequestTemplate,
};

use super::CameraBackend;
use super::types::*;
use crate::config::{Capabilities, ConfigSnapshot, ZoomTarget};
use crate::constants::timing::OPEN_HANDSHAKE_TIMEOUT;
use crate::errors::DeviceFault;
use crate::geometry::{DriverCoordinateSpace, FocusArea, Size};
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Modern backend implementation
pub struct ModernBackend {
    api: Arc<dyn ModernCameraApi>,
    /// Open device handle (if any)
    camera: Option<Box<dyn ModernCamera>>,
    open_timeout: Duration,
    /// Settings of the repeating preview request
    request: CaptureRequest,
    /// (preview, picture) sizes of the current capture session
    session_sizes: Option<(Size, Size)>,
    previewing: bool,
    recording: bool,
}

impl ModernBackend {
    pub fn new(api: Arc<dyn ModernCameraApi>) -> Self {
        Self {
            api,
            camera: None,
            open_timeout: OPEN_HANDSHAKE_TIMEOUT,
            request: CaptureRequest::default(),
            session_sizes: None,
            previewing: false,
            recording: false,
        }
    }

    /// Override how long the open handshake may take
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    fn camera_mut(&mut self) -> BackendResult<&mut Box<dyn ModernCamera>> {
        self.camera
            .as_mut()
            .ok_or_else(|| DeviceFault::Hardware("camera not open".to_string()))
    }

    /// Wait for the state callback of an open request
    fn handshake(&self, id: &str) -> BackendResult<Box<dyn ModernCamera>> {
        let (tx, rx) = mpsc::channel();
        self.api.open(
            id,
            Box::new(move |event| {
                // A late answer after a timeout is dropped, which closes the device
                let _ = tx.send(event);
            }),
        );

        match rx.recv_timeout(self.open_timeout) {
            Ok(DeviceStateEvent::Opened(camera)) => Ok(camera),
            Ok(DeviceStateEvent::Disconnected) => Err(DeviceFault::Disconnected),
            Ok(DeviceStateEvent::Error(fault)) => Err(fault),
            Err(RecvTimeoutError::Timeout) => {
                warn!(camera = %id, timeout = ?self.open_timeout, "Open handshake timed out");
                Err(DeviceFault::Timeout)
            }
            Err(RecvTimeoutError::Disconnected) => Err(DeviceFault::Hardware(
                "open request dropped without an answer".to_string(),
            )),
        }
    }

    fn repeat_preview(&mut self) -> BackendResult<()> {
        let request = self.request.clone();
        self.camera_mut()?.set_repeating_request(&request)
    }
}

/// Translate a configuration into the repeating preview request
fn request_from(config: &ConfigSnapshot, previous: &CaptureRequest) -> CaptureRequest {
    let advanced = config.advanced.enabled;
    CaptureRequest {
        template: RequestTemplate::Preview,
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
        crop_region: match config.zoom.target {
            ZoomTarget::Crop(rect) => Some(rect),
            _ => None,
        },
        metering_regions: previous.metering_regions.clone(),
        trigger_autofocus: false,
        stabilization: config.video.stabilization,
        frame_rate: config.video.frame_rate,
    }
}

impl CameraBackend for ModernBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::Modern
    }

    fn enumerate_cameras(&self) -> Vec<CameraDescriptor> {
        let cameras: Vec<CameraDescriptor> = self
            .api
            .camera_ids()
            .into_iter()
            .enumerate()
            .filter_map(|(index, id)| match self.api.characteristics(&id) {
                Ok(characteristics) => Some(CameraDescriptor {
                    id,
                    sensor_orientation: characteristics.sensor_orientation,
                    facing: characteristics.facing,
                    backend: BackendType::Modern,
                    index,
                }),
                Err(fault) => {
                    warn!(camera = %id, %fault, "Skipping camera without characteristics");
                    None
                }
            })
            .collect();
        info!(count = cameras.len(), "Modern cameras enumerated");
        cameras
    }

    fn open(&mut self, camera: &CameraDescriptor) -> BackendResult<Capabilities> {
        info!(camera = %camera.id, "Opening modern camera");

        if self.camera.is_some() {
            warn!("Modern camera still open, closing before reopening");
            if let Err(fault) = self.close() {
                warn!(%fault, "Closing the previous modern camera reported an error");
            }
        }

        let characteristics = self.api.characteristics(&camera.id)?;
        let device = self.handshake(&camera.id)?;

        let mut capabilities = characteristics.capabilities;
        capabilities.focus_space = capabilities
            .active_array
            .map(DriverCoordinateSpace::ActiveArray)
            .unwrap_or(DriverCoordinateSpace::Normalized);

        self.camera = Some(device);
        self.request = CaptureRequest::default();
        self.session_sizes = None;
        self.previewing = false;
        self.recording = false;

        debug!(
            level = ?characteristics.hardware_level,
            active_array = ?capabilities.active_array,
            "Modern camera opened"
        );
        Ok(capabilities)
    }

    fn apply_config(&mut self, config: &ConfigSnapshot) -> BackendResult<()> {
        let sizes = (config.sizes.preview, config.sizes.picture);
        if self.session_sizes != Some(sizes) {
            debug!(preview = %sizes.0, picture = %sizes.1, "Creating capture session");
            self.camera_mut()?.create_session(sizes.0, sizes.1)?;
            self.session_sizes = Some(sizes);
        }

        self.request = request_from(config, &self.request);
        if self.previewing {
            self.repeat_preview()?;
        }
        Ok(())
    }

    fn start_preview(&mut self) -> BackendResult<()> {
        if self.session_sizes.is_none() {
            return Err(DeviceFault::Hardware(
                "no capture session configured".to_string(),
            ));
        }
        self.repeat_preview()?;
        self.previewing = true;
        info!("Modern preview started");
        Ok(())
    }

    fn close(&mut self) -> BackendResult<()> {
        let Some(mut camera) = self.camera.take() else {
            return Ok(());
        };
        info!("Closing modern camera");

        let mut first_fault = None;
        if self.recording {
            if let Err(fault) = camera.stop_recording() {
                warn!(%fault, "Failed to stop recording during close");
                first_fault.get_or_insert(fault);
            }
        }
        if self.previewing {
            camera.stop_repeating();
        }
        camera.close();

        self.session_sizes = None;
        self.previewing = false;
        self.recording = false;
        first_fault.map_or(Ok(()), Err)
    }

    fn is_open(&self) -> bool {
        self.camera.is_some()
    }

    fn focus(&mut self, area: FocusArea) -> BackendResult<()> {
        self.request.metering_regions = vec![area];
        let mut trigger = self.request.clone();
        trigger.trigger_autofocus = true;
        self.camera_mut()?.set_repeating_request(&trigger)?;
        debug!(rect = %area.rect, "Modern autofocus triggered");
        Ok(())
    }

    fn reset_focus(&mut self) -> BackendResult<()> {
        self.request.metering_regions.clear();
        self.repeat_preview()
    }

    fn capture(&mut self, on_shutter: &mut dyn FnMut()) -> BackendResult<Vec<u8>> {
        let still = CaptureRequest {
            template: RequestTemplate::StillCapture,
            trigger_autofocus: false,
            ..self.request.clone()
        };
        self.camera_mut()?.capture(&still, on_shutter)
    }

    fn start_recording(
        &mut self,
        destination: &Path,
        profile: &RecordingProfile,
    ) -> BackendResult<()> {
        info!(destination = %destination.display(), size = %profile.size, "Starting modern recording");
        let record = CaptureRequest {
            template: RequestTemplate::Record,
            trigger_autofocus: false,
            ..self.request.clone()
        };
        self.camera_mut()?
            .start_recording(destination, profile, &record)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::DevicePlatform;
    use crate::backends::camera::simulated::SimulatedPlatform;

    #[test]
    fn test_reopen_closes_previous_camera() {
        let platform = SimulatedPlatform::phone();
        let hardware = platform.hardware();
        let mut backend = ModernBackend::new(platform.modern_api().unwrap())
            .with_open_timeout(Duration::from_secs(2));
        let cameras = backend.enumerate_cameras();

        let capabilities = backend.open(&cameras[0]).unwrap();
        assert!(matches!(
            capabilities.focus_space,
            DriverCoordinateSpace::ActiveArray(_)
        ));

        backend.open(&cameras[1]).unwrap();
        assert!(backend.is_open());
        assert_eq!(hardware.open_handles(), 1);
        assert_eq!(hardware.max_open_handles(), 1);

        backend.close().unwrap();
        assert_eq!(hardware.open_handles(), 0);
    }

    #[test]
    fn test_unanswered_open_times_out() {
        let platform = SimulatedPlatform::phone();
        platform.hardware().set_hang_open(true);
        let mut backend = ModernBackend::new(platform.modern_api().unwrap())
            .with_open_timeout(Duration::from_millis(30));
        let camera = backend.enumerate_cameras().remove(0);
        assert_eq!(backend.open(&camera).err(), Some(DeviceFault::Timeout));
        assert!(!backend.is_open());
    }
}
