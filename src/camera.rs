// SPDX-License-Identifier: GPL-3.0-only

//! Camera facade
//!
//! [`CameraBuilder`] picks the device API, starts the session driver and the
//! callback delivery; [`Camera`] is the single surface applications talk to.

use crate::backends::camera::{
    BackendPreference, BackendState, BackendType, CameraDescriptor, DevicePlatform, OpenCallbacks,
    PictureCallbacks, PreviewSurface, RecordingCallbacks, Session, SessionOptions, backend_for_type,
    select_backend,
};
use crate::config::CameraConfig;
use crate::constants::BitratePreset;
use crate::constants::timing::OPEN_HANDSHAKE_TIMEOUT;
use crate::dispatch::{CallbackQueue, DeliveryMode, callback_channel, spawn_delivery_thread};
use crate::errors::{CameraError, HalResult};
use crate::geometry::{Facing, Matrix, PreviewScale, Rotation};
use crate::picture::PictureContext;
use crate::settings::Settings;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// Builder for [`Camera`]
pub struct CameraBuilder {
    platform: Arc<dyn DevicePlatform>,
    backend: BackendPreference,
    options: SessionOptions,
    delivery_mode: DeliveryMode,
    incompatible_models: Vec<String>,
    open_timeout: Duration,
}

impl CameraBuilder {
    pub fn new(platform: Arc<dyn DevicePlatform>) -> Self {
        Self {
            platform,
            backend: BackendPreference::Auto,
            options: SessionOptions::default(),
            delivery_mode: DeliveryMode::default(),
            incompatible_models: Vec::new(),
            open_timeout: OPEN_HANDSHAKE_TIMEOUT,
        }
    }

    /// Start from persisted integration defaults
    pub fn from_settings(platform: Arc<dyn DevicePlatform>, settings: &Settings) -> Self {
        let mut builder = Self::new(platform)
            .backend(settings.backend)
            .delivery_mode(settings.delivery_mode)
            .incompatible_models(settings.incompatible_models.clone())
            .open_timeout(settings.open_timeout());
        builder.options.defaults = settings.config_defaults();
        builder
    }

    pub fn backend(mut self, preference: BackendPreference) -> Self {
        self.backend = preference;
        self
    }

    /// Opt in to antibanding, color effects and exposure compensation
    pub fn advanced_features(mut self, enabled: bool) -> Self {
        self.options.defaults.advanced_enabled = enabled;
        self
    }

    /// Replace the default rotate/mirror post-processing of stills
    pub fn picture_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(DynamicImage, &PictureContext) -> DynamicImage + Send + Sync + 'static,
    {
        self.options.picture_hook = Arc::new(hook);
        self
    }

    pub fn on_zoom_changed(mut self, observer: impl Fn(u32) + Send + Sync + 'static) -> Self {
        self.options.on_zoom_changed = Some(Arc::new(observer));
        self
    }

    pub fn on_focus_changed(mut self, observer: impl Fn(f32, f32) + Send + Sync + 'static) -> Self {
        self.options.on_focus_changed = Some(Arc::new(observer));
        self
    }

    /// Receives teardown and reconfiguration failures
    pub fn on_diagnostic(mut self, observer: impl Fn(CameraError) + Send + Sync + 'static) -> Self {
        self.options.on_diagnostic = Some(Arc::new(observer));
        self
    }

    pub fn delivery_mode(mut self, mode: DeliveryMode) -> Self {
        self.delivery_mode = mode;
        self
    }

    pub fn preview_scale(mut self, policy: PreviewScale) -> Self {
        self.options.defaults.preview_scale = policy;
        self
    }

    pub fn mirror(mut self, mirror: bool) -> Self {
        self.options.defaults.mirror = mirror;
        self
    }

    pub fn bitrate_preset(mut self, preset: BitratePreset) -> Self {
        self.options.defaults.bitrate_preset = preset;
        self
    }

    pub fn reset_focus_delay(mut self, delay: Duration) -> Self {
        self.options.defaults.reset_focus_delay = delay;
        self
    }

    /// Device models forced onto the legacy API in auto mode
    pub fn incompatible_models(mut self, models: Vec<String>) -> Self {
        self.incompatible_models = models;
        self
    }

    /// Upper bound for the modern open handshake
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn build(self) -> HalResult<Camera> {
        let backend_type = select_backend(
            self.backend,
            self.platform.as_ref(),
            &self.incompatible_models,
        )?;
        let backend =
            backend_for_type(backend_type, self.platform.as_ref(), self.open_timeout)
                .ok_or_else(|| {
                    CameraError::DeviceUnavailable(format!("{} API vanished", backend_type))
                })?;

        let (sender, queue) = callback_channel();
        let session = Session::new(backend, Arc::clone(&self.platform), sender, self.options)?;
        let cameras = session.enumerate_cameras();
        if cameras.is_empty() {
            warn!(backend = %backend_type, "No cameras found");
        }

        let (delivery, queue) = match self.delivery_mode {
            DeliveryMode::DedicatedThread => {
                let handle = spawn_delivery_thread(queue).map_err(|e| {
                    CameraError::DeviceUnavailable(format!("failed to start delivery thread: {}", e))
                })?;
                (Some(handle), None)
            }
            DeliveryMode::CallerThread => (None, Some(queue)),
        };

        info!(
            backend = %backend_type,
            cameras = cameras.len(),
            delivery = ?self.delivery_mode,
            "Camera built"
        );
        Ok(Camera {
            session,
            cameras,
            queue,
            _delivery: delivery,
        })
    }
}

/// Camera facade over one device API
pub struct Camera {
    session: Session,
    /// Enumerated once at build time
    cameras: Vec<CameraDescriptor>,
    /// Present in caller-thread delivery mode until taken
    queue: Option<CallbackQueue>,
    /// Exits on its own once the session driver is gone
    _delivery: Option<JoinHandle<()>>,
}

impl Camera {
    pub fn builder(platform: Arc<dyn DevicePlatform>) -> CameraBuilder {
        CameraBuilder::new(platform)
    }

    pub fn backend_type(&self) -> BackendType {
        self.session.backend_type()
    }

    pub fn available_cameras(&self) -> Vec<CameraDescriptor> {
        self.cameras.clone()
    }

    /// First camera facing `facing`, if any
    pub fn find_camera(&self, facing: Facing) -> Option<CameraDescriptor> {
        self.cameras.iter().find(|c| c.facing == facing).cloned()
    }

    /// Callback queue to drain in [`DeliveryMode::CallerThread`]; `None` after
    /// the first call or in dedicated-thread mode
    pub fn take_callback_queue(&mut self) -> Option<CallbackQueue> {
        self.queue.take()
    }

    pub fn state(&self) -> BackendState {
        self.session.state()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.session_id()
    }

    /// Open `camera` and stream its preview into `surface`.
    ///
    /// Any open session is released first, so switching cameras is just
    /// another `open`.
    pub fn open(
        &self,
        surface: Arc<dyn PreviewSurface>,
        camera: &CameraDescriptor,
        callbacks: OpenCallbacks,
    ) -> HalResult<()> {
        if camera.backend != self.backend_type() {
            return Err(CameraError::DeviceUnavailable(format!(
                "camera {} belongs to the {} API",
                camera.id, camera.backend
            )));
        }
        self.session.open(surface, camera.clone(), callbacks)
    }

    /// Configuration of the open session; `None` while Closed or Initializing
    pub fn current_config(&self) -> Option<CameraConfig> {
        self.session.current_config()
    }

    fn config(&self) -> HalResult<CameraConfig> {
        self.current_config()
            .ok_or_else(|| CameraError::DeviceUnavailable("camera is not open".to_string()))
    }

    /// Pinch zoom step in percentage points; returns the clamped level
    pub fn set_zoom_delta(&self, delta: i32) -> HalResult<u32> {
        self.config()?.set_zoom_delta(delta)
    }

    /// Pretend the display is rotated by `degrees` (0, 90, 180 or 270)
    pub fn set_rotation_override(&self, degrees: i32) -> HalResult<()> {
        let rotation = Rotation::try_from_degrees(degrees)
            .ok_or_else(|| CameraError::unsupported("rotation override", degrees))?;
        self.config()?.set_rotation_override(Some(rotation))
    }

    /// Follow the display rotation again
    pub fn clear_rotation_override(&self) -> HalResult<()> {
        self.config()?.set_rotation_override(None)
    }

    pub fn set_mirror(&self, mirror: bool) -> HalResult<()> {
        self.config()?.set_mirror(mirror)
    }

    pub fn take_picture(&self, callbacks: PictureCallbacks) -> HalResult<()> {
        self.session.take_picture(callbacks)
    }

    pub fn start_recording(
        &self,
        destination: impl Into<PathBuf>,
        callbacks: RecordingCallbacks,
    ) -> HalResult<()> {
        self.session.start_recording(destination.into(), callbacks)
    }

    pub fn stop_recording(&self) {
        self.session.stop_recording();
    }

    pub fn release(&self) {
        self.session.release();
    }

    /// Release and wait for the device to be closed
    pub fn release_and_wait(&self) -> bool {
        self.session.release_and_wait()
    }

    pub fn focus_at(&self, x: f32, y: f32) -> bool {
        self.session.focus_at(x, y)
    }

    pub fn refresh_preview_transform(&self) -> Option<Matrix> {
        self.session.refresh_preview_transform()
    }

    /// Block until all queued device work has run
    pub fn wait_idle(&self) -> bool {
        self.session.wait_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::simulated::SimulatedPlatform;

    #[test]
    fn test_builder_enumerates_cameras() {
        let camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
            .delivery_mode(DeliveryMode::CallerThread)
            .build()
            .unwrap();
        assert_eq!(camera.backend_type(), BackendType::Modern);
        assert_eq!(camera.available_cameras().len(), 2);
        assert_eq!(camera.find_camera(Facing::Front).unwrap().id, "1");
    }

    #[test]
    fn test_caller_queue_taken_once() {
        let mut camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
            .delivery_mode(DeliveryMode::CallerThread)
            .build()
            .unwrap();
        assert!(camera.take_callback_queue().is_some());
        assert!(camera.take_callback_queue().is_none());

        let mut camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
            .build()
            .unwrap();
        assert!(camera.take_callback_queue().is_none());
    }

    #[test]
    fn test_operations_require_open_camera() {
        let camera = Camera::builder(Arc::new(SimulatedPlatform::legacy_only()))
            .build()
            .unwrap();
        assert!(matches!(
            camera.set_zoom_delta(10),
            Err(CameraError::DeviceUnavailable(_))
        ));
        assert!(matches!(
            camera.take_picture(PictureCallbacks::default()),
            Err(CameraError::DeviceUnavailable(_))
        ));
        camera.stop_recording();
        camera.release();
        assert_eq!(camera.state(), BackendState::Closed);
    }

    #[test]
    fn test_rotation_override_rejects_odd_angles() {
        let camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
            .build()
            .unwrap();
        assert!(matches!(
            camera.set_rotation_override(45),
            Err(CameraError::UnsupportedFeature(_))
        ));
    }
}
