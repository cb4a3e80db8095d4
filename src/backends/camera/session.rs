// SPDX-License-Identifier: GPL-3.0-only

//! Session lifecycle driver
//!
//! A [`Session`] owns the device worker and runs one camera at a time through
//! `Closed → Initializing → Ready → Active → [Capturing | Recording] → Active
//! → Closed`. Public entry points check and update the state synchronously,
//! then queue the device work and return. Every queued task and every posted
//! callback carries the generation it was issued under; `open` and `release`
//! start a new generation, so work and callbacks of an older session are
//! dropped instead of running.

use super::focus_timer::FocusResetTimer;
use super::types::*;
use super::worker::{DeviceWorker, WorkerHandle};
use super::{CameraBackend, DevicePlatform};
use crate::config::{CameraConfig, ConfigChange, ConfigDefaults, ConfigSnapshot};
use crate::constants::timing::RELEASE_WAIT_TIMEOUT;
use crate::dispatch::{CallbackSender, GenerationCounter};
use crate::errors::{CameraError, DeviceFault, HalResult};
use crate::geometry::{
    Matrix, PreviewGeometry, Rotation, map_focus_region_to_driver_space, picture_orientation,
};
use crate::picture::{PictureContext, PictureHook, decode_jpeg, default_picture_hook};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

type Worker = DeviceWorker<Box<dyn CameraBackend>>;
type Backend = Box<dyn CameraBackend>;

/// Observer of zoom level changes (0..=100)
pub type ZoomObserver = Arc<dyn Fn(u32) + Send + Sync>;
/// Observer of accepted focus touches, in view coordinates
pub type FocusObserver = Arc<dyn Fn(f32, f32) + Send + Sync>;
/// Observer of failures that have no operation to report to (teardown, reconfiguration)
pub type DiagnosticObserver = Arc<dyn Fn(CameraError) + Send + Sync>;

/// Integration options fixed for the lifetime of a session driver
#[derive(Clone)]
pub struct SessionOptions {
    pub defaults: ConfigDefaults,
    pub picture_hook: PictureHook,
    pub on_zoom_changed: Option<ZoomObserver>,
    pub on_focus_changed: Option<FocusObserver>,
    pub on_diagnostic: Option<DiagnosticObserver>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            defaults: ConfigDefaults::default(),
            picture_hook: default_picture_hook(),
            on_zoom_changed: None,
            on_focus_changed: None,
            on_diagnostic: None,
        }
    }
}

/// Callbacks of an `open` request
pub struct OpenCallbacks {
    on_ready: Box<dyn FnOnce(CameraConfig) + Send>,
    on_active: Box<dyn FnOnce() + Send>,
    on_error: Box<dyn FnOnce(CameraError) + Send>,
}

impl Default for OpenCallbacks {
    fn default() -> Self {
        Self {
            on_ready: Box::new(|_| {}),
            on_active: Box::new(|| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

impl OpenCallbacks {
    /// Configuration is built, preview not started yet
    pub fn on_ready(mut self, f: impl FnOnce(CameraConfig) + Send + 'static) -> Self {
        self.on_ready = Box::new(f);
        self
    }

    /// Preview is streaming
    pub fn on_active(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_active = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(CameraError) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

/// Callbacks of a `take_picture` request
pub struct PictureCallbacks {
    on_taken: Box<dyn FnOnce(DynamicImage) + Send>,
    on_error: Box<dyn FnOnce(CameraError) + Send>,
    on_shutter: Option<Box<dyn FnOnce() + Send>>,
}

impl Default for PictureCallbacks {
    fn default() -> Self {
        Self {
            on_taken: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
            on_shutter: None,
        }
    }
}

impl PictureCallbacks {
    pub fn on_taken(mut self, f: impl FnOnce(DynamicImage) + Send + 'static) -> Self {
        self.on_taken = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(CameraError) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }

    /// Exposure locked; fires before the picture is delivered
    pub fn on_shutter(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_shutter = Some(Box::new(f));
        self
    }
}

/// Callbacks of a recording
pub struct RecordingCallbacks {
    on_recorded: Box<dyn FnOnce(PathBuf) + Send>,
    on_error: Box<dyn FnOnce(CameraError) + Send>,
}

impl Default for RecordingCallbacks {
    fn default() -> Self {
        Self {
            on_recorded: Box::new(|_| {}),
            on_error: Box::new(|_| {}),
        }
    }
}

impl RecordingCallbacks {
    /// Recording finalized at the given destination
    pub fn on_recorded(mut self, f: impl FnOnce(PathBuf) + Send + 'static) -> Self {
        self.on_recorded = Box::new(f);
        self
    }

    pub fn on_error(mut self, f: impl FnOnce(CameraError) + Send + 'static) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

struct ActiveRecording {
    destination: PathBuf,
    callbacks: RecordingCallbacks,
}

#[derive(Default)]
struct SessionInner {
    state: BackendState,
    session_id: Option<Uuid>,
    camera: Option<CameraDescriptor>,
    surface: Option<Arc<dyn PreviewSurface>>,
    config: Option<CameraConfig>,
    recording: Option<ActiveRecording>,
}

impl SessionInner {
    /// Geometry of the current preview, if a configuration exists
    fn geometry(&self, snapshot: &ConfigSnapshot) -> Option<PreviewGeometry> {
        let surface = self.surface.as_ref()?;
        let camera = self.camera.as_ref()?;
        Some(PreviewGeometry {
            view: surface.size(),
            preview: snapshot.sizes.preview,
            device_rotation: self.device_rotation(snapshot)?,
            sensor_orientation: camera.sensor_orientation,
            facing: camera.facing,
            policy: snapshot.basic.preview_scale,
            mirror: snapshot.basic.mirror,
        })
    }

    fn device_rotation(&self, snapshot: &ConfigSnapshot) -> Option<Rotation> {
        let surface = self.surface.as_ref()?;
        Some(
            snapshot
                .basic
                .rotation_override
                .unwrap_or_else(|| surface.display_rotation()),
        )
    }
}

/// State shared between the public handle, worker tasks and config listeners
struct SessionCore {
    inner: Mutex<SessionInner>,
    worker: WorkerHandle<Backend>,
    callbacks: CallbackSender,
    generation: GenerationCounter,
    platform: Arc<dyn DevicePlatform>,
    options: SessionOptions,
}

impl SessionCore {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.is_current(generation)
    }

    /// Move to `to` if still in `from` and the generation is current
    fn transition(&self, generation: u64, from: BackendState, to: BackendState) -> bool {
        let mut inner = self.lock();
        if !self.is_current(generation) || inner.state != from {
            return false;
        }
        debug!(from = %from, to = %to, "Session state change");
        inner.state = to;
        true
    }

    fn report_diagnostic(&self, error: CameraError) {
        if let Some(observer) = self.options.on_diagnostic.clone() {
            self.callbacks.post_always(move || observer(error));
        }
    }

    fn config_snapshot(&self) -> Option<ConfigSnapshot> {
        let config = self.lock().config.clone()?;
        config.snapshot().ok()
    }

    // ===== Open =====

    fn run_open(
        self: &Arc<Self>,
        backend: &mut Backend,
        generation: u64,
        camera: CameraDescriptor,
        callbacks: OpenCallbacks,
    ) {
        if !self.is_current(generation) {
            debug!(generation, "Skipping open of a released session");
            return;
        }
        let OpenCallbacks {
            on_ready,
            on_active,
            on_error,
        } = callbacks;

        let capabilities = match backend.open(&camera) {
            Ok(capabilities) => capabilities,
            Err(fault) => return self.fail_open(backend, generation, fault, on_error),
        };

        let config = CameraConfig::new(capabilities, self.options.defaults);
        let weak = Arc::downgrade(self);
        config.set_listener(Arc::new(move |change| {
            if let Some(core) = Weak::upgrade(&weak) {
                core.on_config_change(generation, change);
            }
        }));

        let applied = config
            .snapshot()
            .map_err(|_| DeviceFault::Hardware("configuration closed".to_string()))
            .and_then(|snapshot| backend.apply_config(&snapshot));
        if let Err(fault) = applied {
            config.close();
            return self.fail_open(backend, generation, fault, on_error);
        }

        {
            let mut inner = self.lock();
            if !self.is_current(generation) {
                // Released during the handshake; the queued teardown closes the device
                config.close();
                return;
            }
            inner.config = Some(config.clone());
            inner.state = BackendState::Ready;
        }
        info!(camera = %camera.id, "Camera ready");
        self.callbacks.post(generation, move || on_ready(config));
        self.apply_transform(generation);

        if let Err(fault) = backend.start_preview() {
            return self.fail_open(backend, generation, fault, on_error);
        }
        if self.transition(generation, BackendState::Ready, BackendState::Active) {
            info!(camera = %camera.id, "Camera active");
            self.callbacks.post(generation, on_active);
        }
    }

    fn fail_open(
        &self,
        backend: &mut Backend,
        generation: u64,
        fault: DeviceFault,
        on_error: Box<dyn FnOnce(CameraError) + Send>,
    ) {
        error!(%fault, "Camera open failed");
        if let Err(close_fault) = backend.close() {
            warn!(%close_fault, "Cleanup after failed open reported an error");
        }
        {
            let mut inner = self.lock();
            if !self.is_current(generation) {
                return;
            }
            inner.state = BackendState::Closed;
            if let Some(config) = inner.config.take() {
                config.close();
            }
        }
        let error = CameraError::from_handshake(fault);
        self.callbacks.post(generation, move || on_error(error));
    }

    // ===== Configuration =====

    fn on_config_change(self: &Arc<Self>, generation: u64, change: ConfigChange) {
        if !self.is_current(generation) {
            return;
        }

        let core = Arc::clone(self);
        self.worker.submit(move |backend| {
            if !core.is_current(generation) {
                return;
            }
            let Some(snapshot) = core.config_snapshot() else {
                return;
            };
            if let Err(fault) = backend.apply_config(&snapshot) {
                warn!(%fault, ?change, "Failed to apply configuration change");
                core.report_diagnostic(CameraError::DeviceUnavailable(fault.to_string()));
            }
        });

        match change {
            ConfigChange::Zoom { level, .. } => {
                if let Some(observer) = self.options.on_zoom_changed.clone() {
                    self.callbacks.post(generation, move || observer(level));
                }
            }
            ConfigChange::Geometry => {
                self.apply_transform(generation);
            }
            ConfigChange::Parameters => {}
        }
    }

    /// Compute the preview transform and post it to the surface
    fn apply_transform(&self, generation: u64) -> Option<Matrix> {
        let (surface, config) = {
            let inner = self.lock();
            (inner.surface.clone()?, inner.config.clone()?)
        };
        let snapshot = config.snapshot().ok()?;
        let geometry = self.lock().geometry(&snapshot)?;
        let matrix = geometry.transform();
        debug!(
            view = %geometry.view,
            preview = %geometry.preview,
            delta = %geometry.delta(),
            "Preview transform updated"
        );
        self.callbacks
            .post(generation, move || surface.set_transform(matrix));
        Some(matrix)
    }

    // ===== Capture =====

    fn run_capture(
        &self,
        backend: &mut Backend,
        generation: u64,
        context: PictureContext,
        callbacks: PictureCallbacks,
    ) {
        if !self.is_current(generation) {
            return;
        }
        let PictureCallbacks {
            on_taken,
            on_error,
            on_shutter,
        } = callbacks;

        let sender = self.callbacks.clone();
        let mut on_shutter = on_shutter;
        let captured = backend.capture(&mut || {
            if let Some(shutter) = on_shutter.take() {
                sender.post(generation, shutter);
            }
        });

        let hook = Arc::clone(&self.options.picture_hook);
        let result = captured
            .map_err(CameraError::from_capture)
            .and_then(|jpeg| decode_jpeg(&jpeg))
            .map(|image| hook(image, &context));

        self.transition(generation, BackendState::Capturing, BackendState::Active);
        match result {
            Ok(image) => {
                info!(width = image.width(), height = image.height(), "Picture taken");
                self.callbacks.post(generation, move || on_taken(image));
            }
            Err(error) => {
                warn!(%error, "Picture capture failed");
                self.callbacks.post(generation, move || on_error(error));
            }
        }
    }
}

/// Lifecycle driver for one camera at a time
pub struct Session {
    core: Arc<SessionCore>,
    backend_type: BackendType,
    worker: Worker,
    /// Only the latest tap's reset is ever pending
    focus_timer: FocusResetTimer,
}

impl Session {
    /// Start the device worker that will own `backend`
    pub fn new(
        backend: Backend,
        platform: Arc<dyn DevicePlatform>,
        callbacks: CallbackSender,
        options: SessionOptions,
    ) -> HalResult<Self> {
        let backend_type = backend.backend_type();
        let worker = DeviceWorker::start("camhal-device", backend).map_err(|e| {
            CameraError::DeviceUnavailable(format!("failed to start device worker: {}", e))
        })?;
        let generation = callbacks.generation().clone();
        let focus_timer = start_focus_timer(worker.handle(), generation.clone()).map_err(|e| {
            CameraError::DeviceUnavailable(format!("failed to start focus reset timer: {}", e))
        })?;
        let core = Arc::new(SessionCore {
            inner: Mutex::new(SessionInner::default()),
            worker: worker.handle(),
            callbacks,
            generation,
            platform,
            options,
        });
        info!(backend = %backend_type, "Camera session driver started");
        Ok(Self {
            core,
            backend_type,
            worker,
            focus_timer,
        })
    }

    pub fn backend_type(&self) -> BackendType {
        self.backend_type
    }

    /// Ask the backend for its cameras; blocks until the worker answers
    pub fn enumerate_cameras(&self) -> Vec<CameraDescriptor> {
        self.core
            .worker
            .call(|backend| backend.enumerate_cameras())
            .unwrap_or_default()
    }

    pub fn state(&self) -> BackendState {
        self.core.lock().state
    }

    /// Identifier of the current session, used in log fields
    pub fn session_id(&self) -> Option<Uuid> {
        self.core.lock().session_id
    }

    /// Camera of the current session
    pub fn camera(&self) -> Option<CameraDescriptor> {
        self.core.lock().camera.clone()
    }

    /// Live configuration; `None` while Closed or Initializing
    pub fn current_config(&self) -> Option<CameraConfig> {
        let inner = self.core.lock();
        if inner.state.has_config() {
            inner.config.clone()
        } else {
            None
        }
    }

    /// Open `camera` and start its preview on `surface`.
    ///
    /// Only the permission check fails synchronously. Everything else is
    /// reported through `callbacks`. A session that is still open is released
    /// first, and the new handshake runs after its teardown.
    pub fn open(
        &self,
        surface: Arc<dyn PreviewSurface>,
        camera: CameraDescriptor,
        callbacks: OpenCallbacks,
    ) -> HalResult<()> {
        if !self.core.platform.has_camera_permission() {
            warn!(camera = %camera.id, "Camera permission missing");
            return Err(CameraError::PermissionDenied);
        }
        if self.state() != BackendState::Closed {
            debug!("Releasing previous session before opening");
            self.release();
        }

        let generation = self.core.generation.advance();
        let session_id = Uuid::new_v4();
        {
            let mut inner = self.core.lock();
            *inner = SessionInner {
                state: BackendState::Initializing,
                session_id: Some(session_id),
                camera: Some(camera.clone()),
                surface: Some(surface),
                config: None,
                recording: None,
            };
        }
        info!(%session_id, camera = %camera, generation, "Opening camera");

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            core.run_open(backend, generation, camera, callbacks);
        });
        Ok(())
    }

    /// Capture one still.
    ///
    /// Fails synchronously with `OperationInProgress` while another capture or
    /// a recording runs; the outcome of an accepted capture arrives through
    /// `callbacks`.
    pub fn take_picture(&self, callbacks: PictureCallbacks) -> HalResult<()> {
        let generation = self.core.generation.current();
        let context = {
            let mut inner = self.core.lock();
            check_can_start(inner.state)?;
            let camera = inner
                .camera
                .clone()
                .ok_or_else(|| CameraError::DeviceUnavailable("no camera".to_string()))?;
            let snapshot = inner
                .config
                .as_ref()
                .map(CameraConfig::snapshot)
                .transpose()?
                .ok_or_else(|| CameraError::DeviceUnavailable("no configuration".to_string()))?;
            let device_rotation = inner.device_rotation(&snapshot).unwrap_or_default();
            inner.state = BackendState::Capturing;
            PictureContext {
                rotation: picture_orientation(
                    device_rotation,
                    camera.sensor_orientation,
                    camera.facing,
                ),
                facing: camera.facing,
                mirror: snapshot.basic.mirror,
            }
        };
        debug!(rotation = %context.rotation, "Capturing picture");

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            core.run_capture(backend, generation, context, callbacks);
        });
        Ok(())
    }

    /// Start recording into `destination`
    pub fn start_recording(
        &self,
        destination: PathBuf,
        callbacks: RecordingCallbacks,
    ) -> HalResult<()> {
        let generation = self.core.generation.current();
        let profile = {
            let mut inner = self.core.lock();
            check_can_start(inner.state)?;
            let camera = inner
                .camera
                .clone()
                .ok_or_else(|| CameraError::DeviceUnavailable("no camera".to_string()))?;
            let snapshot = inner
                .config
                .as_ref()
                .map(CameraConfig::snapshot)
                .transpose()?
                .ok_or_else(|| CameraError::DeviceUnavailable("no configuration".to_string()))?;
            let device_rotation = inner.device_rotation(&snapshot).unwrap_or_default();
            inner.state = BackendState::Recording;
            inner.recording = Some(ActiveRecording {
                destination: destination.clone(),
                callbacks,
            });
            RecordingProfile {
                size: snapshot.video.size,
                frame_rate: snapshot.video.frame_rate,
                bitrate_kbps: snapshot.video_bitrate_kbps(),
                orientation_hint: picture_orientation(
                    device_rotation,
                    camera.sensor_orientation,
                    camera.facing,
                ),
                stabilization: snapshot.video.stabilization,
            }
        };

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            if !core.is_current(generation) {
                return;
            }
            match backend.start_recording(&destination, &profile) {
                Ok(()) => info!(
                    destination = %destination.display(),
                    bitrate_kbps = profile.bitrate_kbps,
                    "Recording started"
                ),
                Err(fault) => {
                    warn!(%fault, "Recording failed to start");
                    let recording = core.lock().recording.take();
                    core.transition(generation, BackendState::Recording, BackendState::Active);
                    if let Some(recording) = recording {
                        let error = CameraError::from_recording(fault);
                        core.callbacks
                            .post(generation, move || (recording.callbacks.on_error)(error));
                    }
                }
            }
        });
        Ok(())
    }

    /// Finalize the running recording; a no-op when not recording.
    ///
    /// The session is back in Active as soon as this returns. Work queued
    /// afterwards runs on the device after the recorder is finalized.
    pub fn stop_recording(&self) {
        let generation = self.core.generation.current();
        let recording = {
            let mut inner = self.core.lock();
            let recording = inner.recording.take();
            if recording.is_some() && inner.state == BackendState::Recording {
                debug!("Session state change: Recording -> Active (stop queued)");
                inner.state = BackendState::Active;
            }
            recording
        };
        let Some(recording) = recording else {
            debug!("stop_recording without a running recording");
            return;
        };

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            if !core.is_current(generation) {
                return;
            }
            let result = backend.stop_recording();
            let ActiveRecording {
                destination,
                callbacks,
            } = recording;
            match result {
                Ok(()) => {
                    info!(destination = %destination.display(), "Recording finished");
                    core.callbacks
                        .post(generation, move || (callbacks.on_recorded)(destination));
                }
                Err(fault) => {
                    warn!(%fault, "Recording failed to finalize");
                    let error = CameraError::from_recording(fault);
                    core.callbacks
                        .post(generation, move || (callbacks.on_error)(error));
                }
            }
        });
    }

    /// Tear the session down; legal in every state.
    ///
    /// Returns immediately. No callback of the released session fires
    /// afterwards. Teardown faults go to the log and the diagnostic observer.
    pub fn release(&self) {
        self.core.generation.advance();
        self.focus_timer.cancel();
        let (previous, session_id, config) = {
            let mut inner = self.core.lock();
            let previous = inner.state;
            let session_id = inner.session_id.take();
            let config = inner.config.take();
            *inner = SessionInner::default();
            (previous, session_id, config)
        };
        if let Some(config) = config {
            config.close();
        }
        if previous != BackendState::Closed {
            info!(session_id = ?session_id, state = %previous, "Releasing camera");
        }

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            if !backend.is_open() {
                return;
            }
            if let Err(fault) = backend.close() {
                warn!(%fault, "Camera teardown reported an error");
                core.report_diagnostic(CameraError::DeviceUnavailable(format!(
                    "teardown failed: {}",
                    fault
                )));
            }
        });
    }

    /// Release and block until the teardown ran on the worker
    pub fn release_and_wait(&self) -> bool {
        self.release();
        self.core.worker.wait_idle_timeout(RELEASE_WAIT_TIMEOUT)
    }

    /// Block until all queued device work has run
    pub fn wait_idle(&self) -> bool {
        self.core.worker.wait_idle()
    }

    /// Recompute the preview transform after a resize or display rotation
    pub fn refresh_preview_transform(&self) -> Option<Matrix> {
        let generation = self.core.generation.current();
        self.core.apply_transform(generation)
    }

    /// Focus on a touch in view coordinates.
    ///
    /// Returns `false` when not streaming, when tap-to-focus is off, or when
    /// the touch misses the visible preview.
    pub fn focus_at(&self, x: f32, y: f32) -> bool {
        let generation = self.core.generation.current();
        let (geometry, snapshot) = {
            let inner = self.core.lock();
            if !matches!(inner.state, BackendState::Active | BackendState::Recording) {
                return false;
            }
            let Some(config) = inner.config.clone() else {
                return false;
            };
            let Ok(snapshot) = config.snapshot() else {
                return false;
            };
            let Some(geometry) = inner.geometry(&snapshot) else {
                return false;
            };
            (geometry, snapshot)
        };
        if !snapshot.basic.tap_to_focus {
            return false;
        }

        let Some(region) = geometry.focus_region(x, y) else {
            debug!(x, y, "Touch outside the preview");
            return false;
        };
        let Some(area) = map_focus_region_to_driver_space(
            region,
            snapshot.sizes.preview,
            snapshot.capabilities.focus_space,
        ) else {
            return false;
        };
        debug!(x, y, region = %region, driver = %area.rect, "Focus requested");

        if let Some(observer) = self.core.options.on_focus_changed.clone() {
            self.core.callbacks.post(generation, move || observer(x, y));
        }

        let core = Arc::clone(&self.core);
        self.core.worker.submit(move |backend| {
            if !core.is_current(generation) {
                return;
            }
            if let Err(fault) = backend.focus(area) {
                warn!(%fault, "Focus request failed");
            }
        });

        self.focus_timer.arm(generation, snapshot.basic.reset_focus_delay);
        true
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
        self.focus_timer.stop();
        self.worker.stop();
    }
}

/// Timer that drops the tapped focus region once its delay ran out
fn start_focus_timer(
    worker: WorkerHandle<Backend>,
    generation: GenerationCounter,
) -> std::io::Result<FocusResetTimer> {
    FocusResetTimer::start("camhal-focus-reset", move |armed_generation| {
        if !generation.is_current(armed_generation) {
            return;
        }
        let generation = generation.clone();
        worker.submit(move |backend| {
            if !generation.is_current(armed_generation) {
                return;
            }
            if let Err(fault) = backend.reset_focus() {
                warn!(%fault, "Focus reset failed");
            }
        });
    })
}

fn check_can_start(state: BackendState) -> HalResult<()> {
    match state {
        BackendState::Active => Ok(()),
        BackendState::Capturing | BackendState::Recording => Err(CameraError::OperationInProgress),
        other => Err(CameraError::DeviceUnavailable(format!("camera is {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::backend_for_type;
    use crate::backends::camera::simulated::SimulatedPlatform;
    use crate::dispatch::{CallbackQueue, callback_channel};
    use crate::geometry::Size;
    use std::sync::mpsc;
    use std::time::Duration;

    struct TestSurface;

    impl PreviewSurface for TestSurface {
        fn size(&self) -> Size {
            Size::new(1080, 1920)
        }

        fn display_rotation(&self) -> Rotation {
            Rotation::Deg0
        }

        fn set_transform(&self, _matrix: Matrix) {}
    }

    fn session(backend: BackendType) -> (Session, CallbackQueue, Arc<SimulatedPlatform>) {
        let platform = Arc::new(SimulatedPlatform::phone());
        let (sender, queue) = callback_channel();
        let session = Session::new(
            backend_for_type(backend, platform.as_ref(), Duration::from_secs(2)).unwrap(),
            platform.clone(),
            sender,
            SessionOptions::default(),
        )
        .unwrap();
        (session, queue, platform)
    }

    fn open_back(session: &Session, queue: &mut CallbackQueue) {
        let camera = session.enumerate_cameras().remove(0);
        let (tx, rx) = mpsc::channel();
        session
            .open(
                Arc::new(TestSurface),
                camera,
                OpenCallbacks::default().on_active(move || tx.send(()).unwrap()),
            )
            .unwrap();
        assert!(session.wait_idle());
        queue.dispatch_pending();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn test_open_reaches_active() {
        for backend in [BackendType::Legacy, BackendType::Modern] {
            let (session, mut queue, _) = session(backend);
            open_back(&session, &mut queue);
            assert_eq!(session.state(), BackendState::Active);
            assert!(session.current_config().is_some());
            assert!(session.session_id().is_some());
        }
    }

    #[test]
    fn test_config_hidden_until_ready() {
        let (session, _queue, _) = session(BackendType::Legacy);
        assert!(session.current_config().is_none());
        assert_eq!(session.state(), BackendState::Closed);
    }

    #[test]
    fn test_release_closes_config_and_device() {
        let (session, mut queue, platform) = session(BackendType::Modern);
        open_back(&session, &mut queue);
        let config = session.current_config().unwrap();
        assert!(session.release_and_wait());
        assert!(config.is_closed());
        assert_eq!(session.state(), BackendState::Closed);
        assert_eq!(platform.hardware().open_handles(), 0);
    }

    #[test]
    fn test_picture_while_capturing_is_rejected() {
        let (session, mut queue, _) = session(BackendType::Legacy);
        open_back(&session, &mut queue);
        session.take_picture(PictureCallbacks::default()).unwrap();
        assert_eq!(
            session.take_picture(PictureCallbacks::default()).err(),
            Some(CameraError::OperationInProgress)
        );
        assert!(session.wait_idle());
        assert_eq!(session.state(), BackendState::Active);
    }

    #[test]
    fn test_check_can_start() {
        assert!(check_can_start(BackendState::Active).is_ok());
        assert_eq!(
            check_can_start(BackendState::Recording),
            Err(CameraError::OperationInProgress)
        );
        assert!(matches!(
            check_can_start(BackendState::Closed),
            Err(CameraError::DeviceUnavailable(_))
        ));
    }
}
