// SPDX-License-Identifier: GPL-3.0-only

//! In-memory implementation of both device APIs
//!
//! Behaves like a phone with a back and a front camera. Stills are synthetic
//! JPEG gradients at reduced resolution (aspect ratio preserved), recordings
//! are small files describing the recording profile. The shared
//! [`SimulatedHardware`] state records what the backends did so tests can
//! inspect it and inject faults.

use super::DevicePlatform;
use super::legacy::{LegacyCamera, LegacyCameraApi, LegacyCameraInfo, LegacyParameters};
use super::modern::{
    CaptureRequest, DeviceStateCallback, DeviceStateEvent, ModernCamera, ModernCameraApi,
    ModernCharacteristics, RequestTemplate,
};
use super::types::{BackendResult, HardwareLevel, RecordingProfile};
use crate::config::{
    AntibandingMode, Capabilities, ColorEffectMode, ExposureRange, FlashMode, FocusMode,
    WhiteBalanceMode, ZoomCapability,
};
use crate::errors::DeviceFault;
use crate::geometry::{DriverCoordinateSpace, Facing, FocusArea, Rect, Rotation, Size};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest side of generated stills
const SYNTHETIC_MAX_SIDE: u32 = 320;

/// Delay before the modern API answers an open request
const OPEN_LATENCY: Duration = Duration::from_millis(5);

/// One simulated physical camera
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCameraSpec {
    pub id: String,
    pub facing: Facing,
    pub sensor_orientation: Rotation,
    pub active_array: Rect,
}

impl SimulatedCameraSpec {
    pub fn back() -> Self {
        Self {
            id: "0".to_string(),
            facing: Facing::Back,
            sensor_orientation: Rotation::Deg90,
            active_array: Rect::new(0, 0, 4032, 3024),
        }
    }

    pub fn front() -> Self {
        Self {
            id: "1".to_string(),
            facing: Facing::Front,
            sensor_orientation: Rotation::Deg270,
            active_array: Rect::new(0, 0, 2592, 1944),
        }
    }

    fn base_capabilities(&self) -> Capabilities {
        let back = self.facing != Facing::Front;
        let full = Size::new(
            self.active_array.width() as u32,
            self.active_array.height() as u32,
        );
        Capabilities {
            flash_modes: if back {
                vec![FlashMode::Off, FlashMode::On, FlashMode::Auto, FlashMode::Torch]
            } else {
                vec![FlashMode::Off]
            },
            focus_modes: if back {
                vec![
                    FocusMode::Auto,
                    FocusMode::ContinuousPicture,
                    FocusMode::ContinuousVideo,
                    FocusMode::Macro,
                ]
            } else {
                vec![FocusMode::Fixed]
            },
            white_balance_modes: WhiteBalanceMode::ALL.to_vec(),
            antibanding_modes: vec![
                AntibandingMode::Off,
                AntibandingMode::Auto,
                AntibandingMode::Hz50,
                AntibandingMode::Hz60,
            ],
            color_effects: vec![
                ColorEffectMode::None,
                ColorEffectMode::Mono,
                ColorEffectMode::Negative,
                ColorEffectMode::Sepia,
            ],
            preview_sizes: vec![
                Size::new(1920, 1080),
                Size::new(1440, 1080),
                Size::new(1280, 720),
                Size::new(640, 480),
            ],
            picture_sizes: vec![full, Size::new(3840, 2160), Size::new(1920, 1080)],
            video_sizes: vec![
                Size::new(3840, 2160),
                Size::new(1920, 1080),
                Size::new(1280, 720),
            ],
            video_frame_rates: vec![24, 30, 60],
            video_stabilization: back,
            zoom: ZoomCapability::None,
            active_array: None,
            focus_space: DriverCoordinateSpace::Normalized,
            max_focus_areas: u32::from(back),
            exposure_compensation: ExposureRange { min: -12, max: 12 },
        }
    }

    fn legacy_capabilities(&self) -> Capabilities {
        Capabilities {
            zoom: ZoomCapability::Discrete {
                ratios_percent: vec![100, 110, 125, 150, 175, 200, 250, 300, 400],
            },
            ..self.base_capabilities()
        }
    }

    fn modern_capabilities(&self) -> Capabilities {
        let max_ratio_percent = if self.facing == Facing::Front { 200 } else { 800 };
        Capabilities {
            zoom: ZoomCapability::Continuous { max_ratio_percent },
            active_array: Some(self.active_array),
            focus_space: DriverCoordinateSpace::ActiveArray(self.active_array),
            ..self.base_capabilities()
        }
    }
}

#[derive(Default)]
struct HardwareState {
    open_handles: usize,
    max_open_handles: usize,
    open_count: usize,
    hardware_level: Option<HardwareLevel>,
    fail_next_open: Option<DeviceFault>,
    fail_next_capture: Option<DeviceFault>,
    fail_next_recording: Option<DeviceFault>,
    hang_open: bool,
    /// Open requests that will never be answered
    parked_callbacks: Vec<DeviceStateCallback>,
    events: Vec<String>,
    focus_areas: Vec<FocusArea>,
    last_legacy_parameters: Option<LegacyParameters>,
    last_request: Option<CaptureRequest>,
}

/// Shared state of the simulated devices
#[derive(Clone, Default)]
pub struct SimulatedHardware {
    state: Arc<Mutex<HardwareState>>,
}

impl SimulatedHardware {
    fn lock(&self) -> MutexGuard<'_, HardwareState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, event: String) {
        debug!(%event, "Simulated device event");
        self.lock().events.push(event);
    }

    /// Claim the device for `id`; fails while another handle is held
    fn acquire(&self, id: &str) -> BackendResult<()> {
        let mut state = self.lock();
        if let Some(fault) = state.fail_next_open.take() {
            return Err(fault);
        }
        if state.open_handles > 0 {
            return Err(DeviceFault::InUse);
        }
        state.open_handles += 1;
        state.open_count += 1;
        state.max_open_handles = state.max_open_handles.max(state.open_handles);
        state.events.push(format!("open {}", id));
        Ok(())
    }

    fn release(&self, id: &str) {
        let mut state = self.lock();
        state.open_handles = state.open_handles.saturating_sub(1);
        state.events.push(format!("close {}", id));
    }

    fn take_capture_fault(&self) -> Option<DeviceFault> {
        self.lock().fail_next_capture.take()
    }

    fn take_recording_fault(&self) -> Option<DeviceFault> {
        self.lock().fail_next_recording.take()
    }

    /// Handles currently held
    pub fn open_handles(&self) -> usize {
        self.lock().open_handles
    }

    /// Highest number of handles ever held at once
    pub fn max_open_handles(&self) -> usize {
        self.lock().max_open_handles
    }

    /// Successful opens so far
    pub fn open_count(&self) -> usize {
        self.lock().open_count
    }

    /// Device event log ("open 0", "preview 0", "close 0", ...)
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Focus areas received by either API, in driver space
    pub fn focus_areas(&self) -> Vec<FocusArea> {
        self.lock().focus_areas.clone()
    }

    pub fn last_legacy_parameters(&self) -> Option<LegacyParameters> {
        self.lock().last_legacy_parameters.clone()
    }

    pub fn last_request(&self) -> Option<CaptureRequest> {
        self.lock().last_request.clone()
    }

    pub fn fail_next_open(&self, fault: DeviceFault) {
        self.lock().fail_next_open = Some(fault);
    }

    pub fn fail_next_capture(&self, fault: DeviceFault) {
        self.lock().fail_next_capture = Some(fault);
    }

    pub fn fail_next_recording(&self, fault: DeviceFault) {
        self.lock().fail_next_recording = Some(fault);
    }

    /// Leave modern open requests unanswered
    pub fn set_hang_open(&self, hang: bool) {
        self.lock().hang_open = hang;
    }
}

/// Simulated host platform
pub struct SimulatedPlatform {
    hardware: SimulatedHardware,
    cameras: Vec<SimulatedCameraSpec>,
    permission: AtomicBool,
    model: String,
    legacy: bool,
    modern: bool,
}

impl SimulatedPlatform {
    pub fn new(cameras: Vec<SimulatedCameraSpec>, legacy: bool, modern: bool) -> Self {
        Self {
            hardware: SimulatedHardware::default(),
            cameras,
            permission: AtomicBool::new(true),
            model: "camhal-sim".to_string(),
            legacy,
            modern,
        }
    }

    /// Back and front camera, both device APIs
    pub fn phone() -> Self {
        Self::new(
            vec![SimulatedCameraSpec::back(), SimulatedCameraSpec::front()],
            true,
            true,
        )
    }

    pub fn legacy_only() -> Self {
        Self::new(
            vec![SimulatedCameraSpec::back(), SimulatedCameraSpec::front()],
            true,
            false,
        )
    }

    pub fn modern_only() -> Self {
        Self::new(
            vec![SimulatedCameraSpec::back(), SimulatedCameraSpec::front()],
            false,
            true,
        )
    }

    pub fn hardware(&self) -> SimulatedHardware {
        self.hardware.clone()
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    /// Hardware level reported for every camera by the modern API
    pub fn set_hardware_level(&self, level: HardwareLevel) {
        self.hardware.lock().hardware_level = Some(level);
    }
}

impl DevicePlatform for SimulatedPlatform {
    fn has_camera_permission(&self) -> bool {
        self.permission.load(Ordering::SeqCst)
    }

    fn device_model(&self) -> String {
        self.model.clone()
    }

    fn legacy_api(&self) -> Option<Arc<dyn LegacyCameraApi>> {
        self.legacy.then(|| {
            Arc::new(SimulatedLegacyApi {
                hardware: self.hardware.clone(),
                cameras: self.cameras.clone(),
            }) as Arc<dyn LegacyCameraApi>
        })
    }

    fn modern_api(&self) -> Option<Arc<dyn ModernCameraApi>> {
        self.modern.then(|| {
            Arc::new(SimulatedModernApi {
                hardware: self.hardware.clone(),
                cameras: self.cameras.clone(),
            }) as Arc<dyn ModernCameraApi>
        })
    }
}

// ===== Shared device behaviour =====

/// Gradient JPEG with the aspect ratio of `size`
fn synthetic_jpeg(size: Size) -> BackendResult<Vec<u8>> {
    if size.is_unknown() {
        return Err(DeviceFault::Hardware("no picture size configured".to_string()));
    }
    let longest = size.width.max(size.height);
    let (width, height) = if longest > SYNTHETIC_MAX_SIDE {
        (
            (size.width * SYNTHETIC_MAX_SIDE / longest).max(1),
            (size.height * SYNTHETIC_MAX_SIDE / longest).max(1),
        )
    } else {
        (size.width, size.height)
    };

    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .map_err(|e| DeviceFault::Hardware(format!("JPEG encoding failed: {}", e)))?;
    Ok(bytes)
}

#[derive(Serialize)]
struct RecordingHeader<'a> {
    camera: &'a str,
    profile: &'a RecordingProfile,
}

/// Recording in progress, written as a small text file
struct SimulatedRecording {
    file: File,
    path: PathBuf,
    frame_rate: u32,
    started: Instant,
}

impl SimulatedRecording {
    fn start(camera: &str, destination: &Path, profile: &RecordingProfile) -> BackendResult<Self> {
        let io_fault = |e: std::io::Error| DeviceFault::Hardware(e.to_string());
        let mut file = File::create(destination).map_err(io_fault)?;
        let header = RecordingHeader { camera, profile };
        serde_json::to_writer(&mut file, &header)
            .map_err(|e| DeviceFault::Hardware(e.to_string()))?;
        writeln!(file).map_err(io_fault)?;
        Ok(Self {
            file,
            path: destination.to_path_buf(),
            frame_rate: profile.frame_rate,
            started: Instant::now(),
        })
    }

    fn finish(mut self) -> BackendResult<()> {
        let frames = (self.started.elapsed().as_secs_f64() * self.frame_rate as f64) as u64;
        writeln!(self.file, "frames {}", frames)
            .and_then(|_| self.file.sync_all())
            .map_err(|e| DeviceFault::Hardware(format!("{}: {}", self.path.display(), e)))
    }
}

// ===== Legacy API =====

struct SimulatedLegacyApi {
    hardware: SimulatedHardware,
    cameras: Vec<SimulatedCameraSpec>,
}

impl LegacyCameraApi for SimulatedLegacyApi {
    fn number_of_cameras(&self) -> usize {
        self.cameras.len()
    }

    fn camera_info(&self, index: usize) -> Option<LegacyCameraInfo> {
        self.cameras.get(index).map(|spec| LegacyCameraInfo {
            facing: spec.facing,
            orientation: spec.sensor_orientation,
        })
    }

    fn open(&self, index: usize) -> BackendResult<Box<dyn LegacyCamera>> {
        let spec = self
            .cameras
            .get(index)
            .ok_or_else(|| DeviceFault::Hardware(format!("no camera at index {}", index)))?;
        self.hardware.acquire(&spec.id)?;
        Ok(Box::new(SimulatedLegacyCamera {
            hardware: self.hardware.clone(),
            id: spec.id.clone(),
            capabilities: spec.legacy_capabilities(),
            parameters: LegacyParameters::default(),
            previewing: false,
            recording: None,
            released: false,
        }))
    }
}

struct SimulatedLegacyCamera {
    hardware: SimulatedHardware,
    id: String,
    capabilities: Capabilities,
    parameters: LegacyParameters,
    previewing: bool,
    recording: Option<SimulatedRecording>,
    released: bool,
}

impl LegacyCamera for SimulatedLegacyCamera {
    fn capabilities(&self) -> Capabilities {
        self.capabilities.clone()
    }

    fn set_parameters(&mut self, parameters: &LegacyParameters) -> BackendResult<()> {
        if !self.capabilities.preview_sizes.contains(&parameters.preview_size) {
            return Err(DeviceFault::Hardware(format!(
                "invalid preview size {}",
                parameters.preview_size
            )));
        }
        self.parameters = parameters.clone();
        let mut state = self.hardware.lock();
        state.last_legacy_parameters = Some(parameters.clone());
        state.focus_areas.extend(parameters.focus_areas.iter().copied());
        Ok(())
    }

    fn start_preview(&mut self) -> BackendResult<()> {
        self.previewing = true;
        self.hardware.log(format!("preview {}", self.id));
        Ok(())
    }

    fn stop_preview(&mut self) {
        self.previewing = false;
    }

    fn auto_focus(&mut self) -> BackendResult<bool> {
        Ok(!self.parameters.focus_areas.is_empty())
    }

    fn cancel_auto_focus(&mut self) {}

    fn take_picture(&mut self, on_shutter: &mut dyn FnMut()) -> BackendResult<Vec<u8>> {
        if !self.previewing {
            return Err(DeviceFault::Hardware("preview not running".to_string()));
        }
        if let Some(fault) = self.hardware.take_capture_fault() {
            return Err(fault);
        }
        on_shutter();
        self.previewing = false;
        self.hardware.log(format!("capture {}", self.id));
        synthetic_jpeg(self.parameters.picture_size)
    }

    fn start_recording(
        &mut self,
        destination: &Path,
        profile: &RecordingProfile,
    ) -> BackendResult<()> {
        if let Some(fault) = self.hardware.take_recording_fault() {
            return Err(fault);
        }
        self.recording = Some(SimulatedRecording::start(&self.id, destination, profile)?);
        self.hardware.log(format!("record {}", self.id));
        Ok(())
    }

    fn stop_recording(&mut self) -> BackendResult<()> {
        let recording = self
            .recording
            .take()
            .ok_or_else(|| DeviceFault::Hardware("not recording".to_string()))?;
        self.hardware.log(format!("stop {}", self.id));
        recording.finish()
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.hardware.release(&self.id);
        }
    }
}

impl Drop for SimulatedLegacyCamera {
    fn drop(&mut self) {
        self.release();
    }
}

// ===== Modern API =====

struct SimulatedModernApi {
    hardware: SimulatedHardware,
    cameras: Vec<SimulatedCameraSpec>,
}

impl ModernCameraApi for SimulatedModernApi {
    fn camera_ids(&self) -> Vec<String> {
        self.cameras.iter().map(|spec| spec.id.clone()).collect()
    }

    fn characteristics(&self, id: &str) -> BackendResult<ModernCharacteristics> {
        let spec = self
            .cameras
            .iter()
            .find(|spec| spec.id == id)
            .ok_or_else(|| DeviceFault::Hardware(format!("unknown camera {}", id)))?;
        Ok(ModernCharacteristics {
            facing: spec.facing,
            sensor_orientation: spec.sensor_orientation,
            hardware_level: self
                .hardware
                .lock()
                .hardware_level
                .unwrap_or(HardwareLevel::Full),
            capabilities: spec.modern_capabilities(),
        })
    }

    fn open(&self, id: &str, callback: DeviceStateCallback) {
        {
            let mut state = self.hardware.lock();
            if state.hang_open {
                state.parked_callbacks.push(callback);
                return;
            }
        }

        let event = match self.cameras.iter().find(|spec| spec.id == id) {
            None => DeviceStateEvent::Error(DeviceFault::Hardware(format!("unknown camera {}", id))),
            Some(spec) => match self.hardware.acquire(&spec.id) {
                Ok(()) => DeviceStateEvent::Opened(Box::new(SimulatedModernCamera {
                    hardware: self.hardware.clone(),
                    id: spec.id.clone(),
                    capabilities: spec.modern_capabilities(),
                    session: None,
                    repeating: false,
                    recording: None,
                    closed: false,
                })),
                Err(DeviceFault::Disconnected) => DeviceStateEvent::Disconnected,
                Err(fault) => DeviceStateEvent::Error(fault),
            },
        };

        // Answer from another thread, like a real camera service
        thread::spawn(move || {
            thread::sleep(OPEN_LATENCY);
            callback(event);
        });
    }
}

struct SimulatedModernCamera {
    hardware: SimulatedHardware,
    id: String,
    capabilities: Capabilities,
    /// (preview, picture) stream sizes
    session: Option<(Size, Size)>,
    repeating: bool,
    recording: Option<SimulatedRecording>,
    closed: bool,
}

impl ModernCamera for SimulatedModernCamera {
    fn create_session(&mut self, preview: Size, picture: Size) -> BackendResult<()> {
        if !self.capabilities.preview_sizes.contains(&preview)
            || !self.capabilities.picture_sizes.contains(&picture)
        {
            return Err(DeviceFault::Hardware(format!(
                "unsupported stream combination {} / {}",
                preview, picture
            )));
        }
        self.session = Some((preview, picture));
        self.repeating = false;
        Ok(())
    }

    fn set_repeating_request(&mut self, request: &CaptureRequest) -> BackendResult<()> {
        if self.session.is_none() {
            return Err(DeviceFault::Hardware("no capture session".to_string()));
        }
        if !self.repeating {
            self.hardware.log(format!("preview {}", self.id));
        }
        self.repeating = true;
        let mut state = self.hardware.lock();
        state.last_request = Some(request.clone());
        if request.trigger_autofocus {
            state.focus_areas.extend(request.metering_regions.iter().copied());
        }
        Ok(())
    }

    fn stop_repeating(&mut self) {
        self.repeating = false;
    }

    fn capture(
        &mut self,
        request: &CaptureRequest,
        on_shutter: &mut dyn FnMut(),
    ) -> BackendResult<Vec<u8>> {
        let (_, picture) = self
            .session
            .ok_or_else(|| DeviceFault::Hardware("no capture session".to_string()))?;
        if request.template != RequestTemplate::StillCapture {
            return Err(DeviceFault::Hardware("not a still capture request".to_string()));
        }
        if let Some(fault) = self.hardware.take_capture_fault() {
            return Err(fault);
        }
        on_shutter();
        self.hardware.log(format!("capture {}", self.id));
        synthetic_jpeg(picture)
    }

    fn start_recording(
        &mut self,
        destination: &Path,
        profile: &RecordingProfile,
        request: &CaptureRequest,
    ) -> BackendResult<()> {
        if request.template != RequestTemplate::Record {
            return Err(DeviceFault::Hardware("not a record request".to_string()));
        }
        if let Some(fault) = self.hardware.take_recording_fault() {
            return Err(fault);
        }
        self.recording = Some(SimulatedRecording::start(&self.id, destination, profile)?);
        self.hardware.log(format!("record {}", self.id));
        Ok(())
    }

    fn stop_recording(&mut self) -> BackendResult<()> {
        let recording = self
            .recording
            .take()
            .ok_or_else(|| DeviceFault::Hardware("not recording".to_string()))?;
        self.hardware.log(format!("stop {}", self.id));
        recording.finish()
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.recording = None;
            self.hardware.release(&self.id);
        }
    }
}

impl Drop for SimulatedModernCamera {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_synthetic_jpeg_keeps_aspect() {
        let bytes = synthetic_jpeg(Size::new(4032, 3024)).unwrap();
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (320, 240));
        assert!(synthetic_jpeg(Size::UNKNOWN).is_err());
    }

    #[test]
    fn test_legacy_handle_is_exclusive() {
        let platform = SimulatedPlatform::phone();
        let api = platform.legacy_api().unwrap();
        let first = api.open(0).unwrap();
        assert_eq!(api.open(1).err(), Some(DeviceFault::InUse));
        drop(first);
        assert_eq!(platform.hardware().open_handles(), 0);
        assert!(api.open(1).is_ok());
    }

    #[test]
    fn test_modern_open_answers_asynchronously() {
        let platform = SimulatedPlatform::phone();
        let api = platform.modern_api().unwrap();
        let (tx, rx) = mpsc::channel();
        api.open("0", Box::new(move |event| tx.send(event).unwrap()));
        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, DeviceStateEvent::Opened(_)));
        assert_eq!(platform.hardware().open_handles(), 1);
        drop(event);
        assert_eq!(platform.hardware().open_handles(), 0);
    }

    #[test]
    fn test_modern_characteristics() {
        let platform = SimulatedPlatform::phone();
        let api = platform.modern_api().unwrap();
        let characteristics = api.characteristics("1").unwrap();
        assert_eq!(characteristics.facing, Facing::Front);
        assert_eq!(characteristics.hardware_level, HardwareLevel::Full);
        assert!(api.characteristics("9").is_err());
    }
}
