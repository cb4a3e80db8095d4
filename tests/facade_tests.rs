// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the camera facade

use camhal::backends::camera::{
    BackendPreference, BackendState, BackendType, HardwareLevel, OpenCallbacks, PreviewSurface,
};
use camhal::backends::simulated::SimulatedPlatform;
use camhal::camera::{Camera, CameraBuilder};
use camhal::constants::{LEGACY_FOCUS_SPACE_MAX, LEGACY_FOCUS_SPACE_MIN};
use camhal::dispatch::{CallbackQueue, DeliveryMode};
use camhal::errors::CameraError;
use camhal::geometry::{Facing, Matrix, PreviewGeometry, PreviewScale, Rect, Rotation, Size};
use camhal::settings::Settings;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const VIEW: Size = Size::new(1080, 1920);

/// Surface that remembers every transform it was given
#[derive(Default)]
struct RecordingSurface {
    transforms: Mutex<Vec<Matrix>>,
}

impl RecordingSurface {
    fn last(&self) -> Option<Matrix> {
        self.transforms.lock().unwrap().last().copied()
    }
}

impl PreviewSurface for RecordingSurface {
    fn size(&self) -> Size {
        VIEW
    }

    fn display_rotation(&self) -> Rotation {
        Rotation::Deg0
    }

    fn set_transform(&self, matrix: Matrix) {
        self.transforms.lock().unwrap().push(matrix);
    }
}

fn caller_thread(builder: CameraBuilder) -> (Camera, CallbackQueue) {
    let mut camera = builder
        .delivery_mode(DeliveryMode::CallerThread)
        .build()
        .unwrap();
    let queue = camera.take_callback_queue().unwrap();
    (camera, queue)
}

fn open(
    camera: &Camera,
    queue: &mut CallbackQueue,
    facing: Facing,
) -> Arc<RecordingSurface> {
    let surface = Arc::new(RecordingSurface::default());
    let descriptor = camera.find_camera(facing).unwrap();
    camera
        .open(surface.clone(), &descriptor, OpenCallbacks::default())
        .unwrap();
    assert!(camera.wait_idle());
    queue.dispatch_pending();
    assert_eq!(camera.state(), BackendState::Active);
    surface
}

#[test]
fn test_permission_denied_is_synchronous() {
    let platform = Arc::new(SimulatedPlatform::phone());
    platform.set_permission(false);
    let (camera, mut queue) = caller_thread(Camera::builder(platform.clone()));
    let descriptor = camera.find_camera(Facing::Back).unwrap();

    let result = camera.open(
        Arc::new(RecordingSurface::default()),
        &descriptor,
        OpenCallbacks::default().on_error(|_| panic!("no callback after a synchronous failure")),
    );
    assert_eq!(result, Err(CameraError::PermissionDenied));
    assert!(camera.wait_idle());
    assert_eq!(queue.dispatch_pending(), 0);
    assert_eq!(camera.state(), BackendState::Closed);
    assert_eq!(platform.hardware().open_count(), 0);
}

#[test]
fn test_backend_selection() {
    let build = |platform: SimulatedPlatform, preference: BackendPreference| {
        Camera::builder(Arc::new(platform))
            .backend(preference)
            .build()
            .map(|camera| camera.backend_type())
    };

    assert_eq!(
        build(SimulatedPlatform::phone(), BackendPreference::Auto),
        Ok(BackendType::Modern)
    );
    assert_eq!(
        build(SimulatedPlatform::phone(), BackendPreference::Legacy),
        Ok(BackendType::Legacy)
    );
    assert_eq!(
        build(SimulatedPlatform::legacy_only(), BackendPreference::Auto),
        Ok(BackendType::Legacy)
    );
    assert!(matches!(
        build(SimulatedPlatform::legacy_only(), BackendPreference::Modern),
        Err(CameraError::DeviceUnavailable(_))
    ));

    let limited = SimulatedPlatform::phone();
    limited.set_hardware_level(HardwareLevel::Legacy);
    assert_eq!(
        build(limited, BackendPreference::Auto),
        Ok(BackendType::Legacy)
    );

    let camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
        .incompatible_models(vec!["camhal-sim".to_string()])
        .build()
        .unwrap();
    assert_eq!(camera.backend_type(), BackendType::Legacy);
}

#[test]
fn test_descriptor_from_other_backend_rejected() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let legacy = Camera::builder(platform.clone())
        .backend(BackendPreference::Legacy)
        .build()
        .unwrap();
    let modern = Camera::builder(platform)
        .backend(BackendPreference::Modern)
        .build()
        .unwrap();
    let descriptor = legacy.find_camera(Facing::Back).unwrap();
    assert!(matches!(
        modern.open(
            Arc::new(RecordingSurface::default()),
            &descriptor,
            OpenCallbacks::default()
        ),
        Err(CameraError::DeviceUnavailable(_))
    ));
}

#[test]
fn test_dedicated_thread_delivery() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let camera = Camera::builder(platform).build().unwrap();
    let descriptor = camera.find_camera(Facing::Back).unwrap();

    let (tx, rx) = mpsc::channel();
    camera
        .open(
            Arc::new(RecordingSurface::default()),
            &descriptor,
            OpenCallbacks::default().on_active(move || {
                tx.send(std::thread::current().name().map(str::to_string))
                    .unwrap();
            }),
        )
        .unwrap();
    let thread_name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(thread_name.as_deref(), Some("camhal-callbacks"));
    assert!(camera.release_and_wait());
}

#[test]
fn test_zoom_observer_sees_clamped_levels() {
    let levels = Arc::new(Mutex::new(Vec::new()));
    let sink = levels.clone();
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, mut queue) = caller_thread(
        Camera::builder(platform.clone())
            .on_zoom_changed(move |level| sink.lock().unwrap().push(level)),
    );
    open(&camera, &mut queue, Facing::Back);

    assert_eq!(camera.set_zoom_delta(50), Ok(50));
    assert_eq!(camera.set_zoom_delta(-100), Ok(0));
    assert_eq!(camera.set_zoom_delta(-10), Ok(0));
    assert!(camera.wait_idle());
    queue.dispatch_pending();
    assert_eq!(*levels.lock().unwrap(), vec![50, 0, 0]);

    let active = Rect::new(0, 0, 4032, 3024);
    let request = platform.hardware().last_request().unwrap();
    assert_eq!(request.crop_region, Some(active));

    camera.set_zoom_delta(100).unwrap();
    assert!(camera.wait_idle());
    let crop = platform
        .hardware()
        .last_request()
        .unwrap()
        .crop_region
        .unwrap();
    assert!(active.contains_rect(&crop));
    assert!(crop.width() < active.width());
}

#[test]
fn test_legacy_zoom_uses_ratio_index() {
    let platform = Arc::new(SimulatedPlatform::legacy_only());
    let (camera, mut queue) = caller_thread(Camera::builder(platform.clone()));
    open(&camera, &mut queue, Facing::Back);

    camera.set_zoom_delta(100).unwrap();
    assert!(camera.wait_idle());
    let parameters = platform.hardware().last_legacy_parameters().unwrap();
    // Highest entry of the advertised ratio list
    assert_eq!(parameters.zoom_index, 8);
}

#[test]
fn test_focus_at_back_camera() {
    let touches = Arc::new(Mutex::new(Vec::new()));
    let sink = touches.clone();
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, mut queue) = caller_thread(
        Camera::builder(platform.clone())
            .on_focus_changed(move |x, y| sink.lock().unwrap().push((x, y))),
    );
    open(&camera, &mut queue, Facing::Back);

    assert!(camera.focus_at(540.0, 960.0));
    assert!(camera.wait_idle());
    queue.dispatch_pending();
    assert_eq!(*touches.lock().unwrap(), vec![(540.0, 960.0)]);

    let areas = platform.hardware().focus_areas();
    let active = Rect::new(0, 0, 4032, 3024);
    assert!(!areas.is_empty());
    assert!(areas.iter().all(|area| active.contains_rect(&area.rect)));
}

#[test]
fn test_focus_rejected_outside_preview() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, mut queue) = caller_thread(
        Camera::builder(platform.clone()).preview_scale(PreviewScale::AutoFit),
    );
    open(&camera, &mut queue, Facing::Back);

    // 1440x1080 fitted into 1080x1920 leaves bars above and below
    assert!(!camera.focus_at(540.0, 50.0));
    assert!(camera.focus_at(540.0, 960.0));
}

#[test]
fn test_focus_unsupported_on_front_camera() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, mut queue) = caller_thread(Camera::builder(platform.clone()));
    open(&camera, &mut queue, Facing::Front);
    assert!(!camera.focus_at(540.0, 960.0));
    assert!(camera.wait_idle());
    assert!(platform.hardware().focus_areas().is_empty());
}

#[test]
fn test_focus_requires_streaming() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, _queue) = caller_thread(Camera::builder(platform));
    assert!(!camera.focus_at(540.0, 960.0));
}

#[test]
fn test_focus_resets_after_delay() {
    let platform = Arc::new(SimulatedPlatform::legacy_only());
    let (camera, mut queue) = caller_thread(
        Camera::builder(platform.clone()).reset_focus_delay(Duration::from_millis(20)),
    );
    open(&camera, &mut queue, Facing::Back);

    assert!(camera.focus_at(540.0, 960.0));
    assert!(camera.wait_idle());
    let focused = platform.hardware().last_legacy_parameters().unwrap();
    assert_eq!(focused.focus_areas.len(), 1);
    let rect = focused.focus_areas[0].rect;
    assert!(rect.left >= LEGACY_FOCUS_SPACE_MIN && rect.right <= LEGACY_FOCUS_SPACE_MAX);

    std::thread::sleep(Duration::from_millis(300));
    assert!(camera.wait_idle());
    let reset = platform.hardware().last_legacy_parameters().unwrap();
    assert!(reset.focus_areas.is_empty());
}

#[test]
fn test_rotation_override_updates_transform() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let (camera, mut queue) = caller_thread(Camera::builder(platform));
    let surface = open(&camera, &mut queue, Facing::Back);

    let mut geometry = PreviewGeometry {
        view: VIEW,
        preview: Size::new(1440, 1080),
        device_rotation: Rotation::Deg0,
        sensor_orientation: Rotation::Deg90,
        facing: Facing::Back,
        policy: PreviewScale::AutoFill,
        mirror: false,
    };
    let initial = surface.last().unwrap();
    assert!(initial.approx_eq(&geometry.transform(), 1e-3));
    let refreshed = camera.refresh_preview_transform().unwrap();
    assert!(refreshed.approx_eq(&initial, 1e-3));

    camera.set_rotation_override(90).unwrap();
    queue.dispatch_pending();
    geometry.device_rotation = Rotation::Deg90;
    assert!(surface.last().unwrap().approx_eq(&geometry.transform(), 1e-3));

    camera.clear_rotation_override().unwrap();
    camera.set_mirror(true).unwrap();
    queue.dispatch_pending();
    geometry.device_rotation = Rotation::Deg0;
    geometry.mirror = true;
    assert!(surface.last().unwrap().approx_eq(&geometry.transform(), 1e-3));
}

#[test]
fn test_builder_from_settings() {
    let settings = Settings {
        backend: BackendPreference::Legacy,
        advanced_features: true,
        mirror_preview: true,
        delivery_mode: DeliveryMode::CallerThread,
        ..Settings::default()
    };
    let platform = Arc::new(SimulatedPlatform::phone());
    let mut camera = CameraBuilder::from_settings(platform, &settings)
        .build()
        .unwrap();
    assert_eq!(camera.backend_type(), BackendType::Legacy);
    let mut queue = camera.take_callback_queue().unwrap();
    open(&camera, &mut queue, Facing::Back);

    let config = camera.current_config().unwrap();
    assert!(config.advanced_enabled().unwrap());
    assert!(config.mirror().unwrap());
    assert!(camera.release_and_wait());
    assert!(config.is_closed());
    assert!(matches!(
        config.zoom_level(),
        Err(CameraError::DeviceUnavailable(_))
    ));
}
