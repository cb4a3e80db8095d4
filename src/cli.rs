// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for camera operations
//!
//! The capture commands drive the full stack against the simulated phone:
//! - Listing available cameras
//! - Taking photos
//! - Recording videos
//!
//! The geometry commands only evaluate the pure preview/focus math.

use camhal::backends::camera::simulated::SimulatedPlatform;
use camhal::backends::camera::{
    CameraDescriptor, OpenCallbacks, PictureCallbacks, PreviewSurface, RecordingCallbacks,
};
use camhal::camera::{Camera, CameraBuilder};
use camhal::errors::CameraError;
use camhal::geometry::{
    DriverCoordinateSpace, Matrix, PreviewGeometry, Rect, Rotation, Size,
    map_focus_region_to_driver_space,
};
use camhal::settings::Settings;
use chrono::Local;
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default folder name for saving photos and videos
const DEFAULT_SAVE_FOLDER: &str = "Camera";

/// How long to wait for any single camera event
const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Headless view of a fixed size
struct HeadlessSurface {
    size: Size,
}

impl PreviewSurface for HeadlessSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn display_rotation(&self) -> Rotation {
        Rotation::Deg0
    }

    fn set_transform(&self, matrix: Matrix) {
        debug!(matrix = ?matrix.values(), "Preview transform");
    }
}

enum Event {
    Active,
    Picture(DynamicImage),
    Recorded(PathBuf),
    Failed(CameraError),
}

fn build_camera(settings: &Settings) -> Result<Camera, CameraError> {
    CameraBuilder::from_settings(Arc::new(SimulatedPlatform::phone()), settings).build()
}

fn select_camera(
    camera: &Camera,
    index: usize,
) -> Result<CameraDescriptor, Box<dyn std::error::Error>> {
    let cameras = camera.available_cameras();
    if cameras.is_empty() {
        return Err("No cameras found".into());
    }
    cameras.get(index).cloned().ok_or_else(|| {
        format!(
            "Camera index {} out of range (0-{})",
            index,
            cameras.len() - 1
        )
        .into()
    })
}

fn wait_for(events: &Receiver<Event>) -> Result<Event, Box<dyn std::error::Error>> {
    match events.recv_timeout(EVENT_TIMEOUT)? {
        Event::Failed(error) => Err(error.into()),
        event => Ok(event),
    }
}

/// Open `descriptor` and wait until the preview is streaming
fn open_and_wait(
    camera: &Camera,
    descriptor: &CameraDescriptor,
    tx: &Sender<Event>,
    events: &Receiver<Event>,
) -> Result<(), Box<dyn std::error::Error>> {
    let on_active = tx.clone();
    let on_error = tx.clone();
    camera.open(
        Arc::new(HeadlessSurface {
            size: Size::new(1080, 1920),
        }),
        descriptor,
        OpenCallbacks::default()
            .on_active(move || {
                let _ = on_active.send(Event::Active);
            })
            .on_error(move |e| {
                let _ = on_error.send(Event::Failed(e));
            }),
    )?;
    match wait_for(events)? {
        Event::Active => Ok(()),
        _ => Err("unexpected camera event while opening".into()),
    }
}

/// List all available cameras
pub fn list_cameras(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let camera = build_camera(settings)?;
    let cameras = camera.available_cameras();
    println!("{}", serde_json::to_string_pretty(&cameras)?);
    Ok(())
}

/// Take a photo using the specified camera
pub fn take_photo(
    settings: &Settings,
    camera_index: usize,
    output: Option<PathBuf>,
    rotation: Option<i32>,
    zoom: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let camera = build_camera(settings)?;
    let descriptor = select_camera(&camera, camera_index)?;
    println!("Using camera: {}", descriptor);

    let output_path = if let Some(path) = output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        path
    } else {
        let dir = get_default_photo_dir();
        std::fs::create_dir_all(&dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        dir.join(format!("photo_{}.jpg", timestamp))
    };

    let (tx, events) = mpsc::channel();
    open_and_wait(&camera, &descriptor, &tx, &events)?;

    if let Some(degrees) = rotation {
        camera.set_rotation_override(degrees)?;
    }
    if let Some(level) = zoom {
        if let Some(config) = camera.current_config() {
            let level = config.set_zoom_level(level)?;
            println!("Zoom level: {}", level);
        }
    }

    println!("Capturing...");
    let on_taken = tx.clone();
    let on_error = tx.clone();
    camera.take_picture(
        PictureCallbacks::default()
            .on_shutter(|| println!("Shutter"))
            .on_taken(move |image| {
                let _ = on_taken.send(Event::Picture(image));
            })
            .on_error(move |e| {
                let _ = on_error.send(Event::Failed(e));
            }),
    )?;

    let image = match wait_for(&events)? {
        Event::Picture(image) => image,
        _ => return Err("unexpected camera event while capturing".into()),
    };
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(image.to_rgb8()).save(&output_path)?;
    println!(
        "Photo saved: {} ({}x{})",
        output_path.display(),
        image.width(),
        image.height()
    );

    camera.release_and_wait();
    Ok(())
}

/// Record a video using the specified camera
pub fn record_video(
    settings: &Settings,
    camera_index: usize,
    duration: u64,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let camera = build_camera(settings)?;
    let descriptor = select_camera(&camera, camera_index)?;
    println!("Using camera: {}", descriptor);

    let output_path = if let Some(path) = output {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        path
    } else {
        let dir = get_default_video_dir();
        std::fs::create_dir_all(&dir)?;
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        dir.join(format!("video_{}.rec", timestamp))
    };

    let (tx, events) = mpsc::channel();
    open_and_wait(&camera, &descriptor, &tx, &events)?;

    if let Some(config) = camera.current_config() {
        println!(
            "Video: {} @ {} fps, {}",
            config.video_size()?,
            config.video_frame_rate()?,
            camhal::constants::format_bitrate(config.video_bitrate_kbps()?)
        );
    }
    println!("Output: {}", output_path.display());
    println!("Duration: {} seconds", duration);

    let on_recorded = tx.clone();
    let on_error = tx.clone();
    camera.start_recording(
        output_path,
        RecordingCallbacks::default()
            .on_recorded(move |path| {
                let _ = on_recorded.send(Event::Recorded(path));
            })
            .on_error(move |e| {
                let _ = on_error.send(Event::Failed(e));
            }),
    )?;

    // Set up Ctrl+C handler
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!();
    println!("Recording... (press Ctrl+C to stop early)");
    let start = Instant::now();
    let target_duration = Duration::from_secs(duration);

    while start.elapsed() < target_duration {
        if stop_flag.load(Ordering::SeqCst) {
            println!();
            println!("Stopping early...");
            break;
        }

        // Print progress
        let elapsed = start.elapsed().as_secs();
        print!("\rRecording: {:02}:{:02}", elapsed / 60, elapsed % 60);
        std::io::Write::flush(&mut std::io::stdout())?;

        std::thread::sleep(Duration::from_millis(100));
    }
    println!();

    camera.stop_recording();
    match wait_for(&events)? {
        Event::Recorded(path) => println!("Video saved: {}", path.display()),
        _ => return Err("unexpected camera event while recording".into()),
    }

    camera.release_and_wait();
    Ok(())
}

/// Print delta, scale factors and matrix for a preview geometry
pub fn print_transform(geometry: &PreviewGeometry) -> Result<(), Box<dyn std::error::Error>> {
    let report = serde_json::json!({
        "geometry": geometry,
        "delta": geometry.delta().degrees(),
        "scale_factors": geometry.scale_factors(),
        "matrix": geometry.transform(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Print the preview and driver focus regions for a touch
pub fn print_focus(
    geometry: &PreviewGeometry,
    x: f32,
    y: f32,
    active_array: Option<Size>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(region) = geometry.focus_region(x, y) else {
        return Err(CameraError::InvalidCoordinates.into());
    };
    let space = match active_array {
        Some(size) => DriverCoordinateSpace::ActiveArray(Rect::from_size(size)),
        None => DriverCoordinateSpace::Normalized,
    };
    let area = map_focus_region_to_driver_space(region, geometry.preview, space)
        .ok_or(CameraError::InvalidCoordinates)?;
    let report = serde_json::json!({
        "touch": [x, y],
        "preview_region": region,
        "driver_space": space,
        "driver_area": area,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Get default photo directory
fn get_default_photo_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}

/// Get default video directory
fn get_default_video_dir() -> PathBuf {
    dirs::video_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(DEFAULT_SAVE_FOLDER)
}
