// SPDX-License-Identifier: GPL-3.0-only

//! Tap-to-focus keeps a single reset timer per camera
//!
//! Kept in its own test binary: it counts the threads of the whole process.

use camhal::backends::camera::{BackendState, OpenCallbacks, PreviewSurface};
use camhal::backends::simulated::SimulatedPlatform;
use camhal::camera::Camera;
use camhal::dispatch::DeliveryMode;
use camhal::geometry::{Facing, Matrix, Rotation, Size};
use std::sync::Arc;
use std::time::Duration;

struct PortraitSurface;

impl PreviewSurface for PortraitSurface {
    fn size(&self) -> Size {
        Size::new(1080, 1920)
    }

    fn display_rotation(&self) -> Rotation {
        Rotation::Deg0
    }

    fn set_transform(&self, _matrix: Matrix) {}
}

/// Threads whose OS name starts with `prefix` (names are cut to 15 bytes)
#[cfg(target_os = "linux")]
fn live_threads(prefix: &str) -> usize {
    std::fs::read_dir("/proc/self/task")
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| {
                    std::fs::read_to_string(entry.path().join("comm"))
                        .map(|name| name.trim_end().starts_with(prefix))
                        .unwrap_or(false)
                })
                .count()
        })
        .unwrap_or(0)
}

/// Poll until `expected` threads match `prefix`; returns the last count.
/// New threads name themselves only once they run.
#[cfg(target_os = "linux")]
fn settled_threads(prefix: &str, expected: usize) -> usize {
    let mut count = live_threads(prefix);
    for _ in 0..50 {
        if count == expected {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
        count = live_threads(prefix);
    }
    count
}

#[cfg(target_os = "linux")]
#[test]
fn test_many_taps_share_one_reset_timer() {
    let platform = Arc::new(SimulatedPlatform::phone());
    let mut camera = Camera::builder(platform.clone())
        .delivery_mode(DeliveryMode::CallerThread)
        .reset_focus_delay(Duration::from_secs(7))
        .build()
        .unwrap();
    let mut queue = camera.take_callback_queue().unwrap();
    assert_eq!(settled_threads("camhal-focus", 1), 1);

    let back = camera.find_camera(Facing::Back).unwrap();
    camera
        .open(Arc::new(PortraitSurface), &back, OpenCallbacks::default())
        .unwrap();
    assert!(camera.wait_idle());
    queue.dispatch_pending();
    assert_eq!(camera.state(), BackendState::Active);

    for _ in 0..300 {
        assert!(camera.focus_at(540.0, 960.0));
    }
    assert!(camera.wait_idle());
    assert_eq!(settled_threads("camhal-focus", 1), 1);

    assert!(camera.release_and_wait());
    assert_eq!(settled_threads("camhal-focus", 1), 1);

    drop(queue);
    drop(camera);
    assert_eq!(settled_threads("camhal-focus", 0), 0);
}
