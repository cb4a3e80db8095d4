// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::errors::DeviceFault;
use crate::geometry::{Facing, Matrix, Rotation, Size};
use serde::{Deserialize, Serialize};

/// Result type for device-level operations
pub type BackendResult<T> = Result<T, DeviceFault>;

/// Which device API a backend drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendType {
    /// Synchronous API with enumerated zoom levels and a normalized focus space
    Legacy,
    /// Asynchronous, capability-queried API with crop regions
    Modern,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::Legacy => write!(f, "legacy"),
            BackendType::Modern => write!(f, "modern"),
        }
    }
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(BackendType::Legacy),
            "modern" => Ok(BackendType::Modern),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Hardware support tier reported by the modern API
///
/// A `Legacy` tier means the modern API is only a thin wrapper over the legacy
/// one on this device, so the legacy API is driven directly instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HardwareLevel {
    Legacy,
    Limited,
    Full,
    Level3,
}

/// Immutable identity of one physical camera
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CameraDescriptor {
    /// Identifier as reported by the device API
    pub id: String,
    /// Sensor mounting angle, fixed at discovery
    pub sensor_orientation: Rotation,
    pub facing: Facing,
    /// API this camera was enumerated from
    pub backend: BackendType,
    /// Position in the enumeration; the legacy API opens cameras by index
    pub index: usize,
}

impl std::fmt::Display for CameraDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} camera {} (sensor {}, {})",
            self.facing, self.id, self.sensor_orientation, self.backend
        )
    }
}

/// Lifecycle state of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendState {
    #[default]
    Closed,
    /// Open handshake in progress
    Initializing,
    /// Configuration applied, preview not streaming yet
    Ready,
    /// Preview streaming
    Active,
    /// Still capture in flight
    Capturing,
    /// Video recording in progress
    Recording,
}

impl BackendState {
    /// A configuration exists in these states
    pub fn has_config(&self) -> bool {
        matches!(
            self,
            BackendState::Ready
                | BackendState::Active
                | BackendState::Capturing
                | BackendState::Recording
        )
    }

    /// Preview frames are flowing in these states
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            BackendState::Active | BackendState::Capturing | BackendState::Recording
        )
    }
}

impl std::fmt::Display for BackendState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// View the preview is rendered into
///
/// The surface stretches the preview buffer to its full size; the transform
/// handed to [`set_transform`](PreviewSurface::set_transform) corrects that.
pub trait PreviewSurface: Send + Sync {
    /// Measured size; [`Size::UNKNOWN`] before the first layout
    fn size(&self) -> Size;

    /// Current rotation of the display the view is shown on
    fn display_rotation(&self) -> Rotation;

    /// Apply a new preview transform
    fn set_transform(&self, matrix: Matrix);
}

/// Encoder parameters handed to a device when recording starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingProfile {
    pub size: Size,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
    /// Rotation the player must apply to show the video upright
    pub orientation_hint: Rotation,
    pub stabilization: bool,
}
