// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the camera abstraction layer
//!
//! Two layers of errors exist:
//! - [`DeviceFault`]: what a device API implementation reports
//! - [`CameraError`]: what callers of the facade and the config model see
//!
//! Backends translate faults into camera errors at their boundary so the
//! caller-facing taxonomy stays the same regardless of which device API is in use.

use std::fmt;

/// Result type alias using CameraError
pub type HalResult<T> = Result<T, CameraError>;

/// Caller-facing camera errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    /// The caller has no access to the camera device
    PermissionDenied,
    /// Device is in use, disconnected, closed, or not in a usable state
    DeviceUnavailable(String),
    /// Requested value is not in the device-advertised capability set
    UnsupportedFeature(String),
    /// A capture or recording is already running
    OperationInProgress,
    /// Focus or geometry input out of bounds
    InvalidCoordinates,
    /// Still capture failed
    CaptureFailed(String),
    /// Video recording failed to start or finalize
    RecordingFailed(String),
    /// Device open handshake failed
    HandshakeFailed(String),
}

/// Faults reported by device API implementations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceFault {
    /// Camera is held by another client
    InUse,
    /// Camera vanished while in use
    Disconnected,
    /// Operation did not complete in time
    Timeout,
    /// Driver or hardware failure
    Hardware(String),
}

impl CameraError {
    /// Shorthand for an unsupported value of a named feature
    pub fn unsupported(feature: &str, value: impl fmt::Debug) -> Self {
        CameraError::UnsupportedFeature(format!("{} {:?}", feature, value))
    }

    /// Error returned by every config operation after the session closed
    pub fn config_closed() -> Self {
        CameraError::DeviceUnavailable("configuration belongs to a closed session".to_string())
    }

    /// Map a device fault raised during the open handshake
    pub fn from_handshake(fault: DeviceFault) -> Self {
        match fault {
            DeviceFault::InUse => CameraError::DeviceUnavailable("camera in use".to_string()),
            DeviceFault::Disconnected => {
                CameraError::DeviceUnavailable("camera disconnected".to_string())
            }
            other => CameraError::HandshakeFailed(other.to_string()),
        }
    }

    /// Map a device fault raised while capturing a still
    pub fn from_capture(fault: DeviceFault) -> Self {
        CameraError::CaptureFailed(fault.to_string())
    }

    /// Map a device fault raised while starting or stopping a recording
    pub fn from_recording(fault: DeviceFault) -> Self {
        CameraError::RecordingFailed(fault.to_string())
    }
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "Camera permission denied"),
            CameraError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            CameraError::UnsupportedFeature(msg) => write!(f, "Unsupported feature: {}", msg),
            CameraError::OperationInProgress => {
                write!(f, "Another capture or recording is in progress")
            }
            CameraError::InvalidCoordinates => write!(f, "Coordinates outside the preview"),
            CameraError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CameraError::RecordingFailed(msg) => write!(f, "Recording failed: {}", msg),
            CameraError::HandshakeFailed(msg) => write!(f, "Camera handshake failed: {}", msg),
        }
    }
}

impl fmt::Display for DeviceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceFault::InUse => write!(f, "device in use"),
            DeviceFault::Disconnected => write!(f, "device disconnected"),
            DeviceFault::Timeout => write!(f, "device timed out"),
            DeviceFault::Hardware(msg) => write!(f, "hardware error: {}", msg),
        }
    }
}

impl std::error::Error for CameraError {}
impl std::error::Error for DeviceFault {}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::CaptureFailed(format!("image decode: {}", err))
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        CameraError::RecordingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_mapping() {
        assert!(matches!(
            CameraError::from_handshake(DeviceFault::InUse),
            CameraError::DeviceUnavailable(_)
        ));
        assert!(matches!(
            CameraError::from_handshake(DeviceFault::Timeout),
            CameraError::HandshakeFailed(_)
        ));
    }

    #[test]
    fn test_display_is_not_empty() {
        let errors = [
            CameraError::PermissionDenied,
            CameraError::OperationInProgress,
            CameraError::InvalidCoordinates,
            CameraError::unsupported("flash mode", "Torch"),
        ];
        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }
}
