// SPDX-License-Identifier: GPL-3.0-only

//! Value types shared by the geometry functions

use serde::{Deserialize, Serialize};

/// Right-angle rotation in degrees (clockwise)
///
/// Used for both the fixed sensor mounting orientation and the current display
/// rotation. Camera sensors on phones are typically mounted at 90° or 270°
/// relative to the natural orientation of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation
    #[default]
    Deg0,
    /// 90 degrees clockwise
    Deg90,
    /// 180 degrees (upside down)
    Deg180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Deg270,
}

impl Rotation {
    /// All rotations in ascending order
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Create a rotation from any degree value, snapped to the nearest right angle.
    pub fn from_degrees_int(degrees: i32) -> Self {
        match ((degrees.rem_euclid(360) + 45) / 90) % 4 {
            1 => Rotation::Deg90,
            2 => Rotation::Deg180,
            3 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Create a rotation from an exact right angle; other values are rejected.
    pub fn try_from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Rotation::Deg0),
            90 => Some(Rotation::Deg90),
            180 => Some(Rotation::Deg180),
            270 => Some(Rotation::Deg270),
            _ => None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Check if rotation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }

    /// Rotation that undoes this one
    pub fn inverse(&self) -> Self {
        Self::from_degrees_int(360 - self.degrees() as i32)
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Direction a camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// Selfie camera; its preview is mirrored by the system
    Front,
    /// Main camera
    #[default]
    Back,
    /// USB or otherwise detachable camera, handled like a back camera
    External,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
            Facing::External => write!(f, "external"),
        }
    }
}

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Sentinel used when no valid size exists yet
    pub const UNKNOWN: Size = Size {
        width: 0,
        height: 0,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True for the sentinel and for any size with a zero side
    pub fn is_unknown(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height, 0.0 when unknown
    pub fn aspect_ratio(&self) -> f32 {
        if self.is_unknown() {
            0.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Exact aspect ratio comparison (cross multiplication, no float rounding)
    pub fn same_aspect_ratio(&self, other: &Size) -> bool {
        if self.is_unknown() || other.is_unknown() {
            return false;
        }
        self.width as u64 * other.height as u64 == other.width as u64 * self.height as u64
    }

    /// Same size with width and height exchanged
    pub fn swapped(&self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Size {
    type Err = String;

    /// Parse "WIDTHxHEIGHT"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
        let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
        Ok(Size::new(width, height))
    }
}

/// Integer rectangle with exclusive right and bottom edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Rectangle at the origin covering `size`
    pub fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.width as i32, size.height as i32)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Check whether `other` lies entirely inside this rectangle
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.left >= self.left
            && other.top >= self.top
            && other.right <= self.right
            && other.bottom <= self.bottom
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// How the preview is fitted into the view
///
/// The `Auto*` variants additionally pick the preview size automatically so
/// that it matches the aspect ratio of the selected picture size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PreviewScale {
    /// No automatic scaling; the caller scales the view externally
    Manual,
    /// Letterbox, caller picks the preview size
    ManualFit,
    /// Crop to fill, caller picks the preview size
    ManualFill,
    /// Letterbox, preview size follows the picture size
    AutoFit,
    /// Crop to fill, preview size follows the picture size
    #[default]
    AutoFill,
}

impl PreviewScale {
    pub const ALL: [PreviewScale; 5] = [
        PreviewScale::Manual,
        PreviewScale::ManualFit,
        PreviewScale::ManualFill,
        PreviewScale::AutoFit,
        PreviewScale::AutoFill,
    ];

    pub fn is_fill(&self) -> bool {
        matches!(self, PreviewScale::ManualFill | PreviewScale::AutoFill)
    }

    pub fn is_fit(&self) -> bool {
        matches!(self, PreviewScale::ManualFit | PreviewScale::AutoFit)
    }

    /// Whether the preview size is derived from the picture size
    pub fn is_auto(&self) -> bool {
        matches!(self, PreviewScale::AutoFit | PreviewScale::AutoFill)
    }
}

/// Result of fitting a preview into a view
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScaleFactors {
    /// Ratio that stretches the preview horizontally to the view width
    pub scale_x: f32,
    /// Ratio that stretches the preview vertically to the view height
    pub scale_y: f32,
    /// Uniform scale chosen by the scale policy
    pub scale: f32,
}

impl ScaleFactors {
    /// Degenerate factors used when either size is unknown
    pub const ZERO: ScaleFactors = ScaleFactors {
        scale_x: 0.0,
        scale_y: 0.0,
        scale: 0.0,
    };

    pub fn is_degenerate(&self) -> bool {
        !(self.scale_x > 0.0 && self.scale_y > 0.0 && self.scale > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_snapping() {
        assert_eq!(Rotation::from_degrees_int(-90), Rotation::Deg270);
        assert_eq!(Rotation::from_degrees_int(450), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees_int(44), Rotation::Deg0);
        assert_eq!(Rotation::from_degrees_int(46), Rotation::Deg90);
        assert_eq!(Rotation::try_from_degrees(45), None);
    }

    #[test]
    fn test_rotation_inverse() {
        for rotation in Rotation::ALL {
            let sum = rotation.degrees() + rotation.inverse().degrees();
            assert_eq!(sum % 360, 0);
        }
    }

    #[test]
    fn test_size_aspect_ratio() {
        assert!(Size::new(1920, 1080).same_aspect_ratio(&Size::new(1280, 720)));
        assert!(!Size::new(1920, 1080).same_aspect_ratio(&Size::new(640, 480)));
        assert!(!Size::UNKNOWN.same_aspect_ratio(&Size::UNKNOWN));
        assert_eq!(Size::UNKNOWN.aspect_ratio(), 0.0);
    }

    #[test]
    fn test_size_parse() {
        assert_eq!("1920x1080".parse::<Size>(), Ok(Size::new(1920, 1080)));
        assert!("1920".parse::<Size>().is_err());
    }

    #[test]
    fn test_rect_contains() {
        let outer = Rect::new(0, 0, 100, 100);
        assert!(outer.contains_rect(&Rect::new(10, 10, 100, 50)));
        assert!(!outer.contains_rect(&Rect::new(-1, 10, 50, 50)));
    }
}
