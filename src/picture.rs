// SPDX-License-Identifier: GPL-3.0-only

//! Still picture decoding and post-processing

use crate::errors::HalResult;
use crate::geometry::{Facing, Rotation};
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;

/// What the post-processing hook knows about a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PictureContext {
    /// Clockwise rotation that makes the picture upright
    pub rotation: Rotation,
    pub facing: Facing,
    /// Mirror setting of the session at capture time
    pub mirror: bool,
}

/// Post-processing applied to every decoded still before delivery
pub type PictureHook = Arc<dyn Fn(DynamicImage, &PictureContext) -> DynamicImage + Send + Sync>;

/// Decode JPEG bytes from the device into an RGBA buffer
pub fn decode_jpeg(bytes: &[u8]) -> HalResult<DynamicImage> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)?;
    Ok(DynamicImage::ImageRgba8(image.to_rgba8()))
}

/// Rotate upright, then flip front-facing or mirrored captures
pub fn orient_picture(image: DynamicImage, context: &PictureContext) -> DynamicImage {
    let upright = match context.rotation {
        Rotation::Deg0 => image,
        Rotation::Deg90 => image.rotate90(),
        Rotation::Deg180 => image.rotate180(),
        Rotation::Deg270 => image.rotate270(),
    };
    if context.facing == Facing::Front || context.mirror {
        upright.fliph()
    } else {
        upright
    }
}

pub fn default_picture_hook() -> PictureHook {
    Arc::new(orient_picture)
}
