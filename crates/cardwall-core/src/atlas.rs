//! Vertical-stack atlas packing.
//!
//! Cards are stacked top-to-bottom in input order with no gaps; each entry
//! records its normalized UV rectangle within the combined raster. UV y runs
//! upward: `y_start` is the entry's top edge, `y_end` its bottom edge.

use image::{imageops, RgbaImage};
use thiserror::Error;

use crate::card::CardImage;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("cannot pack an empty image sequence")]
    EmptyInput,
}

/// Normalized texture-space sub-rectangle selecting one packed image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UvRect {
    pub x_start: f32,
    pub x_end: f32,
    pub y_start: f32,
    pub y_end: f32,
}

#[derive(Clone, Debug)]
pub struct AtlasEntry {
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: f32,
    pub uv: UvRect,
}

/// Packed atlas raster plus its entry table. Immutable once built.
#[derive(Clone, Debug)]
pub struct Atlas {
    pub width: u32,
    pub height: u32,
    pub entries: Vec<AtlasEntry>,
    pub pixels: RgbaImage,
}

/// Stack `images` vertically in input order. Atlas width is the widest
/// input, height the sum of input heights.
pub fn pack(images: &[CardImage]) -> Result<Atlas, AtlasError> {
    if images.is_empty() {
        return Err(AtlasError::EmptyInput);
    }
    let width = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let height: u32 = images.iter().map(|i| i.height()).sum();
    if width == 0 || height == 0 {
        // zero-area inputs would make the UV math divide by zero
        return Err(AtlasError::EmptyInput);
    }

    let mut pixels = RgbaImage::new(width, height);
    let mut entries = Vec::with_capacity(images.len());
    let mut y_cursor = 0u32;
    for img in images {
        imageops::replace(&mut pixels, &img.pixels, 0, y_cursor as i64);
        entries.push(AtlasEntry {
            width: img.width(),
            height: img.height(),
            aspect_ratio: img.width() as f32 / img.height().max(1) as f32,
            uv: UvRect {
                x_start: 0.0,
                x_end: img.width() as f32 / width as f32,
                y_start: 1.0 - y_cursor as f32 / height as f32,
                y_end: 1.0 - (y_cursor + img.height()) as f32 / height as f32,
            },
        });
        y_cursor += img.height();
    }

    Ok(Atlas { width, height, entries, pixels })
}

/// Low-detail variant for distant cards: same entry table, large-radius
/// blur over the packed raster.
pub fn derive_blurred(atlas: &Atlas, sigma: f32) -> Atlas {
    Atlas {
        width: atlas.width,
        height: atlas.height,
        entries: atlas.entries.clone(),
        pixels: imageops::fast_blur(&atlas.pixels, sigma),
    }
}
