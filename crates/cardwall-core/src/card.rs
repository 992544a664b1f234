//! Card rasterization: one RGBA raster per text entry, drawn as a solid
//! background, a procedural line/dot pattern, a word-wrapped centered text
//! block with a soft glow, and a border stroke.
//!
//! Glyph metrics and bitmaps come from `fontdue`; everything is composited
//! on the CPU into an `image::RgbaImage` that the atlas packer consumes.

use std::ops::Range;

use image::{imageops, GrayImage, Rgba, RgbaImage};
use rand::prelude::*;
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::{DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH};

#[derive(Debug, Error)]
pub enum CardError {
    #[error("font parse error: {0}")]
    Font(&'static str),
    #[error("card dimensions must be non-zero, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("wrapped text needs {needed}px of column height but only {available}px fit")]
    TextOverflow { needed: u32, available: u32 },
}

/// One rasterized card. Produced once, consumed once by the packer.
#[derive(Clone, Debug)]
pub struct CardImage {
    pub pixels: RgbaImage,
}

impl CardImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Tuning for the procedural background pattern. All ranges are sampled
/// uniformly from the card's rng.
#[derive(Clone, Debug)]
pub struct PatternStyle {
    pub line_count: Range<u32>,
    pub line_length: Range<f32>,
    pub line_thickness: u32,
    pub elbow_probability: f64,
    pub elbow_length: Range<f32>,
    pub dot_count: Range<u32>,
    pub dot_radius: Range<f32>,
    pub line_color: Rgba<u8>,
    pub dot_color: Rgba<u8>,
}

impl Default for PatternStyle {
    fn default() -> Self {
        Self {
            line_count: 30..50,
            line_length: 20.0..80.0,
            line_thickness: 2,
            elbow_probability: 0.3,
            elbow_length: 20.0..60.0,
            dot_count: 5..15,
            dot_radius: 1.0..3.0,
            line_color: Rgba([60, 70, 96, 255]),
            dot_color: Rgba([96, 110, 148, 255]),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CardStyle {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub border: Rgba<u8>,
    pub border_width: u32,
    pub text_color: Rgba<u8>,
    pub glow_color: Rgba<u8>,
    pub glow_radius: f32,
    pub font_size: f32,
    pub line_gap: f32,
    pub padding: f32,
    pub pattern: PatternStyle,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            width: DEFAULT_CARD_WIDTH,
            height: DEFAULT_CARD_HEIGHT,
            background: Rgba([10, 12, 22, 255]),
            border: Rgba([130, 140, 170, 255]),
            border_width: 3,
            text_color: Rgba([235, 238, 245, 255]),
            glow_color: Rgba([90, 140, 255, 160]),
            glow_radius: 6.0,
            font_size: 34.0,
            line_gap: 10.0,
            padding: 36.0,
            pattern: PatternStyle::default(),
        }
    }
}

/// Greedy word wrap: accumulate space-separated words into a line while the
/// measured width stays within `max_width`; on overflow, commit the line and
/// start a new one with the overflowing word. A single word wider than
/// `max_width` still gets its own line.
pub fn wrap_lines(
    text: &str,
    max_width: f32,
    measure: impl Fn(&str) -> f32,
) -> SmallVec<[String; 8]> {
    let mut lines: SmallVec<[String; 8]> = SmallVec::new();
    let mut line = String::new();
    for word in text.split(' ').filter(|w| !w.is_empty()) {
        if line.is_empty() {
            line = word.to_string();
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::take(&mut line));
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Top edge of a vertically centered block of `line_count` lines.
pub fn text_block_top(line_count: usize, font_size: f32, line_gap: f32, card_height: f32) -> f32 {
    let line_height = font_size + line_gap;
    let total = line_count.saturating_sub(1) as f32 * line_height + font_size;
    card_height / 2.0 - total / 2.0
}

/// Draw an axis-aligned segment of `thickness` pixels across. `len` may be
/// negative; the segment is clipped to the image.
pub fn fill_axis_line(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    len: i32,
    horizontal: bool,
    thickness: u32,
    color: Rgba<u8>,
) {
    let (w, h) = img.dimensions();
    let t = thickness.max(1) as i32;
    let (x0, x1, y0, y1) = if horizontal {
        let (a, b) = if len >= 0 { (x, x + len) } else { (x + len, x) };
        (a, b, y, y + t)
    } else {
        let (a, b) = if len >= 0 { (y, y + len) } else { (y + len, y) };
        (x, x + t, a, b)
    };
    for py in y0.max(0)..y1.min(h as i32) {
        for px in x0.max(0)..x1.min(w as i32) {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Fill a dot centered at (`cx`, `cy`), clipped to the image.
pub fn fill_dot(img: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    let r2 = radius * radius;
    let y0 = (cy - radius).floor() as i32;
    let y1 = (cy + radius).ceil() as i32;
    let x0 = (cx - radius).floor() as i32;
    let x1 = (cx + radius).ceil() as i32;
    for py in y0.max(0)..=y1.min(h as i32 - 1) {
        for px in x0.max(0)..=x1.min(w as i32 - 1) {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

/// Stroke a rectangular border of `width` pixels along the image edge.
pub fn stroke_border(img: &mut RgbaImage, width: u32, color: Rgba<u8>) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let bw = width.min(w / 2).min(h / 2).max(1);
    for y in 0..h {
        for x in 0..w {
            if x < bw || y < bw || x >= w - bw || y >= h - bw {
                img.put_pixel(x, y, color);
            }
        }
    }
}

/// Procedural decoration: `line_count` axis-aligned segments, some with a
/// perpendicular elbow off the endpoint, followed by `dot_count` filled dots.
pub fn draw_pattern(img: &mut RgbaImage, style: &PatternStyle, rng: &mut StdRng) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let lines = rng.gen_range(style.line_count.clone());
    for _ in 0..lines {
        let horizontal = rng.gen_bool(0.5);
        let len = rng.gen_range(style.line_length.clone()).round() as i32;
        let x = rng.gen_range(0..w) as i32;
        let y = rng.gen_range(0..h) as i32;
        fill_axis_line(img, x, y, len, horizontal, style.line_thickness, style.line_color);
        if rng.gen_bool(style.elbow_probability) {
            let elbow = rng.gen_range(style.elbow_length.clone()).round() as i32;
            let sign = if rng.gen_bool(0.5) { 1 } else { -1 };
            let (ex, ey) = if horizontal { (x + len, y) } else { (x, y + len) };
            fill_axis_line(
                img,
                ex,
                ey,
                sign * elbow,
                !horizontal,
                style.line_thickness,
                style.line_color,
            );
        }
    }
    let dots = rng.gen_range(style.dot_count.clone());
    for _ in 0..dots {
        let cx = rng.gen_range(0.0..w as f32);
        let cy = rng.gen_range(0.0..h as f32);
        let radius = rng.gen_range(style.dot_radius.clone());
        fill_dot(img, cx, cy, radius, style.dot_color);
    }
}

// Max-composite a glyph coverage bitmap into the text layer at (gx, gy).
fn blit_coverage(layer: &mut GrayImage, bitmap: &[u8], bw: usize, bh: usize, gx: i32, gy: i32) {
    let (w, h) = layer.dimensions();
    for by in 0..bh {
        let py = gy + by as i32;
        if py < 0 || py >= h as i32 {
            continue;
        }
        for bx in 0..bw {
            let px = gx + bx as i32;
            if px < 0 || px >= w as i32 {
                continue;
            }
            let v = bitmap[by * bw + bx];
            let dst = layer.get_pixel_mut(px as u32, py as u32);
            dst.0[0] = dst.0[0].max(v);
        }
    }
}

// Alpha-blend `color` over the image wherever `layer` has coverage.
fn composite_layer(img: &mut RgbaImage, layer: &GrayImage, color: Rgba<u8>) {
    for (x, y, p) in layer.enumerate_pixels() {
        let cov = p.0[0] as u32;
        if cov == 0 {
            continue;
        }
        let a = color.0[3] as u32 * cov / 255;
        let dst = img.get_pixel_mut(x, y);
        for ch in 0..3 {
            let s = color.0[ch] as u32;
            let d = dst.0[ch] as u32;
            dst.0[ch] = ((s * a + d * (255 - a)) / 255) as u8;
        }
        dst.0[3] = 255;
    }
}

/// Renders card rasters from text entries. Owns the parsed font; the wrap
/// and centering math lives in the free functions above so it stays
/// testable without font data.
pub struct CardPainter {
    font: fontdue::Font,
}

impl CardPainter {
    pub fn from_font_bytes(bytes: &[u8]) -> Result<Self, CardError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(CardError::Font)?;
        Ok(Self { font })
    }

    /// Advance-sum width of `text` at `px` pixels.
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().map(|c| self.font.metrics(c, px).advance_width).sum()
    }

    pub fn generate(
        &self,
        text: &str,
        style: &CardStyle,
        rng: &mut StdRng,
    ) -> Result<CardImage, CardError> {
        if style.width == 0 || style.height == 0 {
            return Err(CardError::InvalidDimensions { width: style.width, height: style.height });
        }
        let mut img = RgbaImage::from_pixel(style.width, style.height, style.background);
        draw_pattern(&mut img, &style.pattern, rng);
        if !text.trim().is_empty() {
            self.draw_text_block(&mut img, text, style)?;
        }
        stroke_border(&mut img, style.border_width, style.border);
        Ok(CardImage { pixels: img })
    }

    fn draw_text_block(
        &self,
        img: &mut RgbaImage,
        text: &str,
        style: &CardStyle,
    ) -> Result<(), CardError> {
        let max_width = style.width as f32 - style.padding * 2.0;
        let lines = wrap_lines(text, max_width, |s| self.measure(s, style.font_size));
        if lines.is_empty() {
            return Ok(());
        }

        let line_height = style.font_size + style.line_gap;
        let total = (lines.len() - 1) as f32 * line_height + style.font_size;
        let available = style.height as f32 - style.padding * 2.0;
        if total > available {
            return Err(CardError::TextOverflow {
                needed: total.ceil() as u32,
                available: available.max(0.0) as u32,
            });
        }

        let top = text_block_top(lines.len(), style.font_size, style.line_gap, style.height as f32);
        let ascent = self
            .font
            .horizontal_line_metrics(style.font_size)
            .map(|m| m.ascent)
            .unwrap_or(style.font_size * 0.8);

        let mut layer = GrayImage::new(style.width, style.height);
        for (i, line) in lines.iter().enumerate() {
            let line_width = self.measure(line, style.font_size);
            let mut pen_x = (style.width as f32 - line_width) / 2.0;
            let baseline = top + i as f32 * line_height + ascent;
            for c in line.chars() {
                let (m, bitmap) = self.font.rasterize(c, style.font_size);
                if m.width > 0 && m.height > 0 {
                    let gx = (pen_x + m.xmin as f32).round() as i32;
                    let gy = (baseline - (m.height as i32 + m.ymin) as f32).round() as i32;
                    blit_coverage(&mut layer, &bitmap, m.width, m.height, gx, gy);
                }
                pen_x += m.advance_width;
            }
        }

        // glow pass first, sharp text on top
        let glow = imageops::fast_blur(&layer, style.glow_radius);
        composite_layer(img, &glow, style.glow_color);
        composite_layer(img, &layer, style.text_color);
        Ok(())
    }
}
