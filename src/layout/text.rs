//! Text rasterization for ad elements.
//!
//! Two backends produce the same [`TextMask`] (a coverage buffer):
//!
//! - **Bitmap**: the Spleen 12×24 font, scaled with nearest-neighbor sampling.
//!   Always available, no font files needed.
//! - **Ttf**: any TrueType/OpenType font loaded at runtime, rendered with
//!   anti-aliasing through ab_glyph.

use ab_glyph::{Font, FontArc, ScaleFont};
use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};
use std::path::Path;

use crate::error::{AdForgeError, Result};
use crate::shader::{alpha_over, with_coverage};

const BITMAP_CELL_W: usize = 12;
const BITMAP_CELL_H: usize = 24;

/// Font used for all text on the ad.
#[derive(Clone, Default)]
pub enum TextFont {
    #[default]
    Bitmap,
    Ttf(FontArc),
}

impl std::fmt::Debug for TextFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextFont::Bitmap => f.write_str("TextFont::Bitmap"),
            TextFont::Ttf(_) => f.write_str("TextFont::Ttf"),
        }
    }
}

impl TextFont {
    /// Load a TTF/OTF font file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let font = FontArc::try_from_vec(bytes).map_err(|e| {
            AdForgeError::Image(format!("Invalid font file {}: {}", path.display(), e))
        })?;
        Ok(TextFont::Ttf(font))
    }

    /// Width in pixels of `text` at `pixel_height`, without rasterizing.
    pub fn measure(&self, text: &str, pixel_height: f32) -> usize {
        match self {
            TextFont::Bitmap => {
                let scale = pixel_height / BITMAP_CELL_H as f32;
                (text.chars().count() as f32 * BITMAP_CELL_W as f32 * scale).ceil() as usize
            }
            TextFont::Ttf(font) => {
                let scaled = font.as_scaled(pixel_height);
                let width: f32 = text.chars().map(|c| scaled.h_advance(font.glyph_id(c))).sum();
                width.ceil() as usize
            }
        }
    }

    /// Rasterize a single line of text.
    pub fn render(&self, text: &str, pixel_height: f32) -> TextMask {
        self.render_within(text, pixel_height, usize::MAX, usize::MAX)
    }

    /// Rasterize a single line, keeping only the top-left
    /// `max_width × max_height` pixels of the mask.
    pub fn render_within(&self, text: &str, pixel_height: f32, max_width: usize, max_height: usize) -> TextMask {
        let pixel_height = pixel_height.max(1.0);
        let clip = (max_width.max(1), max_height.max(1));
        match self {
            TextFont::Bitmap => render_bitmap(text, pixel_height, clip),
            TextFont::Ttf(font) => render_ttf(font, text, pixel_height, clip),
        }
    }

    /// Greedy word wrap so no line exceeds `max_width` pixels.
    ///
    /// A single word wider than `max_width` gets a line of its own.
    pub fn wrap(&self, text: &str, pixel_height: f32, max_width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if self.measure(&candidate, pixel_height) <= max_width || current.is_empty() {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = word.to_string();
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

/// Rendered text as a coverage buffer.
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    /// Coverage values: 0.0 = empty, 1.0 = fully inked.
    pub data: Vec<f32>,
}

impl TextMask {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    /// Composite the mask onto `layer` with its top-left corner at (x, y).
    pub fn draw(&self, layer: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
        let (lw, lh) = (layer.width() as i64, layer.height() as i64);
        for my in 0..self.height {
            let py = y + my as i64;
            if py < 0 || py >= lh {
                continue;
            }
            for mx in 0..self.width {
                let px = x + mx as i64;
                if px < 0 || px >= lw {
                    continue;
                }
                let coverage = self.data[my * self.width + mx];
                if coverage <= 0.0 {
                    continue;
                }
                let dst = layer.get_pixel_mut(px as u32, py as u32);
                *dst = alpha_over(*dst, with_coverage(color, coverage));
            }
        }
    }
}

fn render_bitmap(text: &str, pixel_height: f32, clip: (usize, usize)) -> TextMask {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return TextMask::empty();
    }

    // Rasterize at native 12×24 first
    let native_w = chars.len() * BITMAP_CELL_W;
    let mut native = vec![false; native_w * BITMAP_CELL_H];

    let mut spleen = match PSF2Font::new(FONT_12X24) {
        Ok(font) => font,
        Err(_) => return TextMask::empty(),
    };

    for (i, ch) in chars.iter().enumerate() {
        let utf8 = ch.to_string();
        let origin = i * BITMAP_CELL_W;
        match spleen.glyph_for_utf8(utf8.as_bytes()) {
            Some(glyph) => {
                for (row_y, row) in glyph.enumerate() {
                    for (col_x, on) in row.enumerate() {
                        if row_y < BITMAP_CELL_H && col_x < BITMAP_CELL_W && on {
                            native[row_y * native_w + origin + col_x] = true;
                        }
                    }
                }
            }
            None if !ch.is_whitespace() => draw_box(&mut native, native_w, origin),
            None => {}
        }
    }

    // Nearest-neighbor scale to the requested height
    let scale = pixel_height / BITMAP_CELL_H as f32;
    let width = ((native_w as f32 * scale).ceil() as usize).clamp(1, clip.0);
    let height = (pixel_height.ceil() as usize).clamp(1, clip.1);
    let mut data = vec![0.0f32; width * height];

    for y in 0..height {
        let sy = ((y as f32 / scale) as usize).min(BITMAP_CELL_H - 1);
        for x in 0..width {
            let sx = ((x as f32 / scale) as usize).min(native_w - 1);
            if native[sy * native_w + sx] {
                data[y * width + x] = 1.0;
            }
        }
    }

    TextMask {
        width,
        height,
        data,
    }
}

/// Outline box for glyphs missing from the font.
fn draw_box(native: &mut [bool], native_w: usize, origin: usize) {
    for y in 4..BITMAP_CELL_H - 2 {
        for x in 1..BITMAP_CELL_W - 1 {
            let edge = y == 4 || y == BITMAP_CELL_H - 3 || x == 1 || x == BITMAP_CELL_W - 2;
            if edge {
                native[y * native_w + origin + x] = true;
            }
        }
    }
}

fn render_ttf(font: &FontArc, text: &str, pixel_height: f32, clip: (usize, usize)) -> TextMask {
    let scaled = font.as_scaled(pixel_height);

    let mut glyphs = Vec::new();
    let mut caret_x = 0.0f32;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        glyphs.push((glyph_id, caret_x));
        caret_x += scaled.h_advance(glyph_id);
    }

    let width = (caret_x.ceil() as usize).clamp(1, clip.0);
    let ascent = scaled.ascent();
    let height = ((ascent - scaled.descent()).ceil() as usize).clamp(1, clip.1);
    let mut data = vec![0.0f32; width * height];

    for &(glyph_id, glyph_x) in &glyphs {
        let glyph = glyph_id.with_scale_and_position(pixel_height, ab_glyph::point(glyph_x, ascent));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|px, py, coverage| {
                let x = px as i32 + bounds.min.x as i32;
                let y = py as i32 + bounds.min.y as i32;
                if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                    let idx = y as usize * width + x as usize;
                    data[idx] = (data[idx] + coverage).min(1.0);
                }
            });
        }
    }

    TextMask {
        width,
        height,
        data,
    }
}
