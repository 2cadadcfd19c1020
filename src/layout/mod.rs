//! # Layout Renderer
//!
//! Draws a [`ProductContent`] onto a transparent RGBA layer according to a
//! [`TemplateSettings`].
//!
//! ## Coordinate Model
//!
//! Element positions are percentages of the surface, and font sizes are
//! specified for the layout's base size (e.g. 1080×1080 for square). Painting
//! at any other resolution scales fonts by
//! `min(width / base_width, height / base_height)`, so a 2x export is a
//! sharper copy of the 1x preview rather than a different layout.
//!
//! ```text
//! ┌───────────────────────────────┐
//! │ BRAND                         │  5% from top, accent color
//! │ Product Name                  │
//! │ ────                          │  divider (light/dark themes)
//! │          ┌─────────┐          │
//! │          │  image  │          │  centered at imageAdjustments.position
//! │          └─────────┘          │
//! │ $999            6.1" OLED     │  pricePosition / specPosition
//! │                 128GB         │
//! │ Description text              │  bottom band
//! └───────────────────────────────┘
//! ```
//!
//! The background fill is not part of the layer; the exporter composites the
//! layer over `backgroundColor`.

mod composer;
pub mod placement;
pub mod text;

pub use composer::{AdComposer, RenderedFrame};
pub use text::{TextFont, TextMask};

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::error::{AdForgeError, Result};
use crate::model::{Color, ProductContent, TemplateSettings};
use crate::shader::alpha_over;

/// Horizontal margin as a fraction of the surface width.
const MARGIN_X: f32 = 0.06;
/// Top/bottom margin as a fraction of the surface height.
const MARGIN_Y: f32 = 0.05;
/// Line advance as a multiple of the font size.
const LINE_SPACING: f32 = 1.35;

/// A capturable visual surface with a known base size.
pub trait Surface {
    /// Base size in pixels (the layout preset).
    fn size(&self) -> (u32, u32);

    /// Paint all elements onto a transparent layer of the given size.
    fn paint(&self, width: u32, height: u32) -> Result<RgbaImage>;
}

/// Renders one product with one set of template settings.
pub struct AdRenderer<'a> {
    pub content: &'a ProductContent,
    pub settings: &'a TemplateSettings,
    pub font: &'a TextFont,
}

impl<'a> AdRenderer<'a> {
    pub fn new(content: &'a ProductContent, settings: &'a TemplateSettings, font: &'a TextFont) -> Self {
        Self {
            content,
            settings,
            font,
        }
    }
}

impl Surface for AdRenderer<'_> {
    fn size(&self) -> (u32, u32) {
        self.settings.layout.dimensions()
    }

    fn paint(&self, width: u32, height: u32) -> Result<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(AdForgeError::Image(format!(
                "Cannot paint a {}x{} surface",
                width, height
            )));
        }

        let out_of_range = self.settings.out_of_range_fields();
        if !out_of_range.is_empty() {
            debug!(?out_of_range, "rendering settings outside editor ranges");
        }

        let mut painter = Painter::new(width, height, self.size(), self.font);
        let settings = self.settings;
        let content = self.content;
        let text = settings.text_color;
        let accent = settings.theme.accent(text);

        // Image first so text always sits above it
        if let Some(image) = &content.image {
            match image.bytes() {
                Some(bytes) => {
                    if let Err(e) = placement::draw_product_image(
                        &mut painter.layer,
                        bytes,
                        &settings.image_adjustments,
                    ) {
                        warn!("skipping product image: {}", e);
                    }
                }
                None => warn!("skipping product image that was never fetched"),
            }
        }

        // Header: brand, name, divider
        let mut y = painter.h(MARGIN_Y);
        let x = painter.w(MARGIN_X);
        let header_width = painter.w(1.0 - 2.0 * MARGIN_X);

        if !content.brand.is_empty() {
            let px = painter.font_px(settings.spec_font_size as f32 * 0.8);
            y = painter.text_block(&content.brand.to_uppercase(), x, y, px, header_width, accent);
        }
        if !content.name.is_empty() {
            let px = painter.font_px(settings.price_font_size as f32 * 0.6);
            y = painter.text_block(&content.name, x, y, px, header_width, text);
        }
        if settings.theme.has_divider() {
            let thickness = painter.font_px(4.0).max(2.0);
            painter.fill_rect(x, y + painter.h(0.01), painter.w(0.25), thickness, accent);
        }

        // Price
        if !content.price.is_empty() {
            let px = painter.font_px(settings.price_font_size as f32);
            let (px_x, px_y) = settings.price_position.to_pixels(width, height);
            if settings.theme.has_price_badge() {
                let pad = px * 0.3;
                let w = painter.font.measure(&content.price, px) as f32;
                painter.fill_rect(px_x - pad, px_y - pad, w + 2.0 * pad, px + 2.0 * pad, accent);
                painter.text_line(&content.price, px_x, px_y, px, settings.background_color);
            } else {
                painter.text_line(&content.price, px_x, px_y, px, text);
            }
        }

        // Specifications, then features
        let px = painter.font_px(settings.spec_font_size as f32);
        let (sx, mut sy) = settings.spec_position.to_pixels(width, height);
        let spec_width = (width as f32 - sx - painter.w(MARGIN_X)).max(px);
        for line in content.spec_lines() {
            sy = painter.text_block(line, sx, sy, px, spec_width, text);
        }
        for feature in &content.features {
            sy = painter.text_block(&format!("+ {}", feature), sx, sy, px, spec_width, accent);
        }

        // Description pinned to the bottom
        if let Some(description) = content.description.as_deref().filter(|d| !d.trim().is_empty()) {
            let px = painter.font_px(settings.spec_font_size as f32 * 0.85);
            let lines = painter.font.wrap(description, px, header_width as usize);
            let block = lines.len() as f32 * px * LINE_SPACING;
            let mut dy = height as f32 - painter.h(MARGIN_Y) - block;
            for line in lines {
                painter.text_line(&line, x, dy, px, text);
                dy += px * LINE_SPACING;
            }
        }

        Ok(painter.layer)
    }
}

/// Drawing state for one paint call.
struct Painter<'a> {
    layer: RgbaImage,
    width: f32,
    height: f32,
    font_scale: f32,
    font: &'a TextFont,
}

impl<'a> Painter<'a> {
    fn new(width: u32, height: u32, base: (u32, u32), font: &'a TextFont) -> Self {
        let font_scale =
            (width as f32 / base.0.max(1) as f32).min(height as f32 / base.1.max(1) as f32);
        Self {
            layer: RgbaImage::new(width, height),
            width: width as f32,
            height: height as f32,
            font_scale,
            font,
        }
    }

    fn w(&self, fraction: f32) -> f32 {
        self.width * fraction
    }

    fn h(&self, fraction: f32) -> f32 {
        self.height * fraction
    }

    /// Convert a base-layout font size to pixels at this resolution.
    ///
    /// Capped at the layer height; a taller glyph has nothing more to show.
    fn font_px(&self, size: f32) -> f32 {
        (size * self.font_scale).max(1.0).min(self.height.max(1.0))
    }

    fn text_line(&mut self, line: &str, x: f32, y: f32, px: f32, color: Color) {
        let (left, top) = (x.round() as i64, y.round() as i64);
        let visible_w = self.layer.width() as i64 - left;
        let visible_h = self.layer.height() as i64 - top;
        if visible_w <= 0 || visible_h <= 0 {
            return;
        }
        let mask = self
            .font
            .render_within(line, px, visible_w as usize, visible_h as usize);
        mask.draw(&mut self.layer, left, top, color.to_rgba());
    }

    /// Draw wrapped text; returns the y coordinate below the block.
    fn text_block(&mut self, text: &str, x: f32, y: f32, px: f32, max_width: f32, color: Color) -> f32 {
        let mut y = y;
        for line in self.font.wrap(text, px, max_width.max(1.0) as usize) {
            self.text_line(&line, x, y, px, color);
            y += px * LINE_SPACING;
        }
        y
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + w).round().max(0.0) as u32).min(self.layer.width());
        let y1 = ((y + h).round().max(0.0) as u32).min(self.layer.height());
        let rgba: Rgba<u8> = color.to_rgba();
        for py in y0..y1 {
            for px in x0..x1 {
                let dst = self.layer.get_pixel_mut(px, py);
                *dst = alpha_over(*dst, rgba);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layout, ProductImage, Theme};
    use crate::preprocess::encode_png;

    fn content() -> ProductContent {
        ProductContent {
            name: "Pixel 8".to_string(),
            brand: "Google".to_string(),
            price: "$549".to_string(),
            specifications: "128GB|50MP".to_string(),
            description: Some("Screen replaced".to_string()),
            features: vec!["Unlocked".to_string()],
            image: None,
        }
    }

    #[test]
    fn test_surface_size_follows_layout() {
        let font = TextFont::Bitmap;
        let c = content();
        let mut settings = TemplateSettings::default();
        settings.layout = Layout::Portrait;
        assert_eq!(AdRenderer::new(&c, &settings, &font).size(), (1080, 1350));
    }

    #[test]
    fn test_paint_is_transparent_layer_with_ink() {
        let font = TextFont::Bitmap;
        let c = content();
        let settings = TemplateSettings::default();
        let layer = AdRenderer::new(&c, &settings, &font).paint(540, 540).unwrap();

        assert_eq!(layer.dimensions(), (540, 540));
        assert_eq!(layer.get_pixel(539, 0)[3], 0);
        assert!(layer.pixels().any(|p| p[3] == 255));
    }

    #[test]
    fn test_empty_content_paints_nothing_for_minimal() {
        let font = TextFont::Bitmap;
        let c = ProductContent::default();
        let settings = TemplateSettings {
            theme: Theme::Minimal,
            ..Default::default()
        };
        let layer = AdRenderer::new(&c, &settings, &font).paint(100, 100).unwrap();
        assert!(layer.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_product_image_is_drawn_at_its_position() {
        let font = TextFont::Bitmap;
        let png = encode_png(&RgbaImage::from_pixel(10, 10, Rgba([0, 200, 0, 255]))).unwrap();
        let c = ProductContent {
            image: Some(ProductImage::png(png)),
            ..Default::default()
        };
        let settings = TemplateSettings {
            theme: Theme::Minimal,
            ..Default::default()
        };
        let layer = AdRenderer::new(&c, &settings, &font).paint(200, 200).unwrap();
        // Centered at (50%, 45%)
        let center = layer.get_pixel(100, 90);
        assert_eq!(center[3], 255);
        assert!(center[1] > 190 && center[0] < 10);
        assert_eq!(layer.get_pixel(2, 2)[3], 0);
    }

    #[test]
    fn test_broken_image_bytes_are_skipped() {
        let font = TextFont::Bitmap;
        let c = ProductContent {
            image: Some(ProductImage::png(b"garbage".to_vec())),
            ..Default::default()
        };
        let settings = TemplateSettings::default();
        assert!(AdRenderer::new(&c, &settings, &font).paint(64, 64).is_ok());
    }

    #[test]
    fn test_huge_scale_and_font_sizes_still_paint() {
        let font = TextFont::Bitmap;
        let png = encode_png(&RgbaImage::from_pixel(10, 10, Rgba([0, 200, 0, 255]))).unwrap();
        let c = ProductContent {
            image: Some(ProductImage::png(png)),
            ..content()
        };
        let mut settings = TemplateSettings::default();
        settings.image_adjustments.scale = 1e30;
        settings.price_font_size = u32::MAX;
        settings.spec_font_size = u32::MAX;

        let layer = AdRenderer::new(&c, &settings, &font).paint(64, 64).unwrap();
        assert_eq!(layer.dimensions(), (64, 64));
    }

    #[test]
    fn test_zero_size_is_an_error() {
        let font = TextFont::Bitmap;
        let c = content();
        let settings = TemplateSettings::default();
        assert!(AdRenderer::new(&c, &settings, &font).paint(0, 10).is_err());
    }
}
