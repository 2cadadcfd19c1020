//! Mutable editing state with render-complete tracking.
//!
//! Every mutation bumps a generation counter. A [`RenderedFrame`] remembers
//! the generation it was painted from, and [`AdComposer::capture`] refuses a
//! frame that no longer matches the current state.

use image::RgbaImage;
use tracing::debug;

use super::{AdRenderer, TextFont};
use crate::error::{AdForgeError, Result};
use crate::export::export_as_bitmap;
use crate::model::{ProductContent, TargetSize, TemplateSettings};

/// A finished render, stamped with the state generation it reflects.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub generation: u64,
    pub bitmap: RgbaImage,
}

/// The single editing session: content, settings and the font to draw with.
#[derive(Debug, Clone, Default)]
pub struct AdComposer {
    content: ProductContent,
    settings: TemplateSettings,
    font: TextFont,
    generation: u64,
}

impl AdComposer {
    pub fn new(content: ProductContent, settings: TemplateSettings, font: TextFont) -> Self {
        Self {
            content,
            settings,
            font,
            generation: 0,
        }
    }

    pub fn content(&self) -> &ProductContent {
        &self.content
    }

    pub fn settings(&self) -> &TemplateSettings {
        &self.settings
    }

    pub fn font(&self) -> &TextFont {
        &self.font
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_content(&mut self, content: ProductContent) {
        self.content = content;
        self.generation += 1;
    }

    pub fn set_settings(&mut self, settings: TemplateSettings) {
        self.settings = settings;
        self.generation += 1;
    }

    /// Replace both halves of the state in one step (template load).
    pub fn load(&mut self, content: ProductContent, settings: TemplateSettings) {
        self.content = content;
        self.settings = settings;
        self.generation += 1;
    }

    pub fn renderer(&self) -> AdRenderer<'_> {
        AdRenderer::new(&self.content, &self.settings, &self.font)
    }

    /// Paint the current state at export density.
    ///
    /// Returns only once every element is drawn; the frame is the
    /// render-complete signal.
    pub fn render_frame(&self, target: &TargetSize) -> Result<RenderedFrame> {
        let bitmap = export_as_bitmap(
            &self.renderer(),
            target.width,
            target.height,
            self.settings.background_color,
        )?;
        debug!(
            generation = self.generation,
            width = bitmap.width(),
            height = bitmap.height(),
            "frame rendered"
        );
        Ok(RenderedFrame {
            generation: self.generation,
            bitmap,
        })
    }

    /// Take the bitmap out of a frame if it still reflects the current state.
    pub fn capture(&self, frame: RenderedFrame) -> Result<RgbaImage> {
        if frame.generation != self.generation {
            return Err(AdForgeError::StaleFrame {
                rendered: frame.generation,
                current: self.generation,
            });
        }
        Ok(frame.bitmap)
    }
}
