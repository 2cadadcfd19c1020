//! Template settings: layout, theme, colors and element placement.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use super::Color;

/// Surface aspect presets. Each maps to a fixed base size in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Portrait,
    Landscape,
    #[default]
    Square,
}

impl Layout {
    /// Base surface size (width, height) in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Layout::Portrait => (1080, 1350),
            Layout::Landscape => (1920, 1080),
            Layout::Square => (1080, 1080),
        }
    }
}

/// Visual themes. Themes add decoration; colors come from the settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Minimal,
    Bold,
}

impl Theme {
    /// Accent color used for brand text, dividers and badges.
    pub fn accent(self, text_color: Color) -> Color {
        match self {
            Theme::Light => Color::rgb(0x25, 0x63, 0xeb),
            Theme::Dark => Color::rgb(0xfa, 0xcc, 0x15),
            Theme::Minimal => text_color,
            Theme::Bold => Color::rgb(0xdc, 0x26, 0x26),
        }
    }

    /// Whether a divider is drawn under the product name.
    pub fn has_divider(self) -> bool {
        matches!(self, Theme::Light | Theme::Dark)
    }

    /// Whether the price sits on a filled accent badge.
    pub fn has_price_badge(self) -> bool {
        matches!(self, Theme::Bold)
    }
}

/// A point in percent of the surface (0–100 on both axes).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert to pixel coordinates on a surface of the given size.
    pub fn to_pixels(self, width: u32, height: u32) -> (f32, f32) {
        (self.x / 100.0 * width as f32, self.y / 100.0 * height as f32)
    }
}

/// Adjustments applied to the product image before it is placed.
///
/// brightness/contrast/saturation/scale are percentages where 100 is identity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAdjustments {
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Center of the image, in percent of the surface.
    pub position: Position,
    pub scale: f32,
    /// Clockwise rotation in degrees.
    pub rotation: f32,
}

impl Default for ImageAdjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            position: Position::new(50.0, 45.0),
            scale: 100.0,
            rotation: 0.0,
        }
    }
}

impl ImageAdjustments {
    /// True when no color adjustment needs to be applied.
    pub fn is_color_identity(&self) -> bool {
        self.brightness == 100.0 && self.contrast == 100.0 && self.saturation == 100.0
    }
}

/// Ranges the editor UI clamps its controls to.
///
/// The pipeline itself accepts values outside these ranges and renders them
/// as given.
pub mod ranges {
    use std::ops::RangeInclusive;

    pub const PERCENT_ADJUST: RangeInclusive<f32> = 0.0..=200.0;
    pub const SCALE: RangeInclusive<f32> = 10.0..=300.0;
    pub const ROTATION: RangeInclusive<f32> = -180.0..=180.0;
    pub const POSITION: RangeInclusive<f32> = 0.0..=100.0;
    pub const FONT_SIZE: RangeInclusive<u32> = 8..=200;
}

/// Template settings applied to a [`super::ProductContent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateSettings {
    pub layout: Layout,
    pub theme: Theme,
    pub price_font_size: u32,
    pub spec_font_size: u32,
    pub text_color: Color,
    pub background_color: Color,
    /// Top-left anchor of the price, in percent.
    pub price_position: Position,
    /// Top-left anchor of the specification block, in percent.
    pub spec_position: Position,
    pub image_adjustments: ImageAdjustments,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            layout: Layout::Square,
            theme: Theme::Light,
            price_font_size: 72,
            spec_font_size: 28,
            text_color: Color::rgb(0x11, 0x18, 0x27),
            background_color: Color::WHITE,
            price_position: Position::new(6.0, 72.0),
            spec_position: Position::new(62.0, 72.0),
            image_adjustments: ImageAdjustments::default(),
        }
    }
}

impl TemplateSettings {
    /// Names of fields whose values fall outside the editor's control ranges.
    ///
    /// Diagnostic only: rendering never rejects or clamps these values.
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        fn check<T: PartialOrd>(
            out: &mut Vec<&'static str>,
            name: &'static str,
            value: T,
            range: &RangeInclusive<T>,
        ) {
            if !range.contains(&value) {
                out.push(name);
            }
        }

        let adj = &self.image_adjustments;
        let mut out = Vec::new();
        check(&mut out, "priceFontSize", self.price_font_size, &ranges::FONT_SIZE);
        check(&mut out, "specFontSize", self.spec_font_size, &ranges::FONT_SIZE);
        check(&mut out, "pricePosition.x", self.price_position.x, &ranges::POSITION);
        check(&mut out, "pricePosition.y", self.price_position.y, &ranges::POSITION);
        check(&mut out, "specPosition.x", self.spec_position.x, &ranges::POSITION);
        check(&mut out, "specPosition.y", self.spec_position.y, &ranges::POSITION);
        check(&mut out, "imageAdjustments.brightness", adj.brightness, &ranges::PERCENT_ADJUST);
        check(&mut out, "imageAdjustments.contrast", adj.contrast, &ranges::PERCENT_ADJUST);
        check(&mut out, "imageAdjustments.saturation", adj.saturation, &ranges::PERCENT_ADJUST);
        check(&mut out, "imageAdjustments.scale", adj.scale, &ranges::SCALE);
        check(&mut out, "imageAdjustments.rotation", adj.rotation, &ranges::ROTATION);
        out
    }
}
