//! # Content Model
//!
//! Data types shared by every stage of the pipeline:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ProductContent`] | Product fields shown on the ad |
//! | [`ProductImage`] | Either a remote URL or a self-contained encoded bitmap |
//! | [`TemplateSettings`] | Layout, theme, colors and element positions |
//! | [`ExportSettings`] | Output format, quality, target size and filename prefix |
//! | [`Preset`] | Built-in demo product used to populate the editor |
//!
//! All types derive `Serialize + Deserialize` with camelCase field names so the
//! same structs work for the HTTP API, the CLI's JSON inputs and the template
//! store.

mod color;
mod content;
mod export;
mod preset;
mod settings;

pub use color::Color;
pub use content::{ProductContent, ProductImage};
pub use export::{Encoding, ExportFormat, ExportSettings, MAX_TARGET_SIDE, TargetSize};
pub use preset::{Preset, list_presets, preset_by_name};
pub use settings::{ImageAdjustments, Layout, Position, TemplateSettings, Theme};
