//! # adforge - Product Ad Composition and Export
//!
//! adforge turns a product (name, price, specs, photo) and a set of template
//! settings into a social-media-ready ad. It provides:
//!
//! - **Preprocessing**: near-white background removal for product photos
//! - **Layout**: percentage-positioned text and image elements on an RGBA surface
//! - **Export**: PNG, JPG and single-page PDF at 2x pixel density
//! - **Batch**: one ad per CSV row, packed into a zip archive
//! - **Templates**: saved content + settings snapshots
//!
//! ## Quick Start
//!
//! ```no_run
//! use adforge::{
//!     export::export,
//!     layout::{AdRenderer, TextFont},
//!     model::{ExportSettings, ProductContent, TemplateSettings},
//! };
//!
//! let content = ProductContent {
//!     name: "iPhone 15 Pro".to_string(),
//!     price: "$999".to_string(),
//!     specifications: "6.1\" OLED|128GB".to_string(),
//!     ..Default::default()
//! };
//! let settings = TemplateSettings::default();
//! let font = TextFont::default();
//!
//! let renderer = AdRenderer::new(&content, &settings, &font);
//! let file = export(&renderer, &ExportSettings::default(), settings.background_color)?;
//! std::fs::write(&file.filename, &file.bytes)?;
//!
//! # Ok::<(), adforge::error::AdForgeError>(())
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Content, settings and export types |
//! | [`preprocess`] | Decoding, background removal, remote fetch |
//! | [`layout`] | Renderer and the editing session |
//! | [`export`] | Rasterization and encoders |
//! | [`batch`] | CSV batch runs to zip |
//! | [`templates`] | Saved template storage |
//! | [`server`] | HTTP API |
//! | [`shader`] | Pixel math helpers |
//! | [`error`] | Error types |

pub mod batch;
pub mod error;
pub mod export;
pub mod layout;
pub mod model;
pub mod preprocess;
pub mod server;
pub mod shader;
pub mod templates;

// Re-exports for convenience
pub use error::AdForgeError;
pub use layout::{AdComposer, AdRenderer, Surface};
pub use model::{ExportSettings, ProductContent, TemplateSettings};
