//! # Pixel Math Primitives
//!
//! Small per-pixel building blocks shared by the layout renderer and the
//! exporter.
//!
//! ## Categories
//!
//! - [`adjust`]: Brightness, contrast, saturation
//! - [`blend`]: Interpolation and alpha compositing
//! - [`transform`]: Rotation and rotated bounds

pub mod adjust;
pub mod blend;
pub mod transform;

// Re-export all primitives at the top level for convenience
pub use adjust::*;
pub use blend::*;
pub use transform::*;
