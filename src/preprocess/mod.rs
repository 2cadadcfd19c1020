//! # Image Preprocessor
//!
//! Turns an uploaded or fetched product photo into a self-contained PNG with
//! its near-white background knocked out.
//!
//! ## Algorithm
//!
//! ```text
//! for each pixel:
//!     if r > 240 && g > 240 && b > 240 { alpha = 0 }   // near-white → transparent
//!     else { unchanged }
//! ```
//!
//! The cutoff is a fixed hard threshold: no tolerance parameter, no edge
//! feathering, no flood fill. Semi-white edge pixels are either kept whole or
//! removed whole. Running the pass twice changes nothing.
//!
//! ## Failure Mode
//!
//! [`remove_background`] never fails. If the bytes cannot be decoded or the
//! result cannot be encoded, the original bytes come back untouched with
//! `removed == false`.

mod decode;
pub(crate) mod fetch;

pub use decode::decode_image;
pub use fetch::{HttpImageFetcher, ImageFetcher, load_remote_image, resolve_product_image};

use image::{ImageFormat, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::error::{AdForgeError, Result};

/// Channels must all be strictly above this value for a pixel to be cleared.
pub const NEAR_WHITE_THRESHOLD: u8 = 240;

/// Result of [`remove_background`].
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// PNG bytes when `removed` is true, otherwise the original input.
    pub bytes: Vec<u8>,
    /// Whether background removal ran successfully.
    pub removed: bool,
    /// Number of pixels made transparent.
    pub cleared_pixels: usize,
}

/// True when a pixel counts as background.
#[inline]
pub fn is_near_white(r: u8, g: u8, b: u8) -> bool {
    r > NEAR_WHITE_THRESHOLD && g > NEAR_WHITE_THRESHOLD && b > NEAR_WHITE_THRESHOLD
}

/// Clear the alpha of every near-white pixel in place.
///
/// Returns the number of pixels whose alpha was set to 0 by this pass
/// (pixels that were already transparent are not counted).
pub fn remove_near_white(img: &mut RgbaImage) -> usize {
    let raw: &mut [u8] = &mut **img;
    raw.par_chunks_mut(4)
        .map(|px| {
            if is_near_white(px[0], px[1], px[2]) && px[3] != 0 {
                px[3] = 0;
                1
            } else {
                0
            }
        })
        .sum()
}

/// Encode an RGBA image as PNG.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| AdForgeError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf.into_inner())
}

/// Decode, knock out the near-white background and re-encode as PNG.
///
/// Falls back to the original bytes on any decode or encode failure.
pub fn remove_background(bytes: &[u8], filename: Option<&str>) -> ProcessedImage {
    match try_remove_background(bytes, filename) {
        Ok((png, cleared)) => {
            debug!(cleared, "background removed");
            ProcessedImage {
                bytes: png,
                removed: true,
                cleared_pixels: cleared,
            }
        }
        Err(e) => {
            warn!("background removal skipped, keeping original image: {}", e);
            ProcessedImage {
                bytes: bytes.to_vec(),
                removed: false,
                cleared_pixels: 0,
            }
        }
    }
}

fn try_remove_background(bytes: &[u8], filename: Option<&str>) -> Result<(Vec<u8>, usize)> {
    let mut rgba = decode_image(bytes, filename)?.to_rgba8();
    let cleared = remove_near_white(&mut rgba);
    let png = encode_png(&rgba)?;
    Ok((png, cleared))
}
