//! Image decoding for uploads and fetched bytes.
//!
//! Everything the `image` crate understands is decoded directly. HEIC/HEIF
//! photos (common from phones at the repair counter) are decoded through
//! libheif when the `heif` feature is enabled.

use image::DynamicImage;

use crate::error::{AdForgeError, Result};

/// Decode raw bytes into an image.
///
/// `filename` is only used as a hint for HEIC detection.
pub fn decode_image(bytes: &[u8], filename: Option<&str>) -> Result<DynamicImage> {
    if looks_like_heic(bytes, filename) {
        return decode_heic(bytes);
    }

    image::load_from_memory(bytes)
        .map_err(|e| AdForgeError::Image(format!("Failed to decode image: {}", e)))
}

fn looks_like_heic(bytes: &[u8], filename: Option<&str>) -> bool {
    if is_heic(bytes) {
        return true;
    }
    filename
        .map(|f| {
            let f = f.to_lowercase();
            f.ends_with(".heic") || f.ends_with(".heif")
        })
        .unwrap_or(false)
}

/// Check if the data looks like a HEIC/HEIF file by examining magic bytes.
/// HEIC files have an "ftyp" box near the start with HEIC-related brand codes.
pub(crate) fn is_heic(data: &[u8]) -> bool {
    if data.len() < 12 {
        return false;
    }

    // Box size (4 bytes) followed by "ftyp"
    if &data[4..8] != b"ftyp" {
        return false;
    }

    let brand = &data[8..12];
    matches!(
        brand,
        b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"hevm" | b"hevs" | b"mif1" | b"msf1"
    )
}

#[cfg(feature = "heif")]
fn decode_heic(data: &[u8]) -> Result<DynamicImage> {
    use image::RgbaImage;
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data)
        .map_err(|e| AdForgeError::Image(format!("Failed to read HEIC: {}", e)))?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| AdForgeError::Image(format!("Failed to get primary image: {}", e)))?;

    let image = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
        .map_err(|e| AdForgeError::Image(format!("Failed to decode HEIC image: {}", e)))?;

    let planes = image.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| AdForgeError::Image("No interleaved RGBA data in HEIC".to_string()))?;

    let width = image.width();
    let height = image.height();
    let stride = interleaved.stride;
    let data = interleaved.data;

    let mut rgba = RgbaImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let offset = (y as usize * stride) + (x as usize * 4);
            if offset + 3 < data.len() {
                rgba.put_pixel(
                    x,
                    y,
                    image::Rgba([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]]),
                );
            }
        }
    }

    Ok(DynamicImage::ImageRgba8(rgba))
}

#[cfg(not(feature = "heif"))]
fn decode_heic(_data: &[u8]) -> Result<DynamicImage> {
    Err(AdForgeError::Image(
        "HEIC decoding not enabled (compile with 'heif' feature)".to_string(),
    ))
}
