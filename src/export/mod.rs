//! # Exporter
//!
//! Turns a painted [`Surface`] into a downloadable file.
//!
//! ## Pipeline
//!
//! ```text
//! ExportSettings ──► resolve format ──► rasterize @2x over background ──► encode
//!                      │ SVG                                               │
//!                      ▼                                                   ▼
//!               UnsupportedFormat                             PNG / JPG / single-page PDF
//! ```
//!
//! The format is resolved before anything is rendered, so an unsupported
//! format never produces pixels or files.
//!
//! Only one export may run against the shared editing surface at a time;
//! [`ExportGate`] enforces that across the server and the batch orchestrator.

mod pdf;

pub use pdf::export_as_document;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

use crate::error::{AdForgeError, Result};
use crate::layout::Surface;
use crate::model::{Color, Encoding, ExportSettings, TargetSize};
use crate::shader::alpha_over;

/// Pixel density applied to every export: 1080×1080 exports as 2160×2160.
pub const EXPORT_PIXEL_DENSITY: u32 = 2;

/// A finished export, ready to download or write.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Pixel dimensions of `width×height` at `density`.
///
/// Each logical side must be in `1..=MAX_TARGET_SIDE` and the product must
/// fit in a `u32`.
pub fn scaled_dimensions(width: u32, height: u32, density: u32) -> Result<(u32, u32)> {
    TargetSize::new(width, height, "").validate()?;
    match (width.checked_mul(density), height.checked_mul(density)) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(AdForgeError::InvalidSize(format!(
            "{}x{} at {}x density",
            width, height, density
        ))),
    }
}

/// Paint `surface` at `width×height × density` and flatten it over `background`.
///
/// The result is fully opaque.
pub fn rasterize(
    surface: &dyn Surface,
    width: u32,
    height: u32,
    density: u32,
    background: Color,
) -> Result<RgbaImage> {
    let (w, h) = scaled_dimensions(width, height, density)?;
    let layer = surface.paint(w, h)?;

    let mut canvas = RgbaImage::from_pixel(w, h, background.to_rgba());
    canvas
        .par_chunks_mut(4)
        .zip(layer.par_chunks(4))
        .for_each(|(dst, src)| {
            let out = alpha_over(
                Rgba([dst[0], dst[1], dst[2], dst[3]]),
                Rgba([src[0], src[1], src[2], src[3]]),
            );
            dst.copy_from_slice(&out.0);
        });

    Ok(canvas)
}

/// Rasterize for export at [`EXPORT_PIXEL_DENSITY`].
pub fn export_as_bitmap(
    surface: &dyn Surface,
    width: u32,
    height: u32,
    background: Color,
) -> Result<RgbaImage> {
    rasterize(surface, width, height, EXPORT_PIXEL_DENSITY, background)
}

/// Rasterize at the surface's own size, 1x (editor preview).
pub fn export_preview(surface: &dyn Surface, background: Color) -> Result<RgbaImage> {
    let (w, h) = surface.size();
    rasterize(surface, w, h, 1, background)
}

/// Encode a bitmap to an image file format.
///
/// `Encoding::Pdf` is routed to [`export_as_document`].
pub fn export_as_image_file(bitmap: &RgbaImage, encoding: Encoding) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Png => {
            let mut out = Cursor::new(Vec::new());
            bitmap
                .write_to(&mut out, ImageFormat::Png)
                .map_err(|e| AdForgeError::Encode(format!("PNG: {}", e)))?;
            Ok(out.into_inner())
        }
        Encoding::Jpeg { quality } => {
            // JPEG has no alpha channel
            let rgb = DynamicImage::ImageRgba8(bitmap.clone()).to_rgb8();
            let mut out = Vec::new();
            JpegEncoder::new_with_quality(&mut out, quality)
                .encode_image(&rgb)
                .map_err(|e| AdForgeError::Encode(format!("JPEG: {}", e)))?;
            Ok(out)
        }
        Encoding::Pdf => export_as_document(bitmap),
    }
}

/// Full single export: resolve the format, render, encode.
pub fn export(
    surface: &dyn Surface,
    settings: &ExportSettings,
    background: Color,
) -> Result<ExportedFile> {
    let encoding = settings
        .encoding()
        .ok_or(AdForgeError::UnsupportedFormat(settings.format))?;
    let target = &settings.target_size;
    target.validate()?;

    let bitmap = export_as_bitmap(surface, target.width, target.height, background)?;
    let bytes = export_as_image_file(&bitmap, encoding)?;

    let filename = export_file_name(&settings.filename, encoding);
    info!(
        filename = %filename,
        width = bitmap.width(),
        height = bitmap.height(),
        bytes = bytes.len(),
        "export complete"
    );

    Ok(ExportedFile {
        filename,
        mime: encoding.mime(),
        bytes,
    })
}

/// Download name for a single export: `{prefix}.{ext}`.
pub fn export_file_name(prefix: &str, encoding: Encoding) -> String {
    format!("{}.{}", sanitize_file_stem(prefix), encoding.extension())
}

/// Reduce `name` to `[A-Za-z0-9_-]` for use in file names.
///
/// Runs of other characters collapse to a single `_`; an empty result
/// becomes `"untitled"`.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Single-flight flag for exports against the shared surface.
#[derive(Debug, Clone, Default)]
pub struct ExportGate {
    busy: Arc<AtomicBool>,
}

/// Holds the gate; dropping it ends the export.
#[derive(Debug)]
pub struct ExportGuard {
    busy: Arc<AtomicBool>,
}

impl ExportGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_exporting(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the gate, or fail with `ExportInProgress` if it is held.
    pub fn try_begin(&self) -> Result<ExportGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AdForgeError::ExportInProgress)?;
        debug!("export gate acquired");
        Ok(ExportGuard {
            busy: Arc::clone(&self.busy),
        })
    }
}

impl Drop for ExportGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
        debug!("export gate released");
    }
}

/// Write `bytes` to `path` through a temp file in the same directory.
///
/// On failure the destination is left untouched.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AdForgeError::Io(e.error))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{AdRenderer, TextFont};
    use crate::model::{ExportFormat, ProductContent, TargetSize, TemplateSettings};

    /// Draws a single opaque red pixel in the top-left corner.
    struct Dot;

    impl Surface for Dot {
        fn size(&self) -> (u32, u32) {
            (8, 4)
        }

        fn paint(&self, width: u32, height: u32) -> Result<RgbaImage> {
            let mut layer = RgbaImage::new(width, height);
            layer.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
            Ok(layer)
        }
    }

    #[test]
    fn test_rasterize_is_opaque_over_background() {
        let bitmap = rasterize(&Dot, 8, 4, 1, Color::rgb(0, 0, 255)).unwrap();
        assert_eq!(bitmap.get_pixel(0, 0).0, [255, 0, 0, 255]);
        assert_eq!(bitmap.get_pixel(5, 3).0, [0, 0, 255, 255]);
        assert!(bitmap.pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn test_square_export_doubles_pixel_density() {
        let font = TextFont::Bitmap;
        let content = ProductContent {
            name: "iPhone 15 Pro".to_string(),
            price: "$999".to_string(),
            ..Default::default()
        };
        let settings = TemplateSettings::default();
        let renderer = AdRenderer::new(&content, &settings, &font);

        let bitmap = export_as_bitmap(&renderer, 1080, 1080, Color::WHITE).unwrap();
        assert_eq!(bitmap.dimensions(), (2160, 2160));
    }

    #[test]
    fn test_svg_is_rejected_before_rendering() {
        struct Panics;
        impl Surface for Panics {
            fn size(&self) -> (u32, u32) {
                (1, 1)
            }
            fn paint(&self, _: u32, _: u32) -> Result<RgbaImage> {
                panic!("must not render");
            }
        }

        let settings = ExportSettings {
            format: ExportFormat::Svg,
            ..Default::default()
        };
        let err = export(&Panics, &settings, Color::WHITE).unwrap_err();
        assert!(matches!(err, AdForgeError::UnsupportedFormat(ExportFormat::Svg)));
    }

    #[test]
    fn test_bad_sizes_are_rejected_before_painting() {
        struct Panics;
        impl Surface for Panics {
            fn size(&self) -> (u32, u32) {
                (1, 1)
            }
            fn paint(&self, _: u32, _: u32) -> Result<RgbaImage> {
                panic!("must not render");
            }
        }

        for (w, h) in [(0, 1080), (1080, 0), (3_000_000_000, 1), (100_000, 100_000), (8193, 8)] {
            let err = export_as_bitmap(&Panics, w, h, Color::WHITE).unwrap_err();
            assert!(matches!(err, AdForgeError::InvalidSize(_)), "{}x{}: {}", w, h, err);
            assert!(err.is_validation());
        }
        assert!(matches!(
            scaled_dimensions(8, 8, u32::MAX),
            Err(AdForgeError::InvalidSize(_))
        ));
        assert_eq!(scaled_dimensions(8192, 8192, EXPORT_PIXEL_DENSITY).unwrap(), (16384, 16384));

        let settings = ExportSettings {
            target_size: TargetSize::new(0, 64, "empty"),
            ..Default::default()
        };
        assert!(matches!(
            export(&Panics, &settings, Color::WHITE),
            Err(AdForgeError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_export_png_and_jpg() {
        let settings = ExportSettings {
            target_size: TargetSize::new(8, 4, "tiny"),
            filename: "spring sale!".to_string(),
            ..Default::default()
        };
        let png = export(&Dot, &settings, Color::WHITE).unwrap();
        assert_eq!(png.filename, "spring_sale.png");
        assert_eq!(png.mime, "image/png");
        let decoded = image::load_from_memory(&png.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 8));

        let jpg = export(
            &Dot,
            &ExportSettings {
                format: ExportFormat::Jpg,
                quality: 80,
                ..settings
            },
            Color::WHITE,
        )
        .unwrap();
        assert_eq!(&jpg.bytes[..2], &[0xFF, 0xD8]);
        assert!(jpg.filename.ends_with(".jpg"));
    }

    #[test]
    fn test_gate_is_single_flight() {
        let gate = ExportGate::new();
        let guard = gate.try_begin().unwrap();
        assert!(gate.is_exporting());
        assert!(matches!(gate.clone().try_begin(), Err(AdForgeError::ExportInProgress)));
        drop(guard);
        assert!(!gate.is_exporting());
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("iPhone 15 Pro"), "iPhone_15_Pro");
        assert_eq!(sanitize_file_stem("  Galaxy/S24 (256GB) "), "Galaxy_S24_256GB");
        assert_eq!(sanitize_file_stem("product-ad"), "product-ad");
        assert_eq!(sanitize_file_stem("???"), "untitled");
    }

    #[test]
    fn test_write_output_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ad.png");
        write_output(&path, b"first").unwrap();
        write_output(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_output_into_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ad.png");
        assert!(write_output(&path, b"x").is_err());
        assert!(!path.exists());
    }
}
