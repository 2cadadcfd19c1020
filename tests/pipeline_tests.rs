//! # Pipeline Tests
//!
//! End-to-end checks of the public API: preprocess → render → export, batch
//! archives and saved templates.
//!
//! ## Test Coverage
//!
//! - Background removal on a known 2×2 image
//! - 2x export density and per-format output
//! - Batch archives (entry count, order, names, no-op)
//! - Template save/delete round trip on disk
//!
//! Remote images come from an in-memory fetcher; nothing here touches the
//! network.

use adforge::batch::{BatchOrchestrator, parse_batch_csv};
use adforge::error::{AdForgeError, Result};
use adforge::export::{ExportGate, export, export_as_bitmap};
use adforge::layout::{AdComposer, AdRenderer, TextFont};
use adforge::model::{
    Color, ExportFormat, ExportSettings, Layout, ProductContent, ProductImage, TargetSize,
    TemplateSettings,
};
use adforge::preprocess::{ImageFetcher, encode_png, remove_background, remove_near_white};
use adforge::templates::{FileTemplateStore, TemplateStore};
use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

struct StaticFetcher(HashMap<String, Vec<u8>>);

#[async_trait]
impl ImageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.0
            .get(url)
            .cloned()
            .ok_or_else(|| AdForgeError::Fetch(format!("404 {}", url)))
    }
}

/// Product photo: dark square on a white studio background.
fn studio_photo() -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(20, 20, Rgba([250, 250, 250, 255]));
    for y in 5..15 {
        for x in 5..15 {
            img.put_pixel(x, y, Rgba([40, 40, 60, 255]));
        }
    }
    encode_png(&img).unwrap()
}

fn product() -> ProductContent {
    ProductContent {
        name: "iPhone 15 Pro".to_string(),
        brand: "Apple".to_string(),
        price: "$999".to_string(),
        specifications: "6.1\" OLED|128GB|A17 Pro".to_string(),
        description: Some("Certified refurbished".to_string()),
        features: vec!["USB-C".to_string()],
        image: None,
    }
}

fn unzip_names(bytes: &[u8]) -> Vec<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..zip.len())
        .map(|i| zip.by_index(i).unwrap().name().to_string())
        .collect()
}

// ============================================================================
// PREPROCESS
// ============================================================================

#[test]
fn test_near_white_pixels_become_transparent() {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
    img.put_pixel(0, 1, Rgba([255, 255, 255, 255]));
    img.put_pixel(1, 1, Rgba([255, 0, 0, 255]));

    let processed = remove_background(&encode_png(&img).unwrap(), None);
    assert!(processed.removed);
    assert_eq!(processed.cleared_pixels, 2);

    let out = image::load_from_memory(&processed.bytes).unwrap().to_rgba8();
    assert_eq!(out.dimensions(), (2, 2));
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0, 255]);
    assert_eq!(out.get_pixel(0, 1)[3], 0);
    assert_eq!(out.get_pixel(1, 1).0, [255, 0, 0, 255]);
}

#[test]
fn test_threshold_boundary_is_strict() {
    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, Rgba([240, 240, 240, 255]));
    img.put_pixel(1, 0, Rgba([241, 241, 241, 255]));
    assert_eq!(remove_near_white(&mut img), 1);
    assert_eq!(img.get_pixel(0, 0)[3], 255);
    assert_eq!(img.get_pixel(1, 0)[3], 0);
}

#[test]
fn test_preprocessing_twice_changes_nothing() {
    let once = remove_background(&studio_photo(), None);
    let twice = remove_background(&once.bytes, None);
    let a = image::load_from_memory(&once.bytes).unwrap().to_rgba8();
    let b = image::load_from_memory(&twice.bytes).unwrap().to_rgba8();
    assert_eq!(a, b);
    assert_eq!(twice.cleared_pixels, 0);
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_square_export_is_2160() {
    let font = TextFont::Bitmap;
    let content = product();
    let settings = TemplateSettings::default();
    let renderer = AdRenderer::new(&content, &settings, &font);

    let bitmap = export_as_bitmap(&renderer, 1080, 1080, settings.background_color).unwrap();
    assert_eq!(bitmap.dimensions(), (2160, 2160));
    assert!(bitmap.pixels().all(|p| p[3] == 255));
}

#[test]
fn test_processed_photo_shows_background_through() {
    let font = TextFont::Bitmap;
    let processed = remove_background(&studio_photo(), None);
    let content = ProductContent {
        image: Some(ProductImage::png(processed.bytes)),
        ..Default::default()
    };
    let settings = TemplateSettings {
        background_color: Color::rgb(255, 0, 255),
        theme: adforge::model::Theme::Minimal,
        ..Default::default()
    };
    let renderer = AdRenderer::new(&content, &settings, &font);
    let bitmap = export_as_bitmap(&renderer, 100, 100, settings.background_color).unwrap();

    // The photo's white border was removed, so its corner shows magenta
    let (cx, cy) = (100, 90);
    let image_w = (200.0_f32 * 0.55) as u32;
    let corner = bitmap.get_pixel(cx - image_w / 2 + 2, cy - image_w / 2 + 2);
    assert_eq!(corner.0, [255, 0, 255, 255]);
    // The product itself is still there
    let center = bitmap.get_pixel(cx, cy);
    assert!(center[0] < 100 && center[1] < 100);
}

#[test]
fn test_svg_export_is_refused_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let font = TextFont::Bitmap;
    let content = product();
    let settings = TemplateSettings::default();
    let renderer = AdRenderer::new(&content, &settings, &font);

    let export_settings = ExportSettings {
        format: ExportFormat::Svg,
        ..Default::default()
    };
    let err = export(&renderer, &export_settings, Color::WHITE).unwrap_err();
    assert!(matches!(err, AdForgeError::UnsupportedFormat(ExportFormat::Svg)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_pdf_page_matches_export_bitmap() {
    let font = TextFont::Bitmap;
    let content = product();
    let settings = TemplateSettings {
        layout: Layout::Portrait,
        ..Default::default()
    };
    let renderer = AdRenderer::new(&content, &settings, &font);
    let export_settings = ExportSettings {
        format: ExportFormat::Pdf,
        target_size: TargetSize::new(108, 135, "small portrait"),
        ..Default::default()
    };

    let file = export(&renderer, &export_settings, settings.background_color).unwrap();
    assert_eq!(file.filename, "product-ad.pdf");
    assert_eq!(file.mime, "application/pdf");

    let doc = lopdf::Document::load_mem(&file.bytes).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let media_box: Vec<i64> = doc
        .get_object(page_id)
        .unwrap()
        .as_dict()
        .unwrap()
        .get(b"MediaBox")
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o.as_i64().unwrap())
        .collect();
    assert_eq!(media_box, vec![0, 0, 216, 270]);
}

#[test]
fn test_stale_frame_is_not_captured() {
    let mut composer = AdComposer::default();
    composer.set_content(product());
    let frame = composer.render_frame(&TargetSize::new(50, 50, "t")).unwrap();

    let mut edited = product();
    edited.price = "$899".to_string();
    composer.set_content(edited);

    assert!(matches!(
        composer.capture(frame),
        Err(AdForgeError::StaleFrame { .. })
    ));
}

// ============================================================================
// BATCH
// ============================================================================

const THREE_ROWS: &str = "name,price,specifications,brand,imageUrl,description\n\
iPhone 15 Pro,$999,128GB|A17 Pro,Apple,https://img.test/iphone.png,Refurbished\n\
Galaxy S24,$799,256GB,Samsung,https://img.test/missing.png\n\
Pixel 8,$549,128GB,Google,,Open box\n";

fn batch_settings(format: ExportFormat) -> ExportSettings {
    ExportSettings {
        format,
        target_size: TargetSize::new(80, 80, "thumb"),
        filename: "spring".to_string(),
        ..Default::default()
    }
}

fn orchestrator() -> BatchOrchestrator {
    let fetcher = StaticFetcher(HashMap::from([(
        "https://img.test/iphone.png".to_string(),
        studio_photo(),
    )]));
    BatchOrchestrator::new(Arc::new(fetcher), ExportGate::new())
}

#[tokio::test]
async fn test_batch_of_three_rows_makes_three_ordered_entries() {
    let rows = parse_batch_csv(THREE_ROWS).unwrap();
    let archive = orchestrator()
        .run(AdComposer::default(), &rows, &batch_settings(ExportFormat::Png))
        .await
        .unwrap()
        .unwrap();

    let expected = vec![
        "spring_iPhone_15_Pro_1.png".to_string(),
        "spring_Galaxy_S24_2.png".to_string(),
        "spring_Pixel_8_3.png".to_string(),
    ];
    assert_eq!(archive.entries, expected);
    assert_eq!(unzip_names(&archive.bytes), expected);

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(archive.filename, format!("spring_batch_{}.zip", today));
}

#[tokio::test]
async fn test_batch_pdf_entries_are_pdfs() {
    let rows = parse_batch_csv(THREE_ROWS).unwrap();
    let archive = orchestrator()
        .run(AdComposer::default(), &rows[..1], &batch_settings(ExportFormat::Pdf))
        .await
        .unwrap()
        .unwrap();

    let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes)).unwrap();
    let mut entry = zip.by_name("spring_iPhone_15_Pro_1.pdf").unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_header_only_batch_is_noop() {
    let rows = parse_batch_csv("name,price,specifications,brand,imageUrl,description\n").unwrap();
    assert!(rows.is_empty());
    let result = orchestrator()
        .run(AdComposer::default(), &rows, &batch_settings(ExportFormat::Png))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_batch_rejects_svg() {
    let rows = parse_batch_csv(THREE_ROWS).unwrap();
    let err = orchestrator()
        .run(AdComposer::default(), &rows, &batch_settings(ExportFormat::Svg))
        .await
        .unwrap_err();
    assert!(matches!(err, AdForgeError::UnsupportedFormat(ExportFormat::Svg)));
}

// ============================================================================
// TEMPLATES
// ============================================================================

#[test]
fn test_save_two_templates_delete_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTemplateStore::new(dir.path().join("templates.json"));
    let settings = TemplateSettings::default();

    let first = store.add("Launch", &product(), &settings).unwrap();
    let second = store
        .add(
            "Clearance",
            &ProductContent {
                price: "$499".to_string(),
                ..product()
            },
            &settings,
        )
        .unwrap();

    assert!(store.remove(first.id).unwrap());
    let remaining = FileTemplateStore::new(dir.path().join("templates.json"))
        .list()
        .unwrap();
    assert_eq!(remaining, vec![second]);
}
