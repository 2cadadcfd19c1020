//! Single-page PDF wrapping an export bitmap.
//!
//! The page is exactly the bitmap's pixel size (1 px = 1 pt) and the image
//! covers it edge to edge, so nothing is scaled or letterboxed.

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::Write;

use crate::error::{AdForgeError, Result};

const IMAGE_NAME: &str = "Im0";

fn encode_err(e: impl std::fmt::Display) -> AdForgeError {
    AdForgeError::Encode(format!("PDF: {}", e))
}

/// Wrap `bitmap` in a one-page PDF document.
pub fn export_as_document(bitmap: &RgbaImage) -> Result<Vec<u8>> {
    let (width, height) = bitmap.dimensions();
    if width == 0 || height == 0 {
        return Err(AdForgeError::Encode("PDF: empty bitmap".to_string()));
    }
    let (w, h) = (width as i64, height as i64);

    // Bitmaps from the exporter are opaque; drop alpha
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for px in bitmap.pixels() {
        rgb.extend_from_slice(&px.0[..3]);
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&rgb)?;
    let compressed = encoder.finish()?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => w,
            "Height" => h,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "FlateDecode",
        },
        compressed,
    )
    .with_compression(false);
    let image_id = doc.add_object(image);

    // Scale the unit image square to the full page
    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Integer(w),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(h),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ),
            Operation::new("Do", vec![Object::Name(IMAGE_NAME.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().map_err(encode_err)?));

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(w),
        Object::Integer(h),
    ];
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                IMAGE_NAME => image_id,
            },
        },
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).map_err(encode_err)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn media_box(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        page.get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_page_matches_bitmap_size() {
        let bitmap = RgbaImage::from_pixel(40, 30, Rgba([10, 20, 30, 255]));
        let pdf = export_as_document(&bitmap).unwrap();
        assert!(pdf.starts_with(b"%PDF-1.5"));
        assert_eq!(media_box(&pdf), vec![0, 0, 40, 30]);
    }

    #[test]
    fn test_image_stream_is_flate_rgb() {
        let bitmap = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let pdf = export_as_document(&bitmap).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();

        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|t| t.as_name()).ok() == Some(b"Image".as_slice()))
            .unwrap();
        let raw = image.decompressed_content().unwrap();
        assert_eq!(raw.len(), 3 * 2 * 3);
        assert_eq!(&raw[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_empty_bitmap_is_an_error() {
        assert!(export_as_document(&RgbaImage::new(0, 0)).is_err());
    }
}
