//! Product image placement: color adjustment, fit, scale and rotation.

use image::{RgbaImage, imageops::FilterType};

use crate::error::Result;
use crate::model::ImageAdjustments;
use crate::preprocess::decode_image;
use crate::shader::{adjust_rgb, alpha_over, rotate_deg, rotated_bounds};

/// Fraction of the surface the product image is fitted into at scale 100%.
pub const IMAGE_BOX_WIDTH: f32 = 0.60;
pub const IMAGE_BOX_HEIGHT: f32 = 0.55;

/// Apply brightness/contrast/saturation (percentages, 100 = identity).
///
/// Alpha is left untouched so removed backgrounds stay transparent.
pub fn apply_color_adjustments(img: &mut RgbaImage, adj: &ImageAdjustments) {
    if adj.is_color_identity() {
        return;
    }
    let (b, c, s) = (adj.brightness / 100.0, adj.contrast / 100.0, adj.saturation / 100.0);

    for pixel in img.pixels_mut() {
        let rgb = [
            pixel[0] as f32 / 255.0,
            pixel[1] as f32 / 255.0,
            pixel[2] as f32 / 255.0,
        ];
        let out = adjust_rgb(rgb, b, c, s);
        for i in 0..3 {
            pixel[i] = (out[i] * 255.0).round() as u8;
        }
    }
}

/// Display pixels per source pixel after contain-fitting into the image box
/// and scaling by `scale_pct`.
pub fn fit_factor(src_w: u32, src_h: u32, surface_w: u32, surface_h: u32, scale_pct: f32) -> f32 {
    let box_w = surface_w as f32 * IMAGE_BOX_WIDTH;
    let box_h = surface_h as f32 * IMAGE_BOX_HEIGHT;
    let fit = (box_w / src_w.max(1) as f32).min(box_h / src_h.max(1) as f32);
    fit * (scale_pct / 100.0).max(0.0)
}

/// Size of the image after contain-fitting into the image box and scaling.
///
/// Saturates at `u32::MAX`; see [`draw_product_image`] for how oversized
/// placements are handled.
pub fn fitted_size(src_w: u32, src_h: u32, surface_w: u32, surface_h: u32, scale_pct: f32) -> (u32, u32) {
    let factor = fit_factor(src_w, src_h, surface_w, surface_h, scale_pct);
    (
        ((src_w as f32 * factor).round() as u32).max(1),
        ((src_h as f32 * factor).round() as u32).max(1),
    )
}

/// Decode `bytes` and composite the adjusted product image onto `layer`.
///
/// A placement no larger than twice the layer is resized up front. Anything
/// bigger is sampled straight from the source, so memory stays bounded by the
/// source and the layer whatever the scale.
pub fn draw_product_image(layer: &mut RgbaImage, bytes: &[u8], adj: &ImageAdjustments) -> Result<()> {
    let mut source = decode_image(bytes, None)?.to_rgba8();
    let (sw, sh) = layer.dimensions();
    let (cx, cy) = adj.position.to_pixels(sw, sh);

    let (w, h) = fitted_size(source.width(), source.height(), sw, sh, adj.scale);
    let limit = sw.max(sh).saturating_mul(2);
    if w <= limit && h <= limit {
        let mut placed = image::imageops::resize(&source, w, h, FilterType::Triangle);
        apply_color_adjustments(&mut placed, adj);
        blit_rotated(layer, &placed, cx, cy, adj.rotation, 1.0);
    } else {
        let factor = fit_factor(source.width(), source.height(), sw, sh, adj.scale);
        apply_color_adjustments(&mut source, adj);
        blit_rotated(layer, &source, cx, cy, adj.rotation, factor);
    }
    Ok(())
}

/// Composite `src` onto `dst` centered at (cx, cy), magnified by `scale` and
/// rotated clockwise by `angle_deg`.
///
/// Uses inverse mapping with nearest-neighbor sampling; only destination
/// pixels are visited, so cost is bounded by `dst` regardless of `scale`.
pub fn blit_rotated(dst: &mut RgbaImage, src: &RgbaImage, cx: f32, cy: f32, angle_deg: f32, scale: f32) {
    if scale.is_nan() || scale <= 0.0 {
        return;
    }
    let (sw, sh) = (src.width() as f32, src.height() as f32);
    let (bw, bh) = if angle_deg % 360.0 == 0.0 {
        (sw * scale, sh * scale)
    } else {
        rotated_bounds(sw * scale, sh * scale, angle_deg)
    };

    let x0 = (cx - bw / 2.0).floor().max(0.0) as i64;
    let y0 = (cy - bh / 2.0).floor().max(0.0) as i64;
    let x1 = ((cx + bw / 2.0).ceil() as i64).min(dst.width() as i64);
    let y1 = ((cy + bh / 2.0).ceil() as i64).min(dst.height() as i64);

    for y in y0..y1 {
        for x in x0..x1 {
            // Pixel center, relative to the placement center, rotated back into source space
            let (rx, ry) = rotate_deg(x as f32 + 0.5 - cx, y as f32 + 0.5 - cy, -angle_deg);
            let sx = (rx / scale + sw / 2.0).floor();
            let sy = (ry / scale + sh / 2.0).floor();
            if sx < 0.0 || sy < 0.0 || sx >= sw || sy >= sh {
                continue;
            }
            let src_px = *src.get_pixel(sx as u32, sy as u32);
            if src_px[3] == 0 {
                continue;
            }
            let dst_px = dst.get_pixel_mut(x as u32, y as u32);
            *dst_px = alpha_over(*dst_px, src_px);
        }
    }
}
