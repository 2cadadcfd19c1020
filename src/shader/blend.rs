//! Blending and interpolation functions.

use image::Rgba;

/// Linear interpolation between two values.
///
/// Returns `a` when `t=0`, `b` when `t=1`, and linear blend in between.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Porter-Duff "source over" with straight (non-premultiplied) alpha.
///
/// Compositing anything over an opaque destination yields an opaque pixel.
pub fn alpha_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    if sa >= 1.0 {
        return src;
    }
    if sa <= 0.0 {
        return dst;
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let sc = src[c] as f32;
        let dc = dst[c] as f32;
        let v = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        out[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}

/// Scale a pixel's alpha by `coverage` in [0, 1].
#[inline]
pub fn with_coverage(color: Rgba<u8>, coverage: f32) -> Rgba<u8> {
    let a = lerp(0.0, color[3] as f32, coverage.clamp(0.0, 1.0));
    Rgba([color[0], color[1], color[2], a.round() as u8])
}
