//! Color adjustment functions.
//!
//! All channel values are in [0, 1]. Percent-style amounts from the editor
//! (100 = unchanged) are converted to factors by the caller (`pct / 100`).

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Adjust contrast around a center point.
///
/// # Parameters
/// - `value`: Input value [0, 1]
/// - `center`: The midpoint that stays fixed (typically 0.5)
/// - `amount`: Contrast multiplier (>1 increases, <1 decreases)
#[inline]
pub fn contrast(value: f32, center: f32, amount: f32) -> f32 {
    clamp01(center + (value - center) * amount)
}

/// Scale brightness multiplicatively (CSS `brightness()` semantics).
///
/// `factor` 1.0 = unchanged, 0.0 = black, 2.0 = twice as bright.
#[inline]
pub fn brightness(value: f32, factor: f32) -> f32 {
    clamp01(value * factor.max(0.0))
}

/// Rec. 709 relative luminance of a linear-ish RGB triple.
#[inline]
pub fn luminance(rgb: [f32; 3]) -> f32 {
    0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2]
}

/// Saturate or desaturate an RGB triple (CSS `saturate()` matrix).
///
/// `amount` 1.0 = unchanged, 0.0 = grayscale, >1 oversaturates.
pub fn saturate(rgb: [f32; 3], amount: f32) -> [f32; 3] {
    let s = amount.max(0.0);
    let [r, g, b] = rgb;
    [
        clamp01((0.2126 + 0.7874 * s) * r + (0.7152 - 0.7152 * s) * g + (0.0722 - 0.0722 * s) * b),
        clamp01((0.2126 - 0.2126 * s) * r + (0.7152 + 0.2848 * s) * g + (0.0722 - 0.0722 * s) * b),
        clamp01((0.2126 - 0.2126 * s) * r + (0.7152 - 0.7152 * s) * g + (0.0722 + 0.9278 * s) * b),
    ]
}

/// Apply brightness, contrast and saturation factors to one RGB triple,
/// in the same order a CSS filter chain would.
pub fn adjust_rgb(rgb: [f32; 3], brightness_f: f32, contrast_f: f32, saturation_f: f32) -> [f32; 3] {
    let b = rgb.map(|c| brightness(c, brightness_f));
    let c = b.map(|v| contrast(v, 0.5, contrast_f.max(0.0)));
    saturate(c, saturation_f)
}
