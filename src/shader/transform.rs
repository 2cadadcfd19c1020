//! Coordinate transformation functions.

use std::f32::consts::PI;

/// Rotate a point around the origin.
///
/// # Parameters
/// - `x`, `y`: Point coordinates
/// - `angle`: Rotation angle in radians (clockwise on a y-down raster)
///
/// # Returns
/// Rotated (x, y) coordinates
#[inline]
pub fn rotate(x: f32, y: f32, angle: f32) -> (f32, f32) {
    let cos_a = angle.cos();
    let sin_a = angle.sin();
    (x * cos_a - y * sin_a, x * sin_a + y * cos_a)
}

/// Rotate a point around the origin (angle in degrees).
#[inline]
pub fn rotate_deg(x: f32, y: f32, angle_deg: f32) -> (f32, f32) {
    rotate(x, y, angle_deg * PI / 180.0)
}

/// Size of the axis-aligned box that contains a `width`×`height` rectangle
/// rotated by `angle_deg` around its center.
pub fn rotated_bounds(width: f32, height: f32, angle_deg: f32) -> (f32, f32) {
    let a = angle_deg * PI / 180.0;
    let (s, c) = (a.sin().abs(), a.cos().abs());
    (width * c + height * s, width * s + height * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        let (x, y) = rotate_deg(1.0, 0.0, 90.0);
        assert!(x.abs() < 1e-6);
        assert!((y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rotated_bounds() {
        let (w, h) = rotated_bounds(100.0, 50.0, 90.0);
        assert!((w - 50.0).abs() < 1e-3);
        assert!((h - 100.0).abs() < 1e-3);

        let (w, h) = rotated_bounds(10.0, 10.0, 45.0);
        assert!((w - 14.142).abs() < 1e-2);
        assert!((h - 14.142).abs() < 1e-2);
    }
}
