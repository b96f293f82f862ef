//! Unit capsule and unit line (tapered capsule) SDFs

use crate::autodiff::{Real, Vec3R};

/// Signed distance to a vertical capsule of radius 1
///
/// - `half_height`: half the axis length (excluding caps)
#[inline(always)]
pub fn sdf_unit_capsule<T: Real>(p: Vec3R<T>, half_height: T) -> T {
    let dy = p.y - p.y.max(-half_height).min(half_height);
    (p.x * p.x + dy * dy + p.z * p.z).sqrt() - T::cst(1.0)
}

/// Signed distance to a tapered vertical capsule (rounded cone)
///
/// - Bottom sphere at y = -half_height with radius `1 + taper`
/// - Top sphere at y = half_height with radius `1 - taper`
#[inline(always)]
pub fn sdf_unit_line<T: Real>(p: Vec3R<T>, half_height: T, taper: T) -> T {
    let one = T::cst(1.0);
    let r1 = one + taper;
    let r2 = one - taper;
    let h = half_height * 2.0;
    let q_x = (p.x * p.x + p.z * p.z).sqrt();
    let q_y = p.y + half_height;

    let b = (r1 - r2) / h;
    if b.value().abs() >= 1.0 {
        // One end sphere swallows the other
        let top = q_y - h;
        let d1 = (q_x * q_x + q_y * q_y).sqrt() - r1;
        let d2 = (q_x * q_x + top * top).sqrt() - r2;
        return d1.min(d2);
    }
    let a = (one - b * b).sqrt();
    let k = q_x * (-b) + q_y * a;

    if k.value() < 0.0 {
        return (q_x * q_x + q_y * q_y).sqrt() - r1;
    }
    if k.value() > (a * h).value() {
        let dy = q_y - h;
        return (q_x * q_x + dy * dy).sqrt() - r2;
    }
    q_x * a + q_y * b - r1
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn v(x: f32, y: f32, z: f32) -> Vec3R<f32> {
        Vec3R::constant(Vec3::new(x, y, z))
    }

    #[test]
    fn test_capsule_axis_and_caps() {
        assert!((sdf_unit_capsule(v(0.0, 0.0, 0.0), 0.5) + 1.0).abs() < 1e-6);
        assert!(sdf_unit_capsule(v(0.0, 1.5, 0.0), 0.5).abs() < 1e-6);
        assert!(sdf_unit_capsule(v(1.0, 0.2, 0.0), 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_line_without_taper_is_capsule() {
        for p in [v(0.3, 0.1, 0.2), v(2.0, 0.0, 0.0), v(0.0, 3.0, 0.0)] {
            let a = sdf_unit_line(p, 0.5, 0.0);
            let b = sdf_unit_capsule(p, 0.5);
            assert!((a - b).abs() < 1e-5, "line={} capsule={}", a, b);
        }
    }

    #[test]
    fn test_line_taper_ends() {
        // Bottom end radius 1.5, top end radius 0.5
        assert!(sdf_unit_line(v(0.0, -2.5, 0.0), 1.0, 0.5).abs() < 1e-5);
        assert!(sdf_unit_line(v(0.0, 1.5, 0.0), 1.0, 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_line_degenerate_taper() {
        // |b| >= 1: bigger sphere contains the smaller one
        let d = sdf_unit_line(v(0.0, 0.0, 0.0), 0.25, 0.8);
        assert!(d.is_finite());
        assert!(d < 0.0);
    }
}
