//! Unit sphere SDF

use crate::autodiff::{Real, Vec3R};

/// Signed distance to the unit sphere centered at origin
///
/// Radius is 1; the stroke scale sets the world radius.
#[inline(always)]
pub fn sdf_unit_sphere<T: Real>(p: Vec3R<T>) -> T {
    p.length() - T::cst(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn d(p: Vec3) -> f32 {
        sdf_unit_sphere(Vec3R::<f32>::constant(p))
    }

    #[test]
    fn test_sphere_origin() {
        assert!((d(Vec3::ZERO) + 1.0).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_surface() {
        assert!(d(Vec3::X).abs() < 0.0001);
        assert!(d(Vec3::Y).abs() < 0.0001);
        assert!(d(Vec3::Z).abs() < 0.0001);
    }

    #[test]
    fn test_sphere_outside() {
        assert!((d(Vec3::new(2.0, 0.0, 0.0)) - 1.0).abs() < 0.0001);
    }
}
