//! Unit tetrahedron SDF

use crate::autodiff::{Real, Vec3R};
use glam::Vec3;

/// Pre-normalized tetrahedron face normals
const TETRA_NORMALS: [Vec3; 4] = [
    Vec3::new(0.577_350_26, 0.577_350_26, 0.577_350_26),
    Vec3::new(-0.577_350_26, -0.577_350_26, 0.577_350_26),
    Vec3::new(-0.577_350_26, 0.577_350_26, -0.577_350_26),
    Vec3::new(0.577_350_26, -0.577_350_26, -0.577_350_26),
];

/// Center-to-face distance of the tetrahedron inscribed in the [-1, 1] cube
const FACE_DISTANCE: f32 = 0.577_350_26;

/// SDF bound for the regular tetrahedron with vertices on alternate corners of the [-1, 1] cube
#[inline(always)]
pub fn sdf_unit_tetrahedron<T: Real>(p: Vec3R<T>) -> T {
    let mut d = p.dot(Vec3R::constant(TETRA_NORMALS[0]));
    for n in &TETRA_NORMALS[1..] {
        d = d.max(p.dot(Vec3R::constant(*n)));
    }
    d - T::cst(FACE_DISTANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(p: Vec3) -> f32 {
        sdf_unit_tetrahedron(Vec3R::constant(p))
    }

    #[test]
    fn test_tetrahedron_center_inside() {
        assert!((d(Vec3::ZERO) + FACE_DISTANCE).abs() < 1e-6);
    }

    #[test]
    fn test_tetrahedron_vertex_on_surface() {
        assert!(d(Vec3::splat(-1.0)).abs() < 1e-5);
        assert!(d(Vec3::new(1.0, 1.0, -1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_tetrahedron_outside() {
        assert!(d(Vec3::splat(2.0)) > 0.0);
    }
}
