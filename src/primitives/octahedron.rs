//! Unit octahedron SDF
//!
//! Based on Inigo Quilez's sdOctahedron (exact) formula.

use crate::autodiff::{Real, Vec3R};

/// Exact SDF for the regular octahedron with vertices at (±1, 0, 0), (0, ±1, 0), (0, 0, ±1)
#[inline(always)]
pub fn sdf_unit_octahedron<T: Real>(p: Vec3R<T>) -> T {
    let s = T::cst(1.0);
    let p = p.abs();
    let m = p.x + p.y + p.z - s;
    let mv = m.value();

    let q = if 3.0 * p.x.value() < mv {
        p
    } else if 3.0 * p.y.value() < mv {
        Vec3R::new(p.y, p.z, p.x)
    } else if 3.0 * p.z.value() < mv {
        Vec3R::new(p.z, p.x, p.y)
    } else {
        return m * 0.57735027; // 1/sqrt(3)
    };

    let k = ((q.z - q.y + s) * 0.5).clamp(0.0, 1.0);
    Vec3R::new(q.x, q.y - s + k, q.z - k).length()
}
