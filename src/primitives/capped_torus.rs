//! Unit capped torus SDF
//!
//! Based on Inigo Quilez's sdCappedTorus formula, major radius fixed to 1.

use crate::autodiff::{Real, Vec3R};

/// Exact SDF for a capped torus in the XY plane, opening towards +Y
///
/// - `cap_angle`: half opening angle in radians (0 = point, PI = full torus)
/// - `minor_radius`: tube radius
#[inline(always)]
pub fn sdf_unit_capped_torus<T: Real>(p: Vec3R<T>, cap_angle: T, minor_radius: T) -> T {
    let (s, c) = (cap_angle.sin(), cap_angle.cos());
    let px = p.x.abs();
    let k = if c.value() * px.value() > s.value() * p.y.value() {
        px * s + p.y * c
    } else {
        (px * px + p.y * p.y).sqrt()
    };
    (p.dot(p) + T::cst(1.0) - k * 2.0).sqrt() - minor_radius
}
