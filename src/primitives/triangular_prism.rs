//! Unit triangular prism SDF

use crate::autodiff::{Real, Vec3R};

/// SDF for a triangular prism along Z with an equilateral cross-section
///
/// - Cross-section inradius is 1
/// - `half_depth`: half the prism depth along Z
#[inline(always)]
pub fn sdf_unit_triprism<T: Real>(p: Vec3R<T>, half_depth: T) -> T {
    let q = p.abs();
    // 0.866025 = sqrt(3)/2
    let side = (q.x * 0.866025 + p.y * 0.5).max(-p.y) - T::cst(1.0);
    (q.z - half_depth).max(side)
}
