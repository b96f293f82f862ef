//! Unit cube and unit round cube SDFs

use crate::autodiff::{Real, Vec3R};

/// Signed distance to an axis-aligned box with the given half extent on every axis
#[inline(always)]
fn sdf_box<T: Real>(p: Vec3R<T>, half: T) -> T {
    let h = Vec3R::new(half, half, half);
    let q = p.abs() - h;
    // Exterior length plus (non-positive) interior distance
    q.max_cst(0.0).length() + q.max_elem().min(T::cst(0.0))
}

/// Signed distance to the unit cube (half extent 1) centered at origin
#[inline(always)]
pub fn sdf_unit_cube<T: Real>(p: Vec3R<T>) -> T {
    sdf_box(p, T::cst(1.0))
}

/// Signed distance to a rounded unit cube
///
/// - `round`: edge rounding radius in [0, 1]; the outer half extent stays 1
#[inline(always)]
pub fn sdf_unit_round_cube<T: Real>(p: Vec3R<T>, round: T) -> T {
    sdf_box(p, T::cst(1.0) - round) - round
}
