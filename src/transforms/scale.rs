//! Scale transforms for strokes

use crate::autodiff::{Real, Vec3R};

/// Transform a point by inverse uniform scale
///
/// # Returns
/// (transformed_point, distance_multiplier)
#[inline(always)]
pub fn transform_scale<T: Real>(point: Vec3R<T>, factor: T) -> (Vec3R<T>, T) {
    let inv = T::cst(1.0) / factor;
    (point.scale(inv), factor)
}

/// Transform a point by inverse non-uniform scale
///
/// The distance is multiplied by the smallest factor, which keeps it a
/// conservative bound.
///
/// # Returns
/// (transformed_point, approximate_distance_multiplier)
#[inline(always)]
pub fn transform_scale_nonuniform<T: Real>(point: Vec3R<T>, factors: Vec3R<T>) -> (Vec3R<T>, T) {
    (point.div_elem(factors), factors.min_elem())
}
