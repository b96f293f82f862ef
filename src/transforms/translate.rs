//! Translation transform for strokes

use crate::autodiff::{Real, Vec3R};

/// Transform a point by inverse translation
#[inline(always)]
pub fn transform_translate<T: Real>(point: Vec3R<T>, offset: Vec3R<T>) -> Vec3R<T> {
    point - offset
}
