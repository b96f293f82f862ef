//! Stroke transforms
//!
//! A stroke's transform parameters follow its base-shape parameters in the
//! fixed order scale(s), rotation, translation. Each group is present only
//! when the matching capability bit is set. Transforms are applied to the
//! query point in reverse (translate, then rotate, then scale) to reach the
//! base shape's unit space.

mod rotate;
mod scale;
mod translate;

pub use rotate::transform_rotate_euler_inv;
pub use scale::{transform_scale, transform_scale_nonuniform};
pub use translate::transform_translate;

use crate::autodiff::{Real, Vec3R};
use crate::catalog::Capabilities;

/// A query point mapped into a stroke's unit space
#[derive(Debug, Clone, Copy)]
pub struct UnitSpace<T> {
    /// Point in the base shape's unit space
    pub point: Vec3R<T>,
    /// Multiplier converting unit-space distances back to world space
    pub scale: T,
}

/// Map a world-space point into a stroke's unit space
///
/// `params` is the transform slice of the stroke's shape parameters (the
/// part after the base-shape parameters).
#[inline]
pub fn to_unit_space<T: Real>(point: Vec3R<T>, params: &[T], caps: Capabilities) -> UnitSpace<T> {
    let ns = caps.scale_len();
    let mut at = ns;
    let rotation = if caps.rotation {
        let r = Vec3R::from_slice(&params[at..at + 3]);
        at += 3;
        Some(r)
    } else {
        None
    };
    let translation = if caps.translation {
        Some(Vec3R::from_slice(&params[at..at + 3]))
    } else {
        None
    };

    let mut p = point;
    if let Some(t) = translation {
        p = transform_translate(p, t);
    }
    if let Some(r) = rotation {
        p = transform_rotate_euler_inv(p, r);
    }
    let (p, scale) = match ns {
        1 => transform_scale(p, params[0]),
        3 => transform_scale_nonuniform(p, Vec3R::from_slice(&params[0..3])),
        _ => (p, T::cst(1.0)),
    };
    UnitSpace { point: p, scale }
}
