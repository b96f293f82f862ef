//! Euler rotation transform for strokes

use crate::autodiff::{Real, Vec3R};

/// Transform a point by the inverse of an XYZ Euler rotation
///
/// The forward rotation is `Rx(x) * Ry(y) * Rz(z)` (glam's `EulerRot::XYZ`),
/// so the inverse undoes X first, then Y, then Z.
///
/// # Arguments
/// * `point` - Query point
/// * `angles` - Rotation around X, Y and Z (radians)
#[inline(always)]
pub fn transform_rotate_euler_inv<T: Real>(point: Vec3R<T>, angles: Vec3R<T>) -> Vec3R<T> {
    let (sx, cx) = (angles.x.sin(), angles.x.cos());
    let (sy, cy) = (angles.y.sin(), angles.y.cos());
    let (sz, cz) = (angles.z.sin(), angles.z.cos());

    let p = point;
    let p = Vec3R::new(p.x, p.y * cx + p.z * sx, p.z * cx - p.y * sx);
    let p = Vec3R::new(p.x * cy - p.z * sy, p.y, p.x * sy + p.z * cy);
    Vec3R::new(p.x * cz + p.y * sz, p.y * cz - p.x * sz, p.z)
}
