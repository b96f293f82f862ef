//! Stroke color models
//!
//! Every model produces an RGB triple. `constant_rgb` is a flat color,
//! `gradient_rgb` blends two colors along an axis in the stroke's unit
//! space, and the SH models are view-dependent (degree 1 and degree 2 real
//! spherical harmonics, coefficient `k` of channel `c` at index `k * 3 + c`).

use crate::autodiff::{Real, Vec3R};
use crate::catalog::ColorType;
use glam::Vec3;
use std::f32::consts::{PI, TAU};

const SH_C0: f32 = 0.282_094_8;
const SH_C1: f32 = 0.488_602_5;
const SH_C2: [f32; 5] = [1.092_548_4, -1.092_548_4, 0.315_391_57, -1.092_548_4, 0.546_274_2];

/// Real SH basis up to `degree` at a unit direction
///
/// Returns the basis values in the first `(degree + 1)^2` slots.
pub fn sh_basis(dir: Vec3, degree: usize) -> [f32; 9] {
    let mut b = [0.0; 9];
    b[0] = SH_C0;
    if degree >= 1 {
        b[1] = -SH_C1 * dir.y;
        b[2] = SH_C1 * dir.z;
        b[3] = -SH_C1 * dir.x;
    }
    if degree >= 2 {
        let (x, y, z) = (dir.x, dir.y, dir.z);
        b[4] = SH_C2[0] * x * y;
        b[5] = SH_C2[1] * y * z;
        b[6] = SH_C2[2] * (2.0 * z * z - x * x - y * y);
        b[7] = SH_C2[3] * x * z;
        b[8] = SH_C2[4] * (x * x - y * y);
    }
    b
}

fn eval_sh<T: Real>(params: &[T], viewdir: Vec3, degree: usize) -> [T; 3] {
    let basis = sh_basis(viewdir.normalize_or_zero(), degree);
    let n = (degree + 1) * (degree + 1);
    let mut out = [T::cst(0.5); 3];
    for (k, &bk) in basis.iter().take(n).enumerate() {
        for (c, o) in out.iter_mut().enumerate() {
            *o = *o + params[k * 3 + c] * bk;
        }
    }
    out.map(|v| v.max(T::cst(0.0)))
}

fn eval_gradient<T: Real>(params: &[T], p: Vec3R<T>) -> [T; 3] {
    let p0 = Vec3R::from_slice(&params[0..3]);
    let p1 = Vec3R::from_slice(&params[3..6]);
    let axis = p1 - p0;
    let len2 = axis.dot(axis);
    let t = if len2.value() > 1e-12 {
        ((p - p0).dot(axis) / len2).clamp(0.0, 1.0)
    } else {
        T::cst(0.0)
    };
    let c0 = Vec3R::from_slice(&params[6..9]);
    let c1 = Vec3R::from_slice(&params[9..12]);
    let c = c0.lerp(c1, t);
    [c.x, c.y, c.z]
}

impl ColorType {
    /// Evaluate the color of a stroke
    ///
    /// # Arguments
    /// * `params` - The stroke's color parameters
    /// * `unit_point` - Sample position in the stroke's unit space
    /// * `viewdir` - Ray direction (need not be normalised)
    #[inline]
    pub fn eval<T: Real>(self, params: &[T], unit_point: Vec3R<T>, viewdir: Vec3) -> [T; 3] {
        match self {
            ColorType::ConstantRgb => [params[0], params[1], params[2]],
            ColorType::GradientRgb => eval_gradient(params, unit_point),
            ColorType::ConstantSh2 => eval_sh(params, viewdir, 1),
            ColorType::ConstantSh3 => eval_sh(params, viewdir, 2),
        }
    }
}

/// Spherical texture coordinate of a unit-space point, in `[0, 1]^2`
pub fn spherical_texcoord(p: Vec3) -> [f32; 2] {
    let len = p.length();
    if len < 1e-12 {
        return [0.5, 0.5];
    }
    let u = 0.5 + p.z.atan2(p.x) / TAU;
    let v = (p.y / len).clamp(-1.0, 1.0).acos() / PI;
    [u, v]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::Dual;

    #[test]
    fn test_constant_rgb_copies_params() {
        let c = ColorType::ConstantRgb.eval(&[0.1_f32, 0.2, 0.3], Vec3R::constant(Vec3::ONE), Vec3::Z);
        assert_eq!(c, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_gradient_endpoints() {
        let params = [
            -1.0_f32, 0.0, 0.0, 1.0, 0.0, 0.0, // anchors
            1.0, 0.0, 0.0, 0.0, 0.0, 1.0, // red -> blue
        ];
        let at = |x: f32| ColorType::GradientRgb.eval(&params, Vec3R::constant(Vec3::new(x, 0.3, 0.0)), Vec3::Z);
        assert_eq!(at(-2.0), [1.0, 0.0, 0.0]);
        assert_eq!(at(2.0), [0.0, 0.0, 1.0]);
        let mid = at(0.0);
        assert!((mid[0] - 0.5).abs() < 1e-6 && (mid[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_sh_dc_term_only() {
        // DC coefficient of 1 everywhere -> 0.5 + C0, view independent
        let mut params = [0.0_f32; 27];
        params[..3].copy_from_slice(&[1.0, 1.0, 1.0]);
        let a = ColorType::ConstantSh3.eval(&params, Vec3R::constant(Vec3::ZERO), Vec3::X);
        let b = ColorType::ConstantSh3.eval(&params, Vec3R::constant(Vec3::ZERO), Vec3::new(0.0, -3.0, 0.0));
        for c in 0..3 {
            assert!((a[c] - (0.5 + SH_C0)).abs() < 1e-6);
            assert!((a[c] - b[c]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sh_clamps_at_zero() {
        let params = [-10.0_f32; 12];
        let c = ColorType::ConstantSh2.eval(&params, Vec3R::constant(Vec3::ZERO), Vec3::Z);
        assert_eq!(c, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sh_gradient_is_basis() {
        // d color_r / d coeff(k=2, c=0) is the z basis function
        let mut raw = [0.0_f32; 12];
        raw[0] = 1.0;
        let params = Dual::seeded(&raw, Some(2 * 3));
        let c = ColorType::ConstantSh2.eval(&params, Vec3R::constant(Vec3::ZERO), Vec3::Z);
        assert!((c[0].dot - SH_C1).abs() < 1e-6);
        assert_eq!(c[1].dot, 0.0);
    }

    #[test]
    fn test_texcoord_range() {
        for p in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::new(-0.3, 0.2, -0.9), Vec3::ZERO] {
            let [u, v] = spherical_texcoord(p);
            assert!((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v));
        }
        assert!(spherical_texcoord(Vec3::Y)[1].abs() < 1e-6);
    }
}
