//! Spline tube SDFs (quadratic Bezier, cubic Bezier, Catmull-Rom)
//!
//! Curves are flattened into a fixed number of segments; each segment is
//! treated as a capsule whose radius is interpolated between the start and
//! end radius along the curve parameter. This keeps the distance generic
//! over [`Real`] without an analytic root solve.

use crate::autodiff::{Real, Vec3R};

/// Number of polyline segments a curve is flattened into
pub const SPLINE_SEGMENTS: usize = 16;

/// Curve family evaluated by [`sdf_spline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplineKind {
    /// 3 control points
    QuadraticBezier,
    /// 4 control points
    CubicBezier,
    /// 4 control points, curve spans the middle two
    CatmullRom,
}

impl SplineKind {
    /// Number of 3D control points
    #[inline]
    pub const fn control_points(self) -> usize {
        match self {
            SplineKind::QuadraticBezier => 3,
            SplineKind::CubicBezier | SplineKind::CatmullRom => 4,
        }
    }

    /// Basis weights at parameter `t` (unused trailing weights are zero)
    #[inline(always)]
    fn weights(self, t: f32) -> [f32; 4] {
        let s = 1.0 - t;
        match self {
            SplineKind::QuadraticBezier => [s * s, 2.0 * s * t, t * t, 0.0],
            SplineKind::CubicBezier => [s * s * s, 3.0 * s * s * t, 3.0 * s * t * t, t * t * t],
            SplineKind::CatmullRom => {
                let t2 = t * t;
                let t3 = t2 * t;
                [
                    0.5 * (-t + 2.0 * t2 - t3),
                    0.5 * (2.0 - 5.0 * t2 + 3.0 * t3),
                    0.5 * (t + 4.0 * t2 - 3.0 * t3),
                    0.5 * (-t2 + t3),
                ]
            }
        }
    }

    fn point<T: Real>(self, ctrl: &[Vec3R<T>], t: f32) -> Vec3R<T> {
        let w = self.weights(t);
        let mut acc = ctrl[0].scale_f(w[0]);
        for (c, &wi) in ctrl.iter().zip(w.iter()).skip(1) {
            acc = acc + c.scale_f(wi);
        }
        acc
    }
}

/// Signed distance to a spline tube
///
/// `params` holds the control points (x, y, z each) followed by the start
/// and end radius.
pub fn sdf_spline<T: Real>(kind: SplineKind, p: Vec3R<T>, params: &[T]) -> T {
    let n = kind.control_points();
    let mut ctrl = [Vec3R::new(T::cst(0.0), T::cst(0.0), T::cst(0.0)); 4];
    for (i, c) in ctrl.iter_mut().take(n).enumerate() {
        *c = Vec3R::from_slice(&params[i * 3..i * 3 + 3]);
    }
    let r0 = params[n * 3];
    let r1 = params[n * 3 + 1];

    let step = 1.0 / SPLINE_SEGMENTS as f32;
    let mut a = kind.point(&ctrl[..n], 0.0);
    let mut best: Option<T> = None;
    for k in 0..SPLINE_SEGMENTS {
        let t0 = k as f32 * step;
        let b = kind.point(&ctrl[..n], t0 + step);
        let pa = p - a;
        let ba = b - a;
        let bb = ba.dot(ba);
        let h = if bb.value() > 1e-12 {
            (pa.dot(ba) / bb).clamp(0.0, 1.0)
        } else {
            T::cst(0.0)
        };
        let t = T::cst(t0) + h * step;
        let radius = r0 + (r1 - r0) * t;
        let d = (pa - ba.scale(h)).length() - radius;
        best = Some(match best {
            Some(m) => m.min(d),
            None => d,
        });
        a = b;
    }
    best.unwrap_or_else(|| T::cst(f32::INFINITY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn straight_quadratic() -> Vec<f32> {
        // (-1,0,0) -> (0,0,0) -> (1,0,0), radius 0.1 everywhere
        vec![-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.1, 0.1]
    }

    #[test]
    fn test_quadratic_straight_line() {
        let params = straight_quadratic();
        let d = sdf_spline(SplineKind::QuadraticBezier, Vec3R::constant(Vec3::new(0.0, 0.5, 0.0)), &params);
        assert!((d - 0.4).abs() < 1e-4, "got {}", d);
        let inside = sdf_spline(SplineKind::QuadraticBezier, Vec3R::constant(Vec3::ZERO), &params);
        assert!((inside + 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_radius_interpolates() {
        let mut params = straight_quadratic();
        params[9] = 0.0;
        params[10] = 0.2;
        // Near the end of the curve the radius is ~0.2
        let d = sdf_spline(SplineKind::QuadraticBezier, Vec3R::constant(Vec3::new(1.0, 0.5, 0.0)), &params);
        assert!((d - 0.3).abs() < 1e-3, "got {}", d);
    }

    #[test]
    fn test_cubic_endpoints_interpolated() {
        let params = vec![0.0, 0.0, 0.0, 0.3, 0.5, 0.0, 0.6, 0.5, 0.0, 1.0, 0.0, 0.0, 0.05, 0.05];
        let d0 = sdf_spline(SplineKind::CubicBezier, Vec3R::constant(Vec3::ZERO), &params);
        let d1 = sdf_spline(SplineKind::CubicBezier, Vec3R::constant(Vec3::X), &params);
        assert!((d0 + 0.05).abs() < 1e-4);
        assert!((d1 + 0.05).abs() < 1e-4);
    }

    #[test]
    fn test_catmull_rom_spans_middle_points() {
        let params = vec![-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.1, 0.1];
        let start = sdf_spline(SplineKind::CatmullRom, Vec3R::constant(Vec3::ZERO), &params);
        let end = sdf_spline(SplineKind::CatmullRom, Vec3R::constant(Vec3::X), &params);
        let before = sdf_spline(SplineKind::CatmullRom, Vec3R::constant(Vec3::new(-1.0, 0.0, 0.0)), &params);
        assert!((start + 0.1).abs() < 1e-4);
        assert!((end + 0.1).abs() < 1e-4);
        assert!((before - 0.9).abs() < 1e-4);
    }
}
