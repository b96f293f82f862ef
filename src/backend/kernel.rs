//! Per-sample reference kernels
//!
//! Scalar building blocks shared by [`super::CpuBackend`]: one
//! (sample, stroke) evaluation generic over [`Real`], and the `over`
//! compositing law for one sample with its analytic gradient.

use crate::autodiff::{Real, Vec3R};
use crate::catalog::{Capabilities, ColorType};
use crate::primitives::BaseSdf;
use crate::transforms::to_unit_space;
use glam::Vec3;

use super::StrokeOptions;

/// A shape id and color id decoded once per call
#[derive(Debug, Clone, Copy)]
pub struct StrokeLayout {
    /// Base SDF
    pub base: BaseSdf,
    /// Transform groups
    pub caps: Capabilities,
    /// Color model
    pub color: ColorType,
}

/// Result of evaluating one stroke at one sample
#[derive(Debug, Clone, Copy)]
pub struct StrokeSample<T> {
    /// Opacity in `[0, 1]`
    pub alpha: T,
    /// RGB color
    pub color: [T; 3],
    /// World-space signed distance
    pub sdf: T,
    /// Sample position in the stroke's unit space
    pub unit_point: Vec3,
}

/// Map a signed distance to alpha over a transition of width `w`
#[inline]
pub fn distance_to_alpha<T: Real>(d: T, w: T, laplace: bool) -> T {
    if laplace {
        if d.value() <= 0.0 {
            T::cst(1.0) - (d / w).exp() * 0.5
        } else {
            (-d / w).exp() * 0.5
        }
    } else {
        (T::cst(0.5) - d / (w * 2.0)).clamp(0.0, 1.0)
    }
}

/// Evaluate one stroke at one sample
///
/// # Arguments
/// * `x` - Sample position
/// * `radius` - Sample footprint
/// * `viewdir` - View direction of the sample's ray
/// * `shape` - The stroke's shape parameters
/// * `color` - The stroke's color parameters
#[inline]
pub fn eval_stroke<T: Real>(
    layout: StrokeLayout,
    x: Vec3R<T>,
    radius: f32,
    viewdir: Vec3,
    shape: &[T],
    color: &[T],
    options: &StrokeOptions,
) -> StrokeSample<T> {
    let nb = layout.base.num_params();
    let unit = to_unit_space(x, &shape[nb..], layout.caps);
    let d_unit = layout.base.eval(unit.point, &shape[..nb]);
    let sdf = d_unit * unit.scale;

    let (d, r) = if options.inv_scale_radius {
        (d_unit, T::cst(radius) / unit.scale)
    } else {
        (sdf, T::cst(radius))
    };
    let w = T::cst(options.sdf_delta) + r;
    let alpha = distance_to_alpha(d, w, options.use_laplace_transform);

    StrokeSample {
        alpha,
        color: layout.color.eval(color, unit.point, viewdir),
        sdf,
        unit_point: unit.point.value(),
    }
}

/// `over` compositing of one sample
///
/// Strokes are visited in descending alpha (ties by index). Returns the
/// density and writes the normalised color into `out_color`.
pub fn over_sample(alpha: &[f32], color: &[f32], density: &[f32], out_color: &mut [f32]) -> f32 {
    let c = out_color.len();
    let order = over_order(alpha);
    let mut transmittance = 1.0;
    let mut total_w = 0.0;
    let mut out_density = 0.0;
    out_color.fill(0.0);
    for &s in &order {
        let w = alpha[s] * transmittance;
        out_density += w * density[s];
        total_w += w;
        for (o, &cs) in out_color.iter_mut().zip(&color[s * c..(s + 1) * c]) {
            *o += w * cs;
        }
        transmittance *= 1.0 - alpha[s];
    }
    if total_w > 0.0 {
        out_color.iter_mut().for_each(|o| *o /= total_w);
    }
    out_density
}

/// Gradient of [`over_sample`]
///
/// Accumulates into `g_alpha` (`[S]`), `g_color` (`[S, C]`) and
/// `g_density` (`[S]`).
#[allow(clippy::too_many_arguments)]
pub fn over_sample_backward(
    alpha: &[f32],
    color: &[f32],
    density: &[f32],
    grad_density: f32,
    grad_color: &[f32],
    g_alpha: &mut [f32],
    g_color: &mut [f32],
    g_density: &mut [f32],
) {
    let c = grad_color.len();
    let order = over_order(alpha);
    let k = order.len();

    let mut trans = Vec::with_capacity(k);
    let mut weights = Vec::with_capacity(k);
    let mut t = 1.0;
    for &s in &order {
        trans.push(t);
        weights.push(alpha[s] * t);
        t *= 1.0 - alpha[s];
    }
    let total_w: f32 = weights.iter().sum();
    let mut blended = vec![0.0; c];
    if total_w > 0.0 {
        for (&s, &w) in order.iter().zip(&weights) {
            for (b, &cs) in blended.iter_mut().zip(&color[s * c..(s + 1) * c]) {
                *b += w * cs / total_w;
            }
        }
    }

    // dL/dw_k for every visited stroke
    let g_w: Vec<f32> = order
        .iter()
        .map(|&s| {
            let mut g = grad_density * density[s];
            if total_w > 0.0 {
                for ((&gc, &cs), &b) in grad_color.iter().zip(&color[s * c..(s + 1) * c]).zip(&blended) {
                    g += gc * (cs - b) / total_w;
                }
            }
            g
        })
        .collect();

    // suffix[k] = d(sum_{j>k} g_w_j w_j) / dT_{k+1}, divided through
    let mut suffix = 0.0;
    for i in (0..k).rev() {
        let s = order[i];
        g_alpha[s] += trans[i] * (g_w[i] - suffix);
        g_density[s] += grad_density * weights[i];
        if total_w > 0.0 {
            for (gc_out, &gc) in g_color[s * c..(s + 1) * c].iter_mut().zip(grad_color) {
                *gc_out += gc * weights[i] / total_w;
            }
        }
        suffix = g_w[i] * alpha[s] + (1.0 - alpha[s]) * suffix;
    }
}

fn over_order(alpha: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..alpha.len()).collect();
    order.sort_by(|&a, &b| alpha[b].total_cmp(&alpha[a]));
    order
}
