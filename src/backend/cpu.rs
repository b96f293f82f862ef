//! Rayon reference backend
//!
//! Forward evaluates every (sample, stroke) pair in parallel over samples.
//! Backward differentiates the same generic kernel with dual numbers, one
//! seeded pass per differentiated scalar, and reduces parameter gradients
//! with a per-thread `fold` followed by a `reduce`.

use super::kernel::{eval_stroke, over_sample, over_sample_backward, StrokeLayout};
use super::{
    BackwardArgs, BackwardOutputs, ComposeArgs, ComposeGrads, ComposeOutputs, ForwardArgs, ForwardOutputs,
    StrokeBackend,
};
use crate::autodiff::{Dual, Vec3R};
use crate::catalog::ColorType;
use crate::color::spherical_texcoord;
use crate::error::{Result, StrokeError};
use glam::Vec3;
use rayon::prelude::*;

/// Color channels every built-in color model produces
const COLOR_DIM: usize = 3;

/// Outputs of one sample across all strokes
struct ForwardRow {
    alpha: Vec<f32>,
    color: Vec<f32>,
    sdf: Vec<f32>,
    texcoord: Vec<f32>,
}

impl ForwardRow {
    fn with_strokes(s: usize) -> Self {
        Self {
            alpha: Vec::with_capacity(s),
            color: Vec::with_capacity(s * COLOR_DIM),
            sdf: Vec::new(),
            texcoord: Vec::new(),
        }
    }
}

/// Multi-threaded CPU implementation of [`StrokeBackend`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    /// Create the backend
    pub fn new() -> Self {
        Self
    }
}

fn layout(args: &ForwardArgs<'_>) -> Result<StrokeLayout> {
    Ok(StrokeLayout {
        base: args.shape_id.base_sdf()?,
        caps: args.shape_id.capabilities(),
        color: ColorType::from_id(args.color_id)?,
    })
}

#[inline]
fn sample_point(x: &[f32], n: usize) -> Vec3 {
    Vec3::from_slice(&x[n * 3..n * 3 + 3])
}

#[inline]
fn sample_viewdir(args: &ForwardArgs<'_>, n: usize) -> Vec3 {
    let v = n / args.samples_per_view.max(1);
    Vec3::from_slice(&args.viewdir[v * 3..v * 3 + 3])
}

/// Sum of upstream gradients dotted with one dual evaluation
#[inline]
fn contract(alpha: Dual, color: &[Dual; 3], sdf: Dual, g_alpha: f32, g_color: &[f32], g_sdf: f32) -> f32 {
    let mut g = g_alpha * alpha.dot + g_sdf * sdf.dot;
    for (c, gc) in color.iter().zip(g_color) {
        g += gc * c.dot;
    }
    g
}

impl StrokeBackend for CpuBackend {
    fn stroke_forward(&self, args: &ForwardArgs<'_>) -> Result<ForwardOutputs> {
        let layout = layout(args)?;
        let n = args.num_samples();
        let s = args.num_strokes;
        let (ps, pc) = (args.dim_shape(), args.dim_color());
        let opts = args.options;

        let rows: Vec<ForwardRow> = (0..n)
            .into_par_iter()
            .map(|i| {
                let x = Vec3R::<f32>::constant(sample_point(args.x, i));
                let viewdir = sample_viewdir(args, i);
                let mut row = ForwardRow::with_strokes(s);
                for k in 0..s {
                    let out = eval_stroke(
                        layout,
                        x,
                        args.radius[i],
                        viewdir,
                        &args.shape_params[k * ps..(k + 1) * ps],
                        &args.color_params[k * pc..(k + 1) * pc],
                        &opts,
                    );
                    row.alpha.push(out.alpha);
                    row.color.extend(out.color);
                    if !opts.no_sdf {
                        row.sdf.push(out.sdf);
                    }
                    if opts.return_texcoord {
                        row.texcoord.extend(spherical_texcoord(out.unit_point));
                    }
                }
                row
            })
            .collect();

        let mut alpha = Vec::with_capacity(n * s);
        let mut color = Vec::with_capacity(n * s * COLOR_DIM);
        let mut sdf = Vec::new();
        let mut texcoord = Vec::new();
        for row in rows {
            alpha.extend(row.alpha);
            color.extend(row.color);
            sdf.extend(row.sdf);
            texcoord.extend(row.texcoord);
        }

        tracing::trace!(samples = n, strokes = s, "cpu stroke forward");
        Ok(ForwardOutputs {
            alpha,
            color,
            sdf: (!opts.no_sdf).then_some(sdf),
            texcoord: opts.return_texcoord.then_some(texcoord),
        })
    }

    fn stroke_backward(&self, args: &BackwardArgs<'_>) -> Result<BackwardOutputs> {
        let fwd = &args.forward;
        let layout = layout(fwd)?;
        let n = fwd.num_samples();
        let s = fwd.num_strokes;
        let (ps, pc) = (fwd.dim_shape(), fwd.dim_color());
        let opts = fwd.options;
        let request = args.request;

        let upstream = |i: usize, k: usize| {
            let idx = i * s + k;
            let g_alpha = args.grad_alpha[idx];
            let g_color = &args.grad_color[idx * COLOR_DIM..(idx + 1) * COLOR_DIM];
            let g_sdf = args.grad_sdf.map_or(0.0, |g| g[idx]);
            (g_alpha, g_color, g_sdf)
        };
        let is_zero = |g_alpha: f32, g_color: &[f32], g_sdf: f32| {
            g_alpha == 0.0 && g_sdf == 0.0 && g_color.iter().all(|&g| g == 0.0)
        };

        // Plain-valued parameter rows, reused as constants in every pass
        let shape_rows: Vec<Vec<Dual>> = fwd
            .shape_params
            .chunks(ps.max(1))
            .take(s)
            .map(|row| Dual::seeded(row, None))
            .collect();
        let color_rows: Vec<Vec<Dual>> = fwd
            .color_params
            .chunks(pc.max(1))
            .take(s)
            .map(|row| Dual::seeded(row, None))
            .collect();
        let empty: Vec<Dual> = Vec::new();
        let shape_row = |k: usize| shape_rows.get(k).unwrap_or(&empty);
        let color_row = |k: usize| color_rows.get(k).unwrap_or(&empty);

        let grad_x = request.x.then(|| {
            let mut grad = vec![0.0f32; n * 3];
            grad.par_chunks_mut(3).enumerate().for_each(|(i, g_out)| {
                let x = sample_point(fwd.x, i);
                let viewdir = sample_viewdir(fwd, i);
                for k in 0..s {
                    let (g_alpha, g_color, g_sdf) = upstream(i, k);
                    if is_zero(g_alpha, g_color, g_sdf) {
                        continue;
                    }
                    for (axis, g) in g_out.iter_mut().enumerate() {
                        let xd = Dual::seeded(&x.to_array(), Some(axis));
                        let out = eval_stroke(
                            layout,
                            Vec3R::from_slice(&xd),
                            fwd.radius[i],
                            viewdir,
                            shape_row(k),
                            color_row(k),
                            &opts,
                        );
                        *g += contract(out.alpha, &out.color, out.sdf, g_alpha, g_color, g_sdf);
                    }
                }
            });
            grad
        });

        let param_grads = if request.shape_params || request.color_params {
            let (gs, gc) = (0..n)
                .into_par_iter()
                .fold(
                    || (vec![0.0f32; s * ps], vec![0.0f32; s * pc]),
                    |(mut gs, mut gc), i| {
                        let x = Vec3R::<Dual>::constant(sample_point(fwd.x, i));
                        let viewdir = sample_viewdir(fwd, i);
                        for k in 0..s {
                            let (g_alpha, g_color, g_sdf) = upstream(i, k);
                            if is_zero(g_alpha, g_color, g_sdf) {
                                continue;
                            }
                            let shape_raw = &fwd.shape_params[k * ps..(k + 1) * ps];
                            let color_raw = &fwd.color_params[k * pc..(k + 1) * pc];
                            if request.shape_params {
                                for j in 0..ps {
                                    let shape = Dual::seeded(shape_raw, Some(j));
                                    let out =
                                        eval_stroke(layout, x, fwd.radius[i], viewdir, &shape, color_row(k), &opts);
                                    gs[k * ps + j] += contract(out.alpha, &out.color, out.sdf, g_alpha, g_color, g_sdf);
                                }
                            }
                            if request.color_params {
                                for j in 0..pc {
                                    let color = Dual::seeded(color_raw, Some(j));
                                    let out =
                                        eval_stroke(layout, x, fwd.radius[i], viewdir, shape_row(k), &color, &opts);
                                    gc[k * pc + j] += contract(out.alpha, &out.color, out.sdf, g_alpha, g_color, g_sdf);
                                }
                            }
                        }
                        (gs, gc)
                    },
                )
                .reduce(
                    || (vec![0.0f32; s * ps], vec![0.0f32; s * pc]),
                    |(mut a_s, mut a_c), (b_s, b_c)| {
                        a_s.iter_mut().zip(&b_s).for_each(|(a, b)| *a += b);
                        a_c.iter_mut().zip(&b_c).for_each(|(a, b)| *a += b);
                        (a_s, a_c)
                    },
                );
            Some((gs, gc))
        } else {
            None
        };

        tracing::trace!(samples = n, strokes = s, ?request, "cpu stroke backward");
        let (grad_shape, grad_color) = match param_grads {
            Some((gs, gc)) => (request.shape_params.then_some(gs), request.color_params.then_some(gc)),
            None => (None, None),
        };
        Ok(BackwardOutputs {
            grad_x,
            grad_shape,
            grad_color,
        })
    }

    fn compose_forward(&self, args: &ComposeArgs<'_>) -> Result<ComposeOutputs> {
        let s = args.num_strokes();
        let c = args.color_dim;
        let n = args.num_samples;
        if c == 0 {
            return Err(StrokeError::InvalidArgument("compose needs at least one color channel".into()));
        }

        let mut density = vec![0.0f32; n];
        let mut color = vec![0.0f32; n * c];
        if s > 0 {
            density
                .par_iter_mut()
                .zip(color.par_chunks_mut(c))
                .enumerate()
                .for_each(|(i, (d, c_out))| {
                    *d = over_sample(
                        &args.alpha[i * s..(i + 1) * s],
                        &args.color[i * s * c..(i + 1) * s * c],
                        args.density,
                        c_out,
                    );
                });
        }
        tracing::trace!(samples = n, strokes = s, "cpu over compose");
        Ok(ComposeOutputs { density, color })
    }

    fn compose_backward(
        &self,
        args: &ComposeArgs<'_>,
        grad_density: &[f32],
        grad_color: &[f32],
    ) -> Result<ComposeGrads> {
        let s = args.num_strokes();
        let c = args.color_dim;
        let n = args.num_samples;
        if c == 0 {
            return Err(StrokeError::InvalidArgument("compose needs at least one color channel".into()));
        }

        let mut g_alpha = vec![0.0f32; n * s];
        let mut g_color = vec![0.0f32; n * s * c];
        let g_density = if s == 0 {
            Vec::new()
        } else {
            g_alpha
                .par_chunks_mut(s)
                .zip(g_color.par_chunks_mut(s * c))
                .enumerate()
                .fold(
                    || vec![0.0f32; s],
                    |mut g_d, (i, (ga_row, gc_row))| {
                        over_sample_backward(
                            &args.alpha[i * s..(i + 1) * s],
                            &args.color[i * s * c..(i + 1) * s * c],
                            args.density,
                            grad_density[i],
                            &grad_color[i * c..(i + 1) * c],
                            ga_row,
                            gc_row,
                            &mut g_d,
                        );
                        g_d
                    },
                )
                .reduce(
                    || vec![0.0f32; s],
                    |mut a, b| {
                        a.iter_mut().zip(&b).for_each(|(x, y)| *x += y);
                        a
                    },
                )
        };
        Ok(ComposeGrads {
            alpha: g_alpha,
            color: g_color,
            density: g_density,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GradRequest, StrokeOptions};
    use crate::catalog::ShapeType;

    fn sphere_args<'a>(x: &'a [f32], radius: &'a [f32], viewdir: &'a [f32], shape: &'a [f32], color: &'a [f32]) -> ForwardArgs<'a> {
        ForwardArgs {
            x,
            radius,
            viewdir,
            samples_per_view: radius.len(),
            shape_params: shape,
            color_params: color,
            num_strokes: shape.len() / 4,
            shape_id: ShapeType::Sphere.shape_id(),
            color_id: ColorType::ConstantRgb.model().color_id,
            options: StrokeOptions {
                no_sdf: false,
                return_texcoord: true,
                ..StrokeOptions::default()
            },
        }
    }

    #[test]
    fn test_forward_layout() {
        let x = [0.0, 0.0, 0.0, 0.9, 0.0, 0.0];
        let radius = [0.01, 0.01];
        let viewdir = [0.0, 0.0, 1.0];
        let shape = [0.3, 0.0, 0.0, 0.0, 0.2, 1.0, 0.0, 0.0];
        let color = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let out = CpuBackend
            .stroke_forward(&sphere_args(&x, &radius, &viewdir, &shape, &color))
            .unwrap();
        assert_eq!(out.alpha.len(), 4);
        // sample 0 inside stroke 0, sample 1 inside stroke 1
        assert_eq!(out.alpha[0], 1.0);
        assert_eq!(out.alpha[1], 0.0);
        assert_eq!(out.alpha[2], 0.0);
        assert_eq!(out.alpha[3], 1.0);
        assert_eq!(&out.color[9..12], &[0.0, 1.0, 0.0]);
        let sdf = out.sdf.unwrap();
        assert!((sdf[0] + 0.3).abs() < 1e-6);
        assert_eq!(out.texcoord.unwrap().len(), 8);
    }

    #[test]
    fn test_backward_respects_request() {
        let x = [0.3, 0.0, 0.0];
        let radius = [0.02];
        let viewdir = [0.0, 0.0, 1.0];
        let shape = [0.3, 0.0, 0.0, 0.0];
        let color = [0.5, 0.5, 0.5];
        let fwd = sphere_args(&x, &radius, &viewdir, &shape, &color);
        let out = CpuBackend.stroke_forward(&fwd).unwrap();
        let grad_alpha = [1.0];
        let grad_color = [0.0; 3];
        let grads = CpuBackend
            .stroke_backward(&BackwardArgs {
                forward: fwd,
                alpha: &out.alpha,
                grad_alpha: &grad_alpha,
                grad_color: &grad_color,
                grad_sdf: None,
                request: GradRequest {
                    x: true,
                    shape_params: true,
                    color_params: false,
                },
            })
            .unwrap();
        assert!(grads.grad_color.is_none());
        let gx = grads.grad_x.unwrap();
        let gs = grads.grad_shape.unwrap();
        // Moving the sample outward lowers alpha; growing the sphere raises it
        assert!(gx[0] < 0.0);
        assert!(gs[0] > 0.0);
        // Translating the sphere along +x is the mirror of moving the sample
        assert!((gs[1] + gx[0]).abs() < 1e-4);
    }

    #[test]
    fn test_compose_rejects_empty_channels() {
        let args = ComposeArgs {
            alpha: &[0.5, 0.8],
            color: &[],
            density: &[1.0, 2.0],
            num_samples: 1,
            color_dim: 0,
        };
        assert!(matches!(CpuBackend.compose_forward(&args), Err(StrokeError::InvalidArgument(_))));
        assert!(matches!(
            CpuBackend.compose_backward(&args, &[1.0], &[]),
            Err(StrokeError::InvalidArgument(_))
        ));
    }
}
