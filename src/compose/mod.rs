//! Compositing of per-stroke contributions
//!
//! Reduces the stroke axis of `alphas [..., S]` and `colors [..., S, C]`,
//! together with one density parameter per stroke, into a single density
//! `[...]` and color `[..., C]` per sample.
//!
//! | strategy                   | reduction                                         |
//! |----------------------------|---------------------------------------------------|
//! | `over`                     | front-to-back alpha compositing (backend)         |
//! | `max`                      | stroke with the largest alpha                     |
//! | `max_density_weighted`     | stroke with the largest `alpha * density`         |
//! | `softmax`                  | `softmax(alpha / 0.05)` weighted sum              |
//! | `softmax_density_weighted` | `softmax(alpha * density / 0.05)` weighted sum    |

pub mod reduce;

pub use reduce::SOFTMAX_TEMPERATURE;

use crate::backend::{ComposeArgs, CpuBackend, StrokeBackend};
use crate::error::{Result, StrokeError};
use crate::tensor::Tensor;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composition strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionType {
    /// Alpha compositing, delegated to the backend
    #[default]
    Over,
    /// Hard selection by alpha
    Max,
    /// Hard selection by `alpha * density`
    MaxDensityWeighted,
    /// Soft selection by alpha
    Softmax,
    /// Soft selection by `alpha * density`
    SoftmaxDensityWeighted,
}

/// Every strategy
pub const ALL_COMPOSITION_TYPES: [CompositionType; 5] = [
    CompositionType::Over,
    CompositionType::Max,
    CompositionType::MaxDensityWeighted,
    CompositionType::Softmax,
    CompositionType::SoftmaxDensityWeighted,
];

impl CompositionType {
    /// Configuration name
    pub const fn name(self) -> &'static str {
        match self {
            CompositionType::Over => "over",
            CompositionType::Max => "max",
            CompositionType::MaxDensityWeighted => "max_density_weighted",
            CompositionType::Softmax => "softmax",
            CompositionType::SoftmaxDensityWeighted => "softmax_density_weighted",
        }
    }

    #[inline]
    fn density_weighted(self) -> bool {
        matches!(
            self,
            CompositionType::MaxDensityWeighted | CompositionType::SoftmaxDensityWeighted
        )
    }
}

impl FromStr for CompositionType {
    type Err = StrokeError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_COMPOSITION_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| StrokeError::UnknownStrategy(s.to_string()))
    }
}

impl fmt::Display for CompositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Composited density and color
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    /// `[...]`
    pub density: Tensor,
    /// `[..., C]`
    pub color: Tensor,
}

/// Gradients of a composition
#[derive(Debug, Clone)]
pub struct CompositeGrads {
    /// Same shape as `alphas`
    pub alphas: Tensor,
    /// Same shape as `colors`
    pub colors: Tensor,
    /// `[S]`
    pub density_params: Tensor,
}

/// Inputs saved for [`CompositeTape::backward`]
#[derive(Debug)]
pub struct CompositeTape<'a, B> {
    compositor: &'a Compositor<B>,
    alphas: Tensor,
    colors: Tensor,
    density_params: Tensor,
}

/// Stroke compositor for one strategy
#[derive(Debug, Clone)]
pub struct Compositor<B = CpuBackend> {
    strategy: CompositionType,
    backend: B,
}

impl Compositor<CpuBackend> {
    /// Compositor on the reference CPU backend
    pub fn new(strategy: CompositionType) -> Self {
        Self::with_backend(strategy, CpuBackend)
    }
}

struct Dims {
    lead: Vec<usize>,
    samples: usize,
    strokes: usize,
    channels: usize,
}

impl<B: StrokeBackend> Compositor<B> {
    /// Compositor on a caller-provided backend
    pub fn with_backend(strategy: CompositionType, backend: B) -> Self {
        Self { strategy, backend }
    }

    /// Active strategy
    #[inline]
    pub fn strategy(&self) -> CompositionType {
        self.strategy
    }

    fn check(alphas: &Tensor, colors: &Tensor, density_params: &Tensor) -> Result<Dims> {
        if alphas.ndim() == 0 || colors.ndim() != alphas.ndim() + 1 || &colors.shape()[..alphas.ndim()] != alphas.shape() {
            return Err(StrokeError::InvalidArgument(format!(
                "colors must be alphas shape + [C], got {:?} and {:?}",
                alphas.shape(),
                colors.shape()
            )));
        }
        if colors.last_dim() == 0 {
            return Err(StrokeError::InvalidArgument(format!(
                "colors need at least one channel, got {:?}",
                colors.shape()
            )));
        }
        if density_params.ndim() != 1 {
            return Err(StrokeError::InvalidArgument(format!(
                "density params must be 1-D, got {:?}",
                density_params.shape()
            )));
        }
        let strokes = alphas.last_dim();
        if density_params.numel() != strokes {
            return Err(StrokeError::mismatch("stroke count", &[strokes], density_params.shape()));
        }
        let lead = alphas.shape()[..alphas.ndim() - 1].to_vec();
        Ok(Dims {
            samples: lead.iter().product(),
            lead,
            strokes,
            channels: colors.last_dim(),
        })
    }

    /// Reduce the stroke axis
    ///
    /// # Errors
    /// `InvalidArgument` when `colors` is not `alphas` plus a non-empty
    /// channel axis, `ShapeMismatch` when the stroke count disagrees with `density_params`.
    /// No reduction runs in either case.
    pub fn compose(&self, alphas: &Tensor, colors: &Tensor, density_params: &Tensor) -> Result<CompositeOutput> {
        let dims = Self::check(alphas, colors, density_params)?;
        tracing::trace!(
            strategy = %self.strategy,
            samples = dims.samples,
            strokes = dims.strokes,
            "compose"
        );
        let args = ComposeArgs {
            alpha: alphas.data(),
            color: colors.data(),
            density: density_params.data(),
            num_samples: dims.samples,
            color_dim: dims.channels,
        };

        let (density, color) = match self.strategy {
            CompositionType::Over => {
                let out = self.backend.compose_forward(&args)?;
                (out.density, out.color)
            }
            strategy => reduce_local(strategy, &args),
        };

        let mut color_shape = dims.lead.clone();
        color_shape.push(dims.channels);
        Ok(CompositeOutput {
            density: Tensor::new(dims.lead, density)?,
            color: Tensor::new(color_shape, color)?,
        })
    }

    /// [`Compositor::compose`], keeping the inputs for a backward call
    pub fn compose_with_grad(
        &self,
        alphas: &Tensor,
        colors: &Tensor,
        density_params: &Tensor,
    ) -> Result<(CompositeOutput, CompositeTape<'_, B>)> {
        let out = self.compose(alphas, colors, density_params)?;
        Ok((
            out,
            CompositeTape {
                compositor: self,
                alphas: alphas.clone(),
                colors: colors.clone(),
                density_params: density_params.clone(),
            },
        ))
    }
}

fn reduce_local(strategy: CompositionType, args: &ComposeArgs<'_>) -> (Vec<f32>, Vec<f32>) {
    let samples = args.num_samples;
    let s = args.num_strokes();
    let c = args.color_dim;
    let weighted = strategy.density_weighted();
    let mut density = vec![0.0f32; samples];
    let mut color = vec![0.0f32; samples * c];
    density
        .par_iter_mut()
        .zip(color.par_chunks_mut(c))
        .enumerate()
        .for_each(|(i, (d, c_out))| {
            let alpha = &args.alpha[i * s..(i + 1) * s];
            let col = &args.color[i * s * c..(i + 1) * s * c];
            *d = match strategy {
                CompositionType::Max | CompositionType::MaxDensityWeighted => {
                    reduce::max_sample(alpha, col, args.density, weighted, c_out)
                }
                _ => reduce::softmax_sample(alpha, col, args.density, weighted, c_out),
            };
        });
    (density, color)
}

impl<B: StrokeBackend> CompositeTape<'_, B> {
    /// Gradients with respect to alphas, colors and density params
    ///
    /// `grad_density` is `[...]` and `grad_color` is `[..., C]`, matching
    /// the forward outputs.
    pub fn backward(self, grad_density: &Tensor, grad_color: &Tensor) -> Result<CompositeGrads> {
        let dims = Compositor::<B>::check(&self.alphas, &self.colors, &self.density_params)?;
        if grad_density.shape() != dims.lead.as_slice() {
            return Err(StrokeError::mismatch("grad density", &dims.lead, grad_density.shape()));
        }
        let mut color_shape = dims.lead.clone();
        color_shape.push(dims.channels);
        if grad_color.shape() != color_shape.as_slice() {
            return Err(StrokeError::mismatch("grad color", &color_shape, grad_color.shape()));
        }

        let strategy = self.compositor.strategy;
        let args = ComposeArgs {
            alpha: self.alphas.data(),
            color: self.colors.data(),
            density: self.density_params.data(),
            num_samples: dims.samples,
            color_dim: dims.channels,
        };
        tracing::trace!(%strategy, samples = dims.samples, strokes = dims.strokes, "compose backward");

        let (g_alpha, g_color, g_density) = match strategy {
            CompositionType::Over => {
                let g = self
                    .compositor
                    .backend
                    .compose_backward(&args, grad_density.data(), grad_color.data())?;
                (g.alpha, g.color, g.density)
            }
            strategy => backward_local(strategy, &args, grad_density.data(), grad_color.data()),
        };

        Ok(CompositeGrads {
            alphas: Tensor::new(self.alphas.shape().to_vec(), g_alpha)?,
            colors: Tensor::new(self.colors.shape().to_vec(), g_color)?,
            density_params: Tensor::new([dims.strokes], g_density)?,
        })
    }
}

fn backward_local(
    strategy: CompositionType,
    args: &ComposeArgs<'_>,
    grad_density: &[f32],
    grad_color: &[f32],
) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let samples = args.num_samples;
    let s = args.num_strokes();
    let c = args.color_dim;
    let weighted = strategy.density_weighted();
    let mut g_alpha = vec![0.0f32; samples * s];
    let mut g_color = vec![0.0f32; samples * s * c];
    if s == 0 {
        return (g_alpha, g_color, vec![0.0; s]);
    }
    let g_density = g_alpha
        .par_chunks_mut(s)
        .zip(g_color.par_chunks_mut(s * c))
        .enumerate()
        .fold(
            || vec![0.0f32; s],
            |mut g_d, (i, (ga, gc))| {
                let alpha = &args.alpha[i * s..(i + 1) * s];
                let gc_up = &grad_color[i * c..(i + 1) * c];
                match strategy {
                    CompositionType::Max | CompositionType::MaxDensityWeighted => reduce::max_sample_backward(
                        alpha,
                        args.density,
                        weighted,
                        grad_density[i],
                        gc_up,
                        ga,
                        gc,
                        &mut g_d,
                    ),
                    _ => reduce::softmax_sample_backward(
                        alpha,
                        &args.color[i * s * c..(i + 1) * s * c],
                        args.density,
                        weighted,
                        grad_density[i],
                        gc_up,
                        ga,
                        gc,
                        &mut g_d,
                    ),
                }
                g_d
            },
        )
        .reduce(
            || vec![0.0f32; s],
            |mut a, b| {
                a.iter_mut().zip(&b).for_each(|(x, y)| *x += y);
                a
            },
        );
    (g_alpha, g_color, g_density)
}

/// Composite with a strategy given by name on the reference backend
///
/// Fails with `UnknownStrategy` for an unrecognised name.
pub fn composite(alphas: &Tensor, colors: &Tensor, density_params: &Tensor, strategy: &str) -> Result<CompositeOutput> {
    let strategy: CompositionType = strategy.parse()?;
    Compositor::new(strategy).compose(alphas, colors, density_params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        for t in ALL_COMPOSITION_TYPES {
            assert_eq!(t.name().parse::<CompositionType>().unwrap(), t);
        }
        assert!(matches!(
            "average".parse::<CompositionType>(),
            Err(StrokeError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_colors_must_extend_alphas() {
        let alphas = Tensor::new([1, 2], vec![0.5, 0.5]).unwrap();
        let colors = Tensor::new([2, 2, 3], vec![0.0; 12]).unwrap();
        let density = Tensor::from_vec(vec![1.0, 1.0]);
        let err = Compositor::new(CompositionType::Max)
            .compose(&alphas, &colors, &density)
            .unwrap_err();
        assert!(matches!(err, StrokeError::InvalidArgument(_)));
    }

    #[test]
    fn test_zero_strokes() {
        let alphas = Tensor::zeros([4, 0]);
        let colors = Tensor::zeros([4, 0, 3]);
        let density = Tensor::zeros([0]);
        for t in ALL_COMPOSITION_TYPES {
            let out = Compositor::new(t).compose(&alphas, &colors, &density).unwrap();
            assert_eq!(out.density.data(), &[0.0; 4]);
            assert_eq!(out.color.shape(), &[4, 3]);
        }
    }
}
