//! Accelerated kernel call contract
//!
//! The evaluation operator and the `over` compositor never do geometry math
//! themselves. They validate and flatten their inputs, then hand them to a
//! [`StrokeBackend`]. Any implementation honouring the layouts documented
//! on the argument structs is interchangeable (vectorised CPU, GPU compute,
//! or the rayon reference in [`CpuBackend`]).
//!
//! All buffers are flat and row-major. `N` is the flattened sample count,
//! `S` the stroke count, `Ps`/`Pc` the shape/color parameter widths and
//! `C` the color channel count.

mod cpu;
pub mod kernel;

pub use cpu::CpuBackend;

use crate::catalog::{ColorId, ShapeId};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Kernel flags of a stroke evaluation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeOptions {
    /// Softness of the distance-to-alpha transition
    pub sdf_delta: f32,
    /// Laplace-CDF transition instead of the linear ramp
    pub use_laplace_transform: bool,
    /// Measure distance and sample radius in the stroke's unit space
    pub inv_scale_radius: bool,
    /// Skip the raw SDF output
    pub no_sdf: bool,
    /// Produce spherical texture coordinates
    pub return_texcoord: bool,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            sdf_delta: 0.01,
            use_laplace_transform: false,
            inv_scale_radius: false,
            no_sdf: true,
            return_texcoord: false,
        }
    }
}

/// Inputs of a stroke forward call
#[derive(Debug, Clone, Copy)]
pub struct ForwardArgs<'a> {
    /// `[N, 3]` sample positions
    pub x: &'a [f32],
    /// `[N]` sample footprints
    pub radius: &'a [f32],
    /// `[N / samples_per_view, 3]` view directions
    pub viewdir: &'a [f32],
    /// Consecutive samples sharing one view direction
    pub samples_per_view: usize,
    /// `[S, Ps]`
    pub shape_params: &'a [f32],
    /// `[S, Pc]`
    pub color_params: &'a [f32],
    /// `S`
    pub num_strokes: usize,
    /// Packed shape id
    pub shape_id: ShapeId,
    /// Color model id
    pub color_id: ColorId,
    /// Kernel flags
    pub options: StrokeOptions,
}

impl ForwardArgs<'_> {
    /// `N`
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.radius.len()
    }

    /// `Ps`
    #[inline]
    pub fn dim_shape(&self) -> usize {
        self.shape_params.len().checked_div(self.num_strokes).unwrap_or(0)
    }

    /// `Pc`
    #[inline]
    pub fn dim_color(&self) -> usize {
        self.color_params.len().checked_div(self.num_strokes).unwrap_or(0)
    }
}

/// Outputs of a stroke forward call
#[derive(Debug, Clone, Default)]
pub struct ForwardOutputs {
    /// `[N, S]`, every value in `[0, 1]`
    pub alpha: Vec<f32>,
    /// `[N, S, C]`
    pub color: Vec<f32>,
    /// `[N, S]` world-space signed distance, unless `no_sdf`
    pub sdf: Option<Vec<f32>>,
    /// `[N, S, 2]`, only with `return_texcoord`
    pub texcoord: Option<Vec<f32>>,
}

/// Which gradients a backward call must produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GradRequest {
    /// Sample positions
    pub x: bool,
    /// Shape parameter matrix
    pub shape_params: bool,
    /// Color parameter matrix
    pub color_params: bool,
}

impl GradRequest {
    /// Every differentiable input
    pub const ALL: Self = Self {
        x: true,
        shape_params: true,
        color_params: true,
    };

    /// Parameters only, the usual training setup
    pub const PARAMS: Self = Self {
        x: false,
        shape_params: true,
        color_params: true,
    };

    /// Nothing
    pub const NONE: Self = Self {
        x: false,
        shape_params: false,
        color_params: false,
    };

    /// True when at least one gradient is requested
    #[inline]
    pub fn any(self) -> bool {
        self.x || self.shape_params || self.color_params
    }
}

/// Inputs of a stroke backward call
#[derive(Debug, Clone, Copy)]
pub struct BackwardArgs<'a> {
    /// The forward inputs, unchanged
    pub forward: ForwardArgs<'a>,
    /// `[N, S]` alpha saved by the forward call
    pub alpha: &'a [f32],
    /// `[N, S]` upstream gradient of alpha
    pub grad_alpha: &'a [f32],
    /// `[N, S, C]` upstream gradient of color
    pub grad_color: &'a [f32],
    /// `[N, S]` upstream gradient of the SDF, if it was used
    pub grad_sdf: Option<&'a [f32]>,
    /// Gradients to produce
    pub request: GradRequest,
}

/// Outputs of a stroke backward call
///
/// A field is `Some` exactly when the matching request flag is set.
#[derive(Debug, Clone, Default)]
pub struct BackwardOutputs {
    /// `[N, 3]`
    pub grad_x: Option<Vec<f32>>,
    /// `[S, Ps]`
    pub grad_shape: Option<Vec<f32>>,
    /// `[S, Pc]`
    pub grad_color: Option<Vec<f32>>,
}

/// Inputs of an `over` composition call
#[derive(Debug, Clone, Copy)]
pub struct ComposeArgs<'a> {
    /// `[N, S]`
    pub alpha: &'a [f32],
    /// `[N, S, C]`
    pub color: &'a [f32],
    /// `[S]`
    pub density: &'a [f32],
    /// `N`
    pub num_samples: usize,
    /// `C`
    pub color_dim: usize,
}

impl ComposeArgs<'_> {
    /// `S`
    #[inline]
    pub fn num_strokes(&self) -> usize {
        self.density.len()
    }
}

/// Outputs of an `over` composition call
#[derive(Debug, Clone, Default)]
pub struct ComposeOutputs {
    /// `[N]`
    pub density: Vec<f32>,
    /// `[N, C]`
    pub color: Vec<f32>,
}

/// Gradients of an `over` composition call
#[derive(Debug, Clone, Default)]
pub struct ComposeGrads {
    /// `[N, S]`
    pub alpha: Vec<f32>,
    /// `[N, S, C]`
    pub color: Vec<f32>,
    /// `[S]`
    pub density: Vec<f32>,
}

/// Accelerated numerical kernels behind the evaluation and `over` calls
///
/// Implementations receive inputs already validated by the caller, so
/// every documented layout holds. Numerical failures (NaN/Inf) are returned
/// as values and never reported as errors.
pub trait StrokeBackend: Send + Sync {
    /// Per-(sample, stroke) alpha, color and optional SDF/texcoord
    fn stroke_forward(&self, args: &ForwardArgs<'_>) -> Result<ForwardOutputs>;

    /// Gradients of a forward call with respect to the requested inputs
    fn stroke_backward(&self, args: &BackwardArgs<'_>) -> Result<BackwardOutputs>;

    /// Front-to-back alpha compositing over the stroke axis
    fn compose_forward(&self, args: &ComposeArgs<'_>) -> Result<ComposeOutputs>;

    /// Gradients of [`StrokeBackend::compose_forward`]
    fn compose_backward(
        &self,
        args: &ComposeArgs<'_>,
        grad_density: &[f32],
        grad_color: &[f32],
    ) -> Result<ComposeGrads>;
}

impl<B: StrokeBackend + ?Sized> StrokeBackend for &B {
    fn stroke_forward(&self, args: &ForwardArgs<'_>) -> Result<ForwardOutputs> {
        (**self).stroke_forward(args)
    }

    fn stroke_backward(&self, args: &BackwardArgs<'_>) -> Result<BackwardOutputs> {
        (**self).stroke_backward(args)
    }

    fn compose_forward(&self, args: &ComposeArgs<'_>) -> Result<ComposeOutputs> {
        (**self).compose_forward(args)
    }

    fn compose_backward(
        &self,
        args: &ComposeArgs<'_>,
        grad_density: &[f32],
        grad_color: &[f32],
    ) -> Result<ComposeGrads> {
        (**self).compose_backward(args, grad_density, grad_color)
    }
}
