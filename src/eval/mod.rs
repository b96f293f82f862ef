//! Differentiable stroke evaluation
//!
//! [`StrokeFn::forward`] validates a sample batch against the parameter
//! matrices, flattens it and calls the backend. When any gradient is
//! requested, the returned [`StrokeTape`] keeps exactly what the backward
//! kernel needs: positions, radii, view directions, the computed alpha and
//! both parameter matrices. [`StrokeTape::backward`] consumes the tape, so
//! every forward call pairs with at most one backward call.
//!
//! Gradients with respect to `radius`, `viewdir`, the ids and the kernel
//! flags are never produced.

use crate::backend::{BackwardArgs, ForwardArgs, GradRequest, StrokeBackend, StrokeOptions};
use crate::catalog::{ColorId, ShapeId};
use crate::error::{Result, StrokeError};
use crate::tensor::Tensor;

/// Sample positions, footprints and view directions of one call
///
/// `x` is `[..., N, 3]`, `radius` is `[..., N]` and `viewdir` is `[..., 3]`,
/// shared by the `N` samples of each ray.
#[derive(Debug, Clone, Copy)]
pub struct SampleBatch<'a> {
    /// `[..., N, 3]`
    pub x: &'a Tensor,
    /// `[..., N]`
    pub radius: &'a Tensor,
    /// `[..., 3]`
    pub viewdir: &'a Tensor,
}

/// Forward outputs, shaped after the caller's leading dimensions
#[derive(Debug, Clone)]
pub struct StrokeOutput {
    /// `[..., N, S]`
    pub alpha: Tensor,
    /// `[..., N, S, C]`
    pub color: Tensor,
    /// `[..., N, S]`, absent with `no_sdf`
    pub sdf: Option<Tensor>,
    /// `[..., N, S, 2]`, present with `return_texcoord`
    pub texcoord: Option<Tensor>,
}

/// Gradients produced by [`StrokeTape::backward`]
///
/// A field is `Some` exactly when it was requested in the forward call.
#[derive(Debug, Clone, Default)]
pub struct StrokeGrads {
    /// Same shape as `x`
    pub x: Option<Tensor>,
    /// `[S, Ps]`
    pub shape_params: Option<Tensor>,
    /// `[S, Pc]`
    pub color_params: Option<Tensor>,
}

/// State saved by a forward call for its backward call
#[derive(Debug)]
struct Saved {
    x_shape: Vec<usize>,
    alpha_shape: Vec<usize>,
    x: Vec<f32>,
    radius: Vec<f32>,
    viewdir: Vec<f32>,
    samples_per_view: usize,
    shape_params: Vec<f32>,
    color_params: Vec<f32>,
    num_strokes: usize,
    alpha: Vec<f32>,
    options: StrokeOptions,
    request: GradRequest,
}

/// Backward half of one evaluation call
#[derive(Debug)]
pub struct StrokeTape<'a, B> {
    op: &'a StrokeFn<B>,
    saved: Option<Saved>,
}

/// Evaluation operator bound to one shape id / color id pair
#[derive(Debug, Clone)]
pub struct StrokeFn<B> {
    shape_id: ShapeId,
    color_id: ColorId,
    dim_shape: usize,
    dim_color: usize,
    backend: B,
}

impl<B: StrokeBackend> StrokeFn<B> {
    /// Bind an operator to a resolved stroke kind
    pub fn new(shape_id: ShapeId, color_id: ColorId, dim_shape: usize, dim_color: usize, backend: B) -> Self {
        Self {
            shape_id,
            color_id,
            dim_shape,
            dim_color,
            backend,
        }
    }

    /// Packed shape id
    #[inline]
    pub fn shape_id(&self) -> ShapeId {
        self.shape_id
    }

    /// Color model id
    #[inline]
    pub fn color_id(&self) -> ColorId {
        self.color_id
    }

    /// The backend calls are delegated to
    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Evaluate every stroke at every sample
    ///
    /// # Arguments
    /// * `batch` - Sample positions, radii and view directions
    /// * `shape_params` - `[S, Ps]`
    /// * `color_params` - `[S, Pc]`
    /// * `options` - Kernel flags
    /// * `request` - Gradients the backward call will need
    ///
    /// # Errors
    /// `InvalidArgument` on rank/layout violations and `ShapeMismatch` when
    /// sizes disagree. Nothing reaches the backend in either case.
    pub fn forward(
        &self,
        batch: SampleBatch<'_>,
        shape_params: &Tensor,
        color_params: &Tensor,
        options: &StrokeOptions,
        request: GradRequest,
    ) -> Result<(StrokeOutput, StrokeTape<'_, B>)> {
        let layout = self.check_inputs(batch, shape_params, color_params)?;
        let color_dim = self.color_id.color_dim()?;
        let s = layout.num_strokes;

        let args = ForwardArgs {
            x: batch.x.data(),
            radius: batch.radius.data(),
            viewdir: batch.viewdir.data(),
            samples_per_view: layout.samples_per_view,
            shape_params: shape_params.data(),
            color_params: color_params.data(),
            num_strokes: s,
            shape_id: self.shape_id,
            color_id: self.color_id,
            options: *options,
        };
        tracing::trace!(
            samples = batch.radius.numel(),
            strokes = s,
            shape_id = self.shape_id.raw(),
            "stroke forward"
        );
        let out = self.backend.stroke_forward(&args)?;

        let lead = &batch.x.shape()[..batch.x.ndim() - 1];
        let with = |tail: &[usize]| -> Vec<usize> { lead.iter().chain(tail).copied().collect() };
        let alpha_shape = with(&[s]);
        let alpha = Tensor::new(alpha_shape.clone(), out.alpha)?;
        let color = Tensor::new(with(&[s, color_dim]), out.color)?;
        let sdf = out.sdf.map(|d| Tensor::new(with(&[s]), d)).transpose()?;
        let texcoord = out.texcoord.map(|t| Tensor::new(with(&[s, 2]), t)).transpose()?;

        let saved = request.any().then(|| Saved {
            x_shape: batch.x.shape().to_vec(),
            alpha_shape,
            x: batch.x.data().to_vec(),
            radius: batch.radius.data().to_vec(),
            viewdir: batch.viewdir.data().to_vec(),
            samples_per_view: layout.samples_per_view,
            shape_params: shape_params.data().to_vec(),
            color_params: color_params.data().to_vec(),
            num_strokes: s,
            alpha: alpha.data().to_vec(),
            options: *options,
            request,
        });

        Ok((
            StrokeOutput {
                alpha,
                color,
                sdf,
                texcoord,
            },
            StrokeTape { op: self, saved },
        ))
    }

    fn check_inputs(&self, batch: SampleBatch<'_>, shape_params: &Tensor, color_params: &Tensor) -> Result<BatchLayout> {
        let x = batch.x;
        if x.ndim() < 2 || x.last_dim() != 3 {
            return Err(StrokeError::InvalidArgument(format!(
                "x must be [..., N, 3], got {:?}",
                x.shape()
            )));
        }
        let nd = x.ndim();
        let lead = &x.shape()[..nd - 2];
        let samples_per_view = x.shape()[nd - 2];

        let view_lead = batch.viewdir.shape().split_last().map(|(_, l)| l);
        if batch.viewdir.last_dim() != 3 || view_lead != Some(lead) {
            return Err(StrokeError::InvalidArgument(format!(
                "viewdir must be {:?} + [3], got {:?}",
                lead,
                batch.viewdir.shape()
            )));
        }
        if batch.radius.shape() != &x.shape()[..nd - 1] {
            return Err(StrokeError::mismatch("radius", &x.shape()[..nd - 1], batch.radius.shape()));
        }
        if shape_params.ndim() != 2 || color_params.ndim() != 2 {
            return Err(StrokeError::InvalidArgument(format!(
                "parameter matrices must be 2-D, got {:?} and {:?}",
                shape_params.shape(),
                color_params.shape()
            )));
        }
        let s = shape_params.shape()[0];
        if color_params.shape()[0] != s {
            return Err(StrokeError::mismatch("stroke count", &[s], &color_params.shape()[..1]));
        }
        if shape_params.shape()[1] != self.dim_shape {
            return Err(StrokeError::mismatch("shape params", &[s, self.dim_shape], shape_params.shape()));
        }
        if color_params.shape()[1] != self.dim_color {
            return Err(StrokeError::mismatch("color params", &[s, self.dim_color], color_params.shape()));
        }
        Ok(BatchLayout {
            samples_per_view,
            num_strokes: s,
        })
    }
}

struct BatchLayout {
    samples_per_view: usize,
    num_strokes: usize,
}

impl<B: StrokeBackend> StrokeTape<'_, B> {
    /// True when the forward call recorded a gradient request
    pub fn requires_grad(&self) -> bool {
        self.saved.is_some()
    }

    /// Route upstream gradients back to the requested inputs
    ///
    /// # Arguments
    /// * `grad_alpha` - Same shape as the forward alpha
    /// * `grad_color` - Same shape as the forward color
    /// * `grad_sdf` - Same shape as the forward SDF, if the SDF was used
    ///
    /// # Errors
    /// `IllegalState` when the forward call requested no gradient,
    /// `ShapeMismatch` when an upstream gradient has the wrong shape.
    pub fn backward(self, grad_alpha: &Tensor, grad_color: &Tensor, grad_sdf: Option<&Tensor>) -> Result<StrokeGrads> {
        let saved = self.saved.ok_or_else(|| {
            StrokeError::IllegalState("backward called on an evaluation that requested no gradients".into())
        })?;
        let op = self.op;
        let color_dim = op.color_id.color_dim()?;

        if grad_alpha.shape() != saved.alpha_shape.as_slice() {
            return Err(StrokeError::mismatch("grad alpha", &saved.alpha_shape, grad_alpha.shape()));
        }
        let mut color_shape = saved.alpha_shape.clone();
        color_shape.push(color_dim);
        if grad_color.shape() != color_shape.as_slice() {
            return Err(StrokeError::mismatch("grad color", &color_shape, grad_color.shape()));
        }
        // A zero-length placeholder stands for "SDF unused"
        let grad_sdf = match grad_sdf {
            Some(g) if g.is_empty() => None,
            Some(g) if g.shape() != saved.alpha_shape.as_slice() => {
                return Err(StrokeError::mismatch("grad sdf", &saved.alpha_shape, g.shape()));
            }
            other => other,
        };

        let args = BackwardArgs {
            forward: ForwardArgs {
                x: &saved.x,
                radius: &saved.radius,
                viewdir: &saved.viewdir,
                samples_per_view: saved.samples_per_view,
                shape_params: &saved.shape_params,
                color_params: &saved.color_params,
                num_strokes: saved.num_strokes,
                shape_id: op.shape_id,
                color_id: op.color_id,
                options: saved.options,
            },
            alpha: &saved.alpha,
            grad_alpha: grad_alpha.data(),
            grad_color: grad_color.data(),
            grad_sdf: grad_sdf.map(Tensor::data),
            request: saved.request,
        };
        tracing::trace!(
            samples = saved.radius.len(),
            strokes = saved.num_strokes,
            request = ?saved.request,
            "stroke backward"
        );
        let out = op.backend.stroke_backward(&args)?;

        let s = saved.num_strokes;
        Ok(StrokeGrads {
            x: out.grad_x.map(|g| Tensor::new(saved.x_shape.clone(), g)).transpose()?,
            shape_params: out
                .grad_shape
                .map(|g| Tensor::new([s, op.dim_shape], g))
                .transpose()?,
            color_params: out
                .grad_color
                .map(|g| Tensor::new([s, op.dim_color], g))
                .transpose()?,
        })
    }
}
