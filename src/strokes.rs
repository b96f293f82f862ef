//! Owned stroke collection for one stroke kind
//!
//! Keeps the three parameter arrays (`[S, Ps]` shape, `[S, Pc]` color,
//! `[S]` density) in flat buffers, grows them with sampled strokes and runs
//! evaluation followed by composition in one call.

use crate::backend::{GradRequest, StrokeOptions};
use crate::catalog::StrokeKind;
use crate::compose::{CompositeOutput, CompositionType, Compositor};
use crate::config::StrokeConfig;
use crate::error::{Result, StrokeError};
use crate::eval::SampleBatch;
use crate::tensor::Tensor;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A growable set of strokes sharing one shape family and color model
#[derive(Debug, Clone)]
pub struct StrokeSet {
    kind: StrokeKind,
    composition: CompositionType,
    options: StrokeOptions,
    initial_density: f32,
    shape_params: Vec<f32>,
    color_params: Vec<f32>,
    density_params: Vec<f32>,
    rng: StdRng,
}

impl StrokeSet {
    /// Empty set
    pub fn new(kind: StrokeKind, composition: CompositionType, options: StrokeOptions, seed: u64) -> Self {
        Self {
            kind,
            composition,
            options,
            initial_density: 1.0,
            shape_params: Vec::new(),
            color_params: Vec::new(),
            density_params: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Empty set built from a configuration
    pub fn from_config(config: &StrokeConfig) -> Result<Self> {
        let kind = config.resolve()?;
        let mut set = Self::new(kind, config.composition, config.options, config.seed);
        set.initial_density = config.initial_density;
        Ok(set)
    }

    /// The resolved stroke kind
    #[inline]
    pub fn kind(&self) -> &StrokeKind {
        &self.kind
    }

    /// Number of strokes
    #[inline]
    pub fn len(&self) -> usize {
        self.density_params.len()
    }

    /// True when the set holds no strokes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.density_params.is_empty()
    }

    /// Append one stroke with explicit parameters
    ///
    /// Returns the stroke's index.
    pub fn push(&mut self, shape: &[f32], color: &[f32], density: f32) -> Result<usize> {
        if shape.len() != self.kind.dim_shape() {
            return Err(StrokeError::mismatch("shape params", &[self.kind.dim_shape()], &[shape.len()]));
        }
        if color.len() != self.kind.dim_color() {
            return Err(StrokeError::mismatch("color params", &[self.kind.dim_color()], &[color.len()]));
        }
        self.shape_params.extend_from_slice(shape);
        self.color_params.extend_from_slice(color);
        self.density_params.push(density);
        Ok(self.len() - 1)
    }

    /// Append one stroke drawn from the kind's samplers
    ///
    /// # Arguments
    /// * `stroke_step` - Creation step driving the size decay
    /// * `error_coord` - Optional target position (reconstruction regime)
    pub fn push_sampled(&mut self, stroke_step: u32, error_coord: Option<Vec3>) -> usize {
        let shape = self.kind.shape_sampler.sample(&mut self.rng, stroke_step, error_coord);
        let color = self.kind.color_sampler.sample(&mut self.rng);
        self.shape_params.extend(shape);
        self.color_params.extend(color);
        self.density_params.push(self.initial_density);
        tracing::debug!(
            shape = %self.kind.shape_type,
            stroke_step,
            strokes = self.len(),
            "sampled new stroke"
        );
        self.len() - 1
    }

    /// `[S, Ps]` shape parameters
    pub fn shape_params(&self) -> Result<Tensor> {
        Tensor::new([self.len(), self.kind.dim_shape()], self.shape_params.clone())
    }

    /// `[S, Pc]` color parameters
    pub fn color_params(&self) -> Result<Tensor> {
        Tensor::new([self.len(), self.kind.dim_color()], self.color_params.clone())
    }

    /// `[S]` density parameters
    pub fn density_params(&self) -> Tensor {
        Tensor::from_vec(self.density_params.clone())
    }

    /// Flat shape parameters for in-place updates
    #[inline]
    pub fn shape_params_mut(&mut self) -> &mut [f32] {
        &mut self.shape_params
    }

    /// Flat color parameters for in-place updates
    #[inline]
    pub fn color_params_mut(&mut self) -> &mut [f32] {
        &mut self.color_params
    }

    /// Density parameters for in-place updates
    #[inline]
    pub fn density_params_mut(&mut self) -> &mut [f32] {
        &mut self.density_params
    }

    /// Project every parameter back into its declared range
    pub fn clamp_to_ranges(&mut self) {
        let ps = self.kind.dim_shape();
        let pc = self.kind.dim_color();
        for row in self.shape_params.chunks_mut(ps.max(1)) {
            for (v, r) in row.iter_mut().zip(&self.kind.shape_param_ranges) {
                *v = r.clamp(*v);
            }
        }
        for row in self.color_params.chunks_mut(pc.max(1)) {
            for (v, r) in row.iter_mut().zip(&self.kind.color_param_ranges) {
                *v = r.clamp(*v);
            }
        }
    }

    /// Evaluate every stroke on a sample batch and composite the result
    pub fn render(&self, batch: SampleBatch<'_>) -> Result<CompositeOutput> {
        let shape = self.shape_params()?;
        let color = self.color_params()?;
        let (out, _) = self
            .kind
            .stroke_fn()
            .forward(batch, &shape, &color, &self.options, GradRequest::NONE)?;
        Compositor::new(self.composition).compose(&out.alpha, &out.color, &self.density_params())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ShapeType;
    use crate::sampler::InitType;

    fn sphere_set(seed: u64) -> StrokeSet {
        let kind = StrokeKind::new(ShapeType::Sphere, crate::catalog::ColorType::ConstantRgb, InitType::Reconstruction);
        StrokeSet::new(kind, CompositionType::Max, StrokeOptions::default(), seed)
    }

    #[test]
    fn test_same_seed_same_strokes() {
        let mut a = sphere_set(9);
        let mut b = sphere_set(9);
        for step in 0..5 {
            a.push_sampled(step, None);
            b.push_sampled(step, None);
        }
        assert_eq!(a.shape_params().unwrap(), b.shape_params().unwrap());
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_push_checks_widths() {
        let mut set = sphere_set(0);
        assert!(matches!(
            set.push(&[0.1, 0.0, 0.0], &[0.0; 3], 1.0),
            Err(StrokeError::ShapeMismatch { .. })
        ));
        assert_eq!(set.push(&[0.1, 0.0, 0.0, 0.0], &[0.0; 3], 1.0).unwrap(), 0);
    }

    #[test]
    fn test_clamp_to_ranges() {
        let mut set = sphere_set(0);
        set.push(&[2.0, -3.0, 0.5, 0.0], &[1.5, -0.2, 0.3], 1.0).unwrap();
        set.clamp_to_ranges();
        assert_eq!(set.shape_params().unwrap().data(), &[0.5, -1.0, 0.5, 0.0]);
        assert_eq!(set.color_params().unwrap().data(), &[1.0, 0.0, 0.3]);
    }
}
