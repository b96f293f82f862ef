//! Common test helpers for stroke-sdf integration tests

#![allow(dead_code)]

use stroke_sdf::backend::{
    BackwardArgs, BackwardOutputs, ComposeArgs, ComposeGrads, ComposeOutputs, CpuBackend, ForwardArgs,
    ForwardOutputs,
};
use stroke_sdf::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Standard inputs
// ============================================================================

/// Owned sample batch: `rays` rays of `samples` samples each
pub struct Samples {
    pub x: Tensor,
    pub radius: Tensor,
    pub viewdir: Tensor,
}

impl Samples {
    pub fn batch(&self) -> SampleBatch<'_> {
        SampleBatch {
            x: &self.x,
            radius: &self.radius,
            viewdir: &self.viewdir,
        }
    }
}

/// Samples along rays parallel to +X through the unit box
pub fn ray_samples(rays: usize, samples: usize) -> Samples {
    let mut x = Vec::with_capacity(rays * samples * 3);
    let mut viewdir = Vec::with_capacity(rays * 3);
    for r in 0..rays {
        let y = -0.4 + 0.8 * (r as f32 + 0.5) / rays as f32;
        for s in 0..samples {
            let t = -0.8 + 1.6 * (s as f32 + 0.5) / samples as f32;
            x.extend([t, y, 0.1]);
        }
        viewdir.extend([1.0, 0.0, 0.0]);
    }
    Samples {
        x: Tensor::new([rays, samples, 3], x).unwrap(),
        radius: Tensor::new([rays, samples], vec![0.01; rays * samples]).unwrap(),
        viewdir: Tensor::new([rays, 3], viewdir).unwrap(),
    }
}

/// One sample at `p`
pub fn single_sample(p: Vec3, radius: f32) -> Samples {
    Samples {
        x: Tensor::new([1, 1, 3], p.to_array().to_vec()).unwrap(),
        radius: Tensor::new([1, 1], vec![radius]).unwrap(),
        viewdir: Tensor::new([1, 3], vec![0.0, 0.0, 1.0]).unwrap(),
    }
}

/// `count` sampled strokes of one kind as `[S, Ps]` / `[S, Pc]` tensors
pub fn sampled_params(shape: &str, color: &str, count: usize, seed: u64) -> (StrokeKind, Tensor, Tensor) {
    let config = StrokeConfig {
        shape_type: shape.into(),
        color_type: color.into(),
        seed,
        ..StrokeConfig::default()
    };
    let mut set = StrokeSet::from_config(&config).unwrap();
    for step in 0..count {
        set.push_sampled(step as u32, None);
    }
    (set.kind().clone(), set.shape_params().unwrap(), set.color_params().unwrap())
}

// ============================================================================
// Backend instrumentation
// ============================================================================

/// Reference backend that counts how often it is called
#[derive(Default)]
pub struct CountingBackend {
    pub calls: AtomicUsize,
}

impl CountingBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl StrokeBackend for CountingBackend {
    fn stroke_forward(&self, args: &ForwardArgs<'_>) -> stroke_sdf::Result<ForwardOutputs> {
        self.hit();
        CpuBackend.stroke_forward(args)
    }

    fn stroke_backward(&self, args: &BackwardArgs<'_>) -> stroke_sdf::Result<BackwardOutputs> {
        self.hit();
        CpuBackend.stroke_backward(args)
    }

    fn compose_forward(&self, args: &ComposeArgs<'_>) -> stroke_sdf::Result<ComposeOutputs> {
        self.hit();
        CpuBackend.compose_forward(args)
    }

    fn compose_backward(
        &self,
        args: &ComposeArgs<'_>,
        grad_density: &[f32],
        grad_color: &[f32],
    ) -> stroke_sdf::Result<ComposeGrads> {
        self.hit();
        CpuBackend.compose_backward(args, grad_density, grad_color)
    }
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two f32 values are close within tolerance
pub fn assert_close(a: f32, b: f32, tol: f32, msg: &str) {
    assert!(
        (a - b).abs() < tol,
        "{}: {} vs {} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).abs(),
        tol
    );
}

/// Central finite difference of `f` with respect to element `i` of `v`
pub fn finite_diff(v: &[f32], i: usize, eps: f32, f: impl Fn(&[f32]) -> f32) -> f32 {
    let mut hi = v.to_vec();
    let mut lo = v.to_vec();
    hi[i] += eps;
    lo[i] -= eps;
    (f(&hi) - f(&lo)) / (2.0 * eps)
}
