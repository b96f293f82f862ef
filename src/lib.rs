//! # stroke-sdf
//!
//! **Differentiable SDF strokes for volumetric scene fitting**
//!
//! A scene is a set of parametric strokes: signed-distance primitives with
//! a color model and a density. For each sample along a camera ray the
//! crate computes every stroke's alpha and color, then composites them into
//! one density and one color for a volumetric renderer.
//!
//! ## Features
//!
//! - **Catalog**: 18 shape families over 12 base SDFs, 4 color models,
//!   bit-packed shape ids
//! - **Sampler**: reconstruction, generative-box and generative-sphere
//!   initialization of new strokes
//! - **Evaluation**: forward/backward operator over a pluggable kernel
//!   backend, with a rayon reference implementation
//! - **Compositing**: `over`, `max`, `max_density_weighted`, `softmax`,
//!   `softmax_density_weighted`, all differentiable
//!
//! ## Example
//!
//! ```rust
//! use stroke_sdf::prelude::*;
//!
//! let kind = get_stroke("sphere", "constant_rgb", InitType::Reconstruction).unwrap();
//! let op = kind.stroke_fn();
//!
//! // One sphere of radius 0.3 at the origin, colored orange
//! let shape = Tensor::new([1, 4], vec![0.3, 0.0, 0.0, 0.0]).unwrap();
//! let color = Tensor::new([1, 3], vec![1.0, 0.5, 0.0]).unwrap();
//!
//! // One ray with a single sample at the origin
//! let x = Tensor::new([1, 1, 3], vec![0.0; 3]).unwrap();
//! let radius = Tensor::new([1, 1], vec![0.01]).unwrap();
//! let viewdir = Tensor::new([1, 3], vec![0.0, 0.0, 1.0]).unwrap();
//! let batch = SampleBatch { x: &x, radius: &radius, viewdir: &viewdir };
//!
//! let (out, _) = op
//!     .forward(batch, &shape, &color, &StrokeOptions::default(), GradRequest::NONE)
//!     .unwrap();
//! let density = Tensor::from_vec(vec![2.0]);
//! let composite = Compositor::new(CompositionType::Over)
//!     .compose(&out.alpha, &out.color, &density)
//!     .unwrap();
//! assert_eq!(composite.density.data(), &[2.0]);
//! ```

#![warn(missing_docs)]

pub mod autodiff;
pub mod backend;
pub mod catalog;
pub mod color;
pub mod compose;
pub mod config;
pub mod error;
pub mod eval;
pub mod primitives;
pub mod sampler;
pub mod strokes;
pub mod tensor;
pub mod transforms;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::backend::{CpuBackend, GradRequest, StrokeBackend, StrokeOptions};
    pub use crate::catalog::{
        get_stroke, make_sdf_id, Capabilities, ColorId, ColorType, ParamRange, ShapeId, ShapeType, StrokeKind,
    };
    pub use crate::compose::{composite, CompositeOutput, CompositionType, Compositor};
    pub use crate::config::StrokeConfig;
    pub use crate::error::{Result, StrokeError};
    pub use crate::eval::{SampleBatch, StrokeFn, StrokeGrads, StrokeOutput, StrokeTape};
    pub use crate::sampler::InitType;
    pub use crate::strokes::StrokeSet;
    pub use crate::tensor::Tensor;
    pub use glam::Vec3;
}

// Re-exports for convenience
pub use catalog::get_stroke;
pub use compose::composite;
pub use error::{Result, StrokeError};
pub use strokes::StrokeSet;
pub use tensor::Tensor;
