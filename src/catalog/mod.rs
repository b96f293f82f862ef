//! Stroke primitive catalog
//!
//! Static tables mapping shape family and color model names to their base
//! SDF, parameter ranges, initial samplers and capability bits. Names are
//! resolved once into a [`StrokeKind`]; evaluation afterwards only sees the
//! packed [`ShapeId`] / [`ColorId`] pair.
//!
//! Shape parameter layout (positional, no names at runtime):
//!
//! ```text
//! [ base-shape params | scale (1 or 3) | rotation (3) | translation (3) ]
//! ```

mod ids;
mod range;

pub use ids::{make_sdf_id, Capabilities, ColorId, ShapeId, COLOR_DIMS};
pub use range::ParamRange;

use crate::backend::{CpuBackend, StrokeBackend};
use crate::error::{Result, StrokeError};
use crate::eval::StrokeFn;
use crate::primitives::BaseSdf;
use crate::sampler::{ColorSampler, InitType, ShapeSampler};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Range of a single-scale parameter
pub const SCALE_RANGE: ParamRange = ParamRange::bounded(0.01, 0.5);
/// Range of each Euler angle
pub const ROTATION_RANGE: ParamRange = ParamRange::bounded(-PI, PI);
/// Range of each translation component
pub const TRANSLATION_RANGE: ParamRange = ParamRange::bounded(-1.0, 1.0);

// ── Shape families ───────────────────────────────────────────

/// Initial sampler for base-shape parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSampler {
    /// Rounding `0.8 * U`
    RoundCube,
    /// Cap angle and tube radius, both `U`
    CappedTorus,
    /// Half height `U + 0.25`
    Capsule,
    /// Half height `U + 0.25`, taper `U - 0.5`
    Line,
    /// Half depth `U`
    Triprism,
    /// Control points jittered around the sample coordinate plus radii
    Spline {
        /// Number of 3D control points
        control_points: usize,
        /// Number of radius values
        radii: usize,
    },
}

/// Immutable description of one shape family
#[derive(Debug, Clone, Copy)]
pub struct ShapeFamily {
    /// Base SDF the family evaluates
    pub base: BaseSdf,
    /// Ranges of the base-shape parameters
    pub base_ranges: &'static [ParamRange],
    /// Initial sampler of the base-shape parameters
    pub base_sampler: Option<BaseSampler>,
    /// Transform groups
    pub caps: Capabilities,
}

const fn caps(translation: bool, rotation: bool, singlescale: bool, multiscale: bool) -> Capabilities {
    Capabilities {
        translation,
        rotation,
        singlescale,
        multiscale,
    }
}

const NO_RANGES: &[ParamRange] = &[];
const ROUND_RANGES: &[ParamRange] = &[ParamRange::bounded(0.0, 1.0)];
const CAPPED_TORUS_RANGES: &[ParamRange] = &[ParamRange::bounded(0.0, PI), ParamRange::at_least(0.0)];
const CAPSULE_RANGES: &[ParamRange] = &[ParamRange::at_least(0.25)];
const LINE_RANGES: &[ParamRange] = &[ParamRange::at_least(0.25), ParamRange::bounded(-0.8, 0.8)];
const TRIPRISM_RANGES: &[ParamRange] = &[ParamRange::at_least(0.0)];

const CTRL: ParamRange = ParamRange::bounded(-1.0, 1.0);
const RADIUS: ParamRange = ParamRange::bounded(0.001, 0.2);
const QUADRATIC_RANGES: &[ParamRange] = &[CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, RADIUS, RADIUS];
const CUBIC_RANGES: &[ParamRange] = &[
    CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, CTRL, RADIUS, RADIUS,
];

/// Shape family names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    /// Sphere, uniform scale
    Sphere,
    /// Rotated sphere, per-axis scale
    Ellipsoid,
    /// Axis-aligned cube, uniform scale
    Aacube,
    /// Rotated cube, uniform scale
    Cube,
    /// Axis-aligned box, per-axis scale
    Aabb,
    /// Oriented box, per-axis scale
    Obb,
    /// Rotated rounded cube, uniform scale
    Roundcube,
    /// Oriented rounded box, per-axis scale
    Roundbox,
    /// Capped torus
    Cappedtorus,
    /// Capsule, uniform scale
    Capsule,
    /// Capsule, per-axis scale
    Scapsule,
    /// Tapered capsule
    Line,
    /// Triangular prism
    Triprism,
    /// Octahedron
    Octahedron,
    /// Tetrahedron
    Tetrahedron,
    /// Quadratic Bezier tube
    QuadraticBezier,
    /// Cubic Bezier tube
    CubicBezier,
    /// Catmull-Rom tube
    CatmullRom,
}

/// Every shape family in catalog order
pub const ALL_SHAPE_TYPES: [ShapeType; 18] = [
    ShapeType::Sphere,
    ShapeType::Ellipsoid,
    ShapeType::Aacube,
    ShapeType::Cube,
    ShapeType::Aabb,
    ShapeType::Obb,
    ShapeType::Roundcube,
    ShapeType::Roundbox,
    ShapeType::Cappedtorus,
    ShapeType::Capsule,
    ShapeType::Scapsule,
    ShapeType::Line,
    ShapeType::Triprism,
    ShapeType::Octahedron,
    ShapeType::Tetrahedron,
    ShapeType::QuadraticBezier,
    ShapeType::CubicBezier,
    ShapeType::CatmullRom,
];

impl ShapeType {
    /// Catalog name
    pub const fn name(self) -> &'static str {
        match self {
            ShapeType::Sphere => "sphere",
            ShapeType::Ellipsoid => "ellipsoid",
            ShapeType::Aacube => "aacube",
            ShapeType::Cube => "cube",
            ShapeType::Aabb => "aabb",
            ShapeType::Obb => "obb",
            ShapeType::Roundcube => "roundcube",
            ShapeType::Roundbox => "roundbox",
            ShapeType::Cappedtorus => "cappedtorus",
            ShapeType::Capsule => "capsule",
            ShapeType::Scapsule => "scapsule",
            ShapeType::Line => "line",
            ShapeType::Triprism => "triprism",
            ShapeType::Octahedron => "octahedron",
            ShapeType::Tetrahedron => "tetrahedron",
            ShapeType::QuadraticBezier => "quadratic_bezier",
            ShapeType::CubicBezier => "cubic_bezier",
            ShapeType::CatmullRom => "catmull_rom",
        }
    }

    /// The family's static description
    pub const fn family(self) -> ShapeFamily {
        use BaseSampler as S;
        let (base, base_ranges, base_sampler, caps): (BaseSdf, &'static [ParamRange], _, _) = match self {
            ShapeType::Sphere => (BaseSdf::UnitSphere, NO_RANGES, None, caps(true, false, true, false)),
            ShapeType::Ellipsoid => (BaseSdf::UnitSphere, NO_RANGES, None, caps(true, true, false, true)),
            ShapeType::Aacube => (BaseSdf::UnitCube, NO_RANGES, None, caps(true, false, true, false)),
            ShapeType::Cube => (BaseSdf::UnitCube, NO_RANGES, None, caps(true, true, true, false)),
            ShapeType::Aabb => (BaseSdf::UnitCube, NO_RANGES, None, caps(true, false, false, true)),
            ShapeType::Obb => (BaseSdf::UnitCube, NO_RANGES, None, caps(true, true, false, true)),
            ShapeType::Roundcube => (
                BaseSdf::UnitRoundCube,
                ROUND_RANGES,
                Some(S::RoundCube),
                caps(true, true, true, false),
            ),
            ShapeType::Roundbox => (
                BaseSdf::UnitRoundCube,
                ROUND_RANGES,
                Some(S::RoundCube),
                caps(true, true, false, true),
            ),
            ShapeType::Cappedtorus => (
                BaseSdf::UnitCappedTorus,
                CAPPED_TORUS_RANGES,
                Some(S::CappedTorus),
                caps(true, true, true, false),
            ),
            ShapeType::Capsule => (
                BaseSdf::UnitCapsule,
                CAPSULE_RANGES,
                Some(S::Capsule),
                caps(true, true, true, false),
            ),
            ShapeType::Scapsule => (
                BaseSdf::UnitCapsule,
                CAPSULE_RANGES,
                Some(S::Capsule),
                caps(true, true, false, true),
            ),
            ShapeType::Line => (BaseSdf::UnitLine, LINE_RANGES, Some(S::Line), caps(true, true, true, false)),
            ShapeType::Triprism => (
                BaseSdf::UnitTriprism,
                TRIPRISM_RANGES,
                Some(S::Triprism),
                caps(true, true, true, false),
            ),
            ShapeType::Octahedron => (BaseSdf::UnitOctahedron, NO_RANGES, None, caps(true, true, true, false)),
            ShapeType::Tetrahedron => (BaseSdf::UnitTetrahedron, NO_RANGES, None, caps(true, true, true, false)),
            ShapeType::QuadraticBezier => (
                BaseSdf::QuadraticBezier,
                QUADRATIC_RANGES,
                Some(S::Spline {
                    control_points: 3,
                    radii: 2,
                }),
                caps(false, false, false, false),
            ),
            ShapeType::CubicBezier => (
                BaseSdf::CubicBezier,
                CUBIC_RANGES,
                Some(S::Spline {
                    control_points: 4,
                    radii: 2,
                }),
                caps(false, false, false, false),
            ),
            ShapeType::CatmullRom => (
                BaseSdf::CatmullRom,
                CUBIC_RANGES,
                Some(S::Spline {
                    control_points: 4,
                    radii: 2,
                }),
                caps(false, false, false, false),
            ),
        };
        ShapeFamily {
            base,
            base_ranges,
            base_sampler,
            caps,
        }
    }

    /// Packed id of this family
    pub const fn shape_id(self) -> ShapeId {
        let f = self.family();
        ShapeId::new(f.base, f.caps)
    }

    /// Full ordered range list: base ranges, then scale, rotation, translation
    pub fn param_ranges(self) -> Vec<ParamRange> {
        let f = self.family();
        let mut ranges = f.base_ranges.to_vec();
        ranges.extend(std::iter::repeat(SCALE_RANGE).take(f.caps.scale_len()));
        if f.caps.rotation {
            ranges.extend([ROTATION_RANGE; 3]);
        }
        if f.caps.translation {
            ranges.extend([TRANSLATION_RANGE; 3]);
        }
        ranges
    }
}

impl FromStr for ShapeType {
    type Err = StrokeError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_SHAPE_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "shape type",
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Color models ─────────────────────────────────────────────

/// How initial color parameters are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSamplerKind {
    /// Uniform in [0, 1) per channel
    UniformRgb,
    /// Anchors uniform in [-0.5, 0.5), colors uniform in [0, 1)
    Gradient,
    /// Standard normal per coefficient
    StandardNormal,
}

/// Immutable description of one color model
#[derive(Debug, Clone, Copy)]
pub struct ColorModel {
    /// Backend dispatch id
    pub color_id: ColorId,
    /// Ranges of the color parameters
    pub ranges: &'static [ParamRange],
    /// Output channels
    pub color_dim: usize,
    /// Initial sampler
    pub sampler: ColorSamplerKind,
}

const RGB_RANGES: &[ParamRange] = &[ParamRange::bounded(0.0, 1.0); 3];
const ANCHOR: ParamRange = ParamRange::bounded(-1.0, 1.0);
const UNIT: ParamRange = ParamRange::bounded(0.0, 1.0);
const GRADIENT_RANGES: &[ParamRange] = &[
    ANCHOR, ANCHOR, ANCHOR, ANCHOR, ANCHOR, ANCHOR, UNIT, UNIT, UNIT, UNIT, UNIT, UNIT,
];
const SH2_RANGES: &[ParamRange] = &[ParamRange::unbounded(); 12];
const SH3_RANGES: &[ParamRange] = &[ParamRange::unbounded(); 27];

/// Color model names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorType {
    /// One RGB triple
    ConstantRgb,
    /// Linear blend between two RGB colors
    GradientRgb,
    /// View-dependent, spherical harmonics degree 1
    ConstantSh2,
    /// View-dependent, spherical harmonics degree 2
    ConstantSh3,
}

/// Every color model in id order
pub const ALL_COLOR_TYPES: [ColorType; 4] = [
    ColorType::ConstantRgb,
    ColorType::GradientRgb,
    ColorType::ConstantSh2,
    ColorType::ConstantSh3,
];

impl ColorType {
    /// Catalog name
    pub const fn name(self) -> &'static str {
        match self {
            ColorType::ConstantRgb => "constant_rgb",
            ColorType::GradientRgb => "gradient_rgb",
            ColorType::ConstantSh2 => "constant_sh2",
            ColorType::ConstantSh3 => "constant_sh3",
        }
    }

    /// The model's static description
    pub const fn model(self) -> ColorModel {
        let (id, ranges, sampler): (u32, &'static [ParamRange], _) = match self {
            ColorType::ConstantRgb => (0, RGB_RANGES, ColorSamplerKind::UniformRgb),
            ColorType::GradientRgb => (1, GRADIENT_RANGES, ColorSamplerKind::Gradient),
            ColorType::ConstantSh2 => (2, SH2_RANGES, ColorSamplerKind::StandardNormal),
            ColorType::ConstantSh3 => (3, SH3_RANGES, ColorSamplerKind::StandardNormal),
        };
        ColorModel {
            color_id: ColorId(id),
            ranges,
            color_dim: COLOR_DIMS[id as usize],
            sampler,
        }
    }

    /// Look up by backend id
    pub fn from_id(id: ColorId) -> Result<Self> {
        ALL_COLOR_TYPES
            .get(id.raw() as usize)
            .copied()
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "color id",
                name: id.raw().to_string(),
            })
    }
}

impl FromStr for ColorType {
    type Err = StrokeError;

    fn from_str(s: &str) -> Result<Self> {
        ALL_COLOR_TYPES
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "color type",
                name: s.to_string(),
            })
    }
}

impl fmt::Display for ColorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Resolved stroke kind ─────────────────────────────────────

/// A shape family and color model resolved for evaluation
///
/// Holds everything callers need to size parameter storage, initialise new
/// strokes and evaluate them.
#[derive(Debug, Clone)]
pub struct StrokeKind {
    /// Shape family
    pub shape_type: ShapeType,
    /// Color model
    pub color_type: ColorType,
    /// Initialization regime
    pub init_type: InitType,
    /// Packed shape id
    pub shape_id: ShapeId,
    /// Color id
    pub color_id: ColorId,
    /// Ordered shape parameter ranges
    pub shape_param_ranges: Vec<ParamRange>,
    /// Ordered color parameter ranges
    pub color_param_ranges: Vec<ParamRange>,
    /// Initial shape parameter sampler
    pub shape_sampler: ShapeSampler,
    /// Initial color parameter sampler
    pub color_sampler: ColorSampler,
}

impl StrokeKind {
    /// Resolve from typed names
    pub fn new(shape_type: ShapeType, color_type: ColorType, init_type: InitType) -> Self {
        let family = shape_type.family();
        let model = color_type.model();
        let shape_param_ranges = shape_type.param_ranges();
        let color_param_ranges = model.ranges.to_vec();
        let kind = Self {
            shape_type,
            color_type,
            init_type,
            shape_id: shape_type.shape_id(),
            color_id: model.color_id,
            shape_sampler: ShapeSampler::new(family, init_type, shape_param_ranges.clone()),
            color_sampler: ColorSampler::new(model),
            shape_param_ranges,
            color_param_ranges,
        };
        tracing::debug!(
            shape = %shape_type,
            color = %color_type,
            init = ?init_type,
            shape_id = kind.shape_id.raw(),
            dim_shape = kind.dim_shape(),
            dim_color = kind.dim_color(),
            "resolved stroke kind"
        );
        kind
    }

    /// Number of shape parameters per stroke
    #[inline]
    pub fn dim_shape(&self) -> usize {
        self.shape_param_ranges.len()
    }

    /// Number of color parameters per stroke
    #[inline]
    pub fn dim_color(&self) -> usize {
        self.color_param_ranges.len()
    }

    /// Output color channels
    #[inline]
    pub fn color_dim(&self) -> usize {
        self.color_type.model().color_dim
    }

    /// Evaluation operator on the reference CPU backend
    pub fn stroke_fn(&self) -> StrokeFn<CpuBackend> {
        self.stroke_fn_with(CpuBackend::default())
    }

    /// Evaluation operator on a caller-provided backend
    pub fn stroke_fn_with<B: StrokeBackend>(&self, backend: B) -> StrokeFn<B> {
        StrokeFn::new(self.shape_id, self.color_id, self.dim_shape(), self.dim_color(), backend)
    }
}

/// Resolve a shape family and color model by name
///
/// Fails with `UnknownPrimitive` if either name is absent from the catalog.
pub fn get_stroke(shape_type: &str, color_type: &str, init_type: InitType) -> Result<StrokeKind> {
    let shape: ShapeType = shape_type.parse()?;
    let color: ColorType = color_type.parse()?;
    Ok(StrokeKind::new(shape, color, init_type))
}
