//! Base SDF shapes for strokes
//!
//! Every shape lives in its own unit space: the stroke transform (scale,
//! rotation, translation) is applied to the query point before the base
//! SDF sees it. Splines are the exception and carry world-space control
//! points.
//!
//! All distance functions are generic over [`Real`] so the same code yields
//! values (`f32`) and parameter derivatives (`Dual`).

mod capped_torus;
mod capsule;
mod cube;
mod octahedron;
mod sphere;
mod spline;
mod tetrahedron;
mod triangular_prism;

pub use capped_torus::sdf_unit_capped_torus;
pub use capsule::{sdf_unit_capsule, sdf_unit_line};
pub use cube::{sdf_unit_cube, sdf_unit_round_cube};
pub use octahedron::sdf_unit_octahedron;
pub use sphere::sdf_unit_sphere;
pub use spline::{sdf_spline, SplineKind, SPLINE_SEGMENTS};
pub use tetrahedron::sdf_unit_tetrahedron;
pub use triangular_prism::sdf_unit_triprism;

use crate::autodiff::{Real, Vec3R};
use crate::error::{Result, StrokeError};
use serde::{Deserialize, Serialize};

/// Base SDF identifier
///
/// The discriminant is the index packed into the upper bits of a `ShapeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BaseSdf {
    /// Sphere of radius 1
    UnitSphere = 0,
    /// Cube of half extent 1
    UnitCube = 1,
    /// Cube of half extent 1 with rounded edges
    UnitRoundCube = 2,
    /// Capped torus, major radius 1
    UnitCappedTorus = 3,
    /// Vertical capsule, radius 1
    UnitCapsule = 4,
    /// Tapered vertical capsule
    UnitLine = 5,
    /// Triangular prism along Z
    UnitTriprism = 6,
    /// Regular octahedron, vertex distance 1
    UnitOctahedron = 7,
    /// Regular tetrahedron in the [-1, 1] cube
    UnitTetrahedron = 8,
    /// Quadratic Bezier tube
    QuadraticBezier = 9,
    /// Cubic Bezier tube
    CubicBezier = 10,
    /// Catmull-Rom tube
    CatmullRom = 11,
}

/// All base SDFs in index order
pub const ALL_BASE_SDFS: [BaseSdf; 12] = [
    BaseSdf::UnitSphere,
    BaseSdf::UnitCube,
    BaseSdf::UnitRoundCube,
    BaseSdf::UnitCappedTorus,
    BaseSdf::UnitCapsule,
    BaseSdf::UnitLine,
    BaseSdf::UnitTriprism,
    BaseSdf::UnitOctahedron,
    BaseSdf::UnitTetrahedron,
    BaseSdf::QuadraticBezier,
    BaseSdf::CubicBezier,
    BaseSdf::CatmullRom,
];

impl BaseSdf {
    /// Index packed into shape ids
    #[inline]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`BaseSdf::index`]
    pub fn from_index(index: u32) -> Result<Self> {
        ALL_BASE_SDFS
            .get(index as usize)
            .copied()
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "base sdf index",
                name: index.to_string(),
            })
    }

    /// Catalog name
    pub const fn name(self) -> &'static str {
        match self {
            BaseSdf::UnitSphere => "unit_sphere",
            BaseSdf::UnitCube => "unit_cube",
            BaseSdf::UnitRoundCube => "unit_round_cube",
            BaseSdf::UnitCappedTorus => "unit_capped_torus",
            BaseSdf::UnitCapsule => "unit_capsule",
            BaseSdf::UnitLine => "unit_line",
            BaseSdf::UnitTriprism => "unit_triprism",
            BaseSdf::UnitOctahedron => "unit_octahedron",
            BaseSdf::UnitTetrahedron => "unit_tetrahedron",
            BaseSdf::QuadraticBezier => "quadratic_bezier",
            BaseSdf::CubicBezier => "cubic_bezier",
            BaseSdf::CatmullRom => "catmull_rom",
        }
    }

    /// Look up by catalog name
    pub fn from_name(name: &str) -> Result<Self> {
        ALL_BASE_SDFS
            .iter()
            .copied()
            .find(|b| b.name() == name)
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "base sdf",
                name: name.to_string(),
            })
    }

    /// Number of shape parameters consumed before the transform groups
    pub const fn num_params(self) -> usize {
        match self {
            BaseSdf::UnitSphere
            | BaseSdf::UnitCube
            | BaseSdf::UnitOctahedron
            | BaseSdf::UnitTetrahedron => 0,
            BaseSdf::UnitRoundCube | BaseSdf::UnitCapsule | BaseSdf::UnitTriprism => 1,
            BaseSdf::UnitCappedTorus | BaseSdf::UnitLine => 2,
            BaseSdf::QuadraticBezier => 11,
            BaseSdf::CubicBezier | BaseSdf::CatmullRom => 14,
        }
    }

    /// Evaluate the base SDF
    ///
    /// `params` must hold at least [`BaseSdf::num_params`] values.
    #[inline]
    pub fn eval<T: Real>(self, p: Vec3R<T>, params: &[T]) -> T {
        match self {
            BaseSdf::UnitSphere => sdf_unit_sphere(p),
            BaseSdf::UnitCube => sdf_unit_cube(p),
            BaseSdf::UnitRoundCube => sdf_unit_round_cube(p, params[0]),
            BaseSdf::UnitCappedTorus => sdf_unit_capped_torus(p, params[0], params[1]),
            BaseSdf::UnitCapsule => sdf_unit_capsule(p, params[0]),
            BaseSdf::UnitLine => sdf_unit_line(p, params[0], params[1]),
            BaseSdf::UnitTriprism => sdf_unit_triprism(p, params[0]),
            BaseSdf::UnitOctahedron => sdf_unit_octahedron(p),
            BaseSdf::UnitTetrahedron => sdf_unit_tetrahedron(p),
            BaseSdf::QuadraticBezier => sdf_spline(SplineKind::QuadraticBezier, p, params),
            BaseSdf::CubicBezier => sdf_spline(SplineKind::CubicBezier, p, params),
            BaseSdf::CatmullRom => sdf_spline(SplineKind::CatmullRom, p, params),
        }
    }
}
