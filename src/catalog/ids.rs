//! Packed shape and color identifiers
//!
//! A shape id carries the base SDF index in bits 4.. and four capability
//! bits below it, so a backend can dispatch on the id alone.

use crate::error::{Result, StrokeError};
use crate::primitives::BaseSdf;
use serde::{Deserialize, Serialize};

const BIT_TRANSLATION: u32 = 1 << 0;
const BIT_ROTATION: u32 = 1 << 1;
const BIT_SINGLESCALE: u32 = 1 << 2;
const BIT_MULTISCALE: u32 = 1 << 3;

/// Transform groups a shape family exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// Three translation parameters
    pub translation: bool,
    /// Three Euler-angle parameters
    pub rotation: bool,
    /// One uniform scale parameter
    pub singlescale: bool,
    /// Three per-axis scale parameters
    pub multiscale: bool,
}

impl Capabilities {
    /// Number of scale parameters (0, 1 or 3)
    #[inline]
    pub const fn scale_len(self) -> usize {
        if self.singlescale {
            1
        } else if self.multiscale {
            3
        } else {
            0
        }
    }

    /// Number of transform parameters appended after the base-shape parameters
    #[inline]
    pub const fn transform_len(self) -> usize {
        self.scale_len()
            + if self.rotation { 3 } else { 0 }
            + if self.translation { 3 } else { 0 }
    }

    #[inline]
    const fn bits(self) -> u32 {
        (if self.translation { BIT_TRANSLATION } else { 0 })
            | (if self.rotation { BIT_ROTATION } else { 0 })
            | (if self.singlescale { BIT_SINGLESCALE } else { 0 })
            | (if self.multiscale { BIT_MULTISCALE } else { 0 })
    }

    #[inline]
    const fn from_bits(bits: u32) -> Self {
        Self {
            translation: bits & BIT_TRANSLATION != 0,
            rotation: bits & BIT_ROTATION != 0,
            singlescale: bits & BIT_SINGLESCALE != 0,
            multiscale: bits & BIT_MULTISCALE != 0,
        }
    }
}

/// Packed shape identifier: `(base_sdf_index << 4) | capability bits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

impl ShapeId {
    /// Pack a base SDF and its capabilities
    #[inline]
    pub const fn new(base: BaseSdf, caps: Capabilities) -> Self {
        Self((base.index() << 4) | caps.bits())
    }

    /// Raw packed value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Decode the capability bits (bits 0..3)
    #[inline]
    pub const fn capabilities(self) -> Capabilities {
        Capabilities::from_bits(self.0 & 0xF)
    }

    /// Decode the base SDF (bits 4..)
    #[inline]
    pub fn base_sdf(self) -> Result<BaseSdf> {
        BaseSdf::from_index(self.0 >> 4)
    }

    /// Total shape parameters a stroke with this id carries
    pub fn num_params(self) -> Result<usize> {
        Ok(self.base_sdf()?.num_params() + self.capabilities().transform_len())
    }
}

/// Pack a shape id from a base SDF name and capability flags
///
/// Fails with `UnknownPrimitive` when the base name is not in the catalog.
pub fn make_sdf_id(
    base_sdf_name: &str,
    enable_translation: bool,
    enable_rotation: bool,
    enable_singlescale: bool,
    enable_multiscale: bool,
) -> Result<ShapeId> {
    let base = BaseSdf::from_name(base_sdf_name)?;
    Ok(ShapeId::new(
        base,
        Capabilities {
            translation: enable_translation,
            rotation: enable_rotation,
            singlescale: enable_singlescale,
            multiscale: enable_multiscale,
        },
    ))
}

/// Output channels per color model, indexed by color id
pub const COLOR_DIMS: [usize; 4] = [3, 3, 3, 3];

/// Color model identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorId(pub u32);

impl ColorId {
    /// Raw id
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Number of output color channels
    pub fn color_dim(self) -> Result<usize> {
        COLOR_DIMS
            .get(self.0 as usize)
            .copied()
            .ok_or_else(|| StrokeError::UnknownPrimitive {
                kind: "color id",
                name: self.0.to_string(),
            })
    }
}
