//! Forward-mode Automatic Differentiation via Dual Numbers
//!
//! The reference kernel writes every SDF, clamp and color model once,
//! generic over [`Real`]. Evaluating with `f32` gives plain values;
//! evaluating with [`Dual`] seeded on one input gives the exact partial
//! derivative of every output with respect to that input.
//!
//! # Usage
//!
//! ```rust
//! use stroke_sdf::autodiff::{Dual, Real, Vec3R};
//!
//! // d/dr of (|p| - r) at p = (2, 0, 0) is -1
//! let p = Vec3R::<Dual>::constant(glam::Vec3::new(2.0, 0.0, 0.0));
//! let r = Dual::variable(1.0);
//! let d = p.length() - r;
//! assert_eq!(d.val, 1.0);
//! assert_eq!(d.dot, -1.0);
//! ```

use glam::Vec3;
use std::ops::{Add, Div, Mul, Neg, Sub};

// ── Scalar abstraction ───────────────────────────────────────

/// Scalar type the stroke kernel is generic over.
///
/// Comparisons go through [`Real::value`], so branch selection is the same
/// for plain and dual evaluation.
pub trait Real:
    Copy
    + Send
    + Sync
    + std::fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Mul<f32, Output = Self>
{
    /// Constant with zero derivative.
    fn cst(v: f32) -> Self;
    /// Primal value.
    fn value(self) -> f32;
    /// Square root.
    fn sqrt(self) -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// Minimum of two values.
    fn min(self, other: Self) -> Self;
    /// Maximum of two values.
    fn max(self, other: Self) -> Self;
    /// Clamp to scalar range.
    fn clamp(self, lo: f32, hi: f32) -> Self;
    /// Sine.
    fn sin(self) -> Self;
    /// Cosine.
    fn cos(self) -> Self;
    /// Natural exponential.
    fn exp(self) -> Self;
}

impl Real for f32 {
    #[inline(always)]
    fn cst(v: f32) -> Self {
        v
    }
    #[inline(always)]
    fn value(self) -> f32 {
        self
    }
    #[inline(always)]
    fn sqrt(self) -> Self {
        f32::sqrt(self.max(0.0))
    }
    #[inline(always)]
    fn abs(self) -> Self {
        f32::abs(self)
    }
    #[inline(always)]
    fn min(self, other: Self) -> Self {
        f32::min(self, other)
    }
    #[inline(always)]
    fn max(self, other: Self) -> Self {
        f32::max(self, other)
    }
    #[inline(always)]
    fn clamp(self, lo: f32, hi: f32) -> Self {
        f32::clamp(self, lo, hi)
    }
    #[inline(always)]
    fn sin(self) -> Self {
        f32::sin(self)
    }
    #[inline(always)]
    fn cos(self) -> Self {
        f32::cos(self)
    }
    #[inline(always)]
    fn exp(self) -> Self {
        f32::exp(self)
    }
}

// ── Dual Number (1D) ─────────────────────────────────────────

/// 1D dual number: `val + eps * dot`.
///
/// Represents a value and its derivative with respect to a single variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    /// Function value.
    pub val: f32,
    /// Derivative with respect to the tracked variable.
    pub dot: f32,
}

impl Dual {
    /// Constant (derivative = 0).
    #[inline(always)]
    pub fn constant(val: f32) -> Self {
        Self { val, dot: 0.0 }
    }

    /// Variable (derivative = 1).
    #[inline(always)]
    pub fn variable(val: f32) -> Self {
        Self { val, dot: 1.0 }
    }

    /// Seed a slice as duals, tracking only the element at `seed` (if any).
    pub fn seeded(values: &[f32], seed: Option<usize>) -> Vec<Dual> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if Some(i) == seed {
                    Dual::variable(v)
                } else {
                    Dual::constant(v)
                }
            })
            .collect()
    }
}

impl Real for Dual {
    #[inline(always)]
    fn cst(v: f32) -> Self {
        Self::constant(v)
    }

    #[inline(always)]
    fn value(self) -> f32 {
        self.val
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        let r = self.val.max(0.0).sqrt();
        let d = if r > 1e-10 { self.dot / (2.0 * r) } else { 0.0 };
        Self { val: r, dot: d }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        if self.val >= 0.0 {
            self
        } else {
            -self
        }
    }

    #[inline(always)]
    fn min(self, other: Self) -> Self {
        if self.val <= other.val {
            self
        } else {
            other
        }
    }

    #[inline(always)]
    fn max(self, other: Self) -> Self {
        if self.val >= other.val {
            self
        } else {
            other
        }
    }

    #[inline(always)]
    fn clamp(self, lo: f32, hi: f32) -> Self {
        if self.val < lo {
            Self::constant(lo)
        } else if self.val > hi {
            Self::constant(hi)
        } else {
            self
        }
    }

    #[inline(always)]
    fn sin(self) -> Self {
        Self {
            val: self.val.sin(),
            dot: self.dot * self.val.cos(),
        }
    }

    #[inline(always)]
    fn cos(self) -> Self {
        Self {
            val: self.val.cos(),
            dot: -self.dot * self.val.sin(),
        }
    }

    #[inline(always)]
    fn exp(self) -> Self {
        let e = self.val.exp();
        Self {
            val: e,
            dot: self.dot * e,
        }
    }
}

impl Add for Dual {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self {
            val: self.val + rhs.val,
            dot: self.dot + rhs.dot,
        }
    }
}

impl Sub for Dual {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self {
            val: self.val - rhs.val,
            dot: self.dot - rhs.dot,
        }
    }
}

impl Mul for Dual {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self {
            val: self.val * rhs.val,
            dot: self.val * rhs.dot + self.dot * rhs.val,
        }
    }
}

impl Mul<f32> for Dual {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: f32) -> Self {
        Self {
            val: self.val * rhs,
            dot: self.dot * rhs,
        }
    }
}

impl Div for Dual {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.val;
        Self {
            val: self.val * inv,
            dot: (self.dot * rhs.val - self.val * rhs.dot) * inv * inv,
        }
    }
}

impl Neg for Dual {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self {
            val: -self.val,
            dot: -self.dot,
        }
    }
}

// ── Generic 3-vector ─────────────────────────────────────────

/// Minimal 3-vector over any [`Real`] scalar.
#[derive(Debug, Clone, Copy)]
pub struct Vec3R<T> {
    /// X component.
    pub x: T,
    /// Y component.
    pub y: T,
    /// Z component.
    pub z: T,
}

impl<T: Real> Vec3R<T> {
    /// Build from components.
    #[inline(always)]
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Constant vector from a glam `Vec3`.
    #[inline(always)]
    pub fn constant(v: Vec3) -> Self {
        Self::new(T::cst(v.x), T::cst(v.y), T::cst(v.z))
    }

    /// Read three consecutive scalars.
    #[inline(always)]
    pub fn from_slice(s: &[T]) -> Self {
        Self::new(s[0], s[1], s[2])
    }

    /// Primal values as a glam `Vec3`.
    #[inline(always)]
    pub fn value(self) -> Vec3 {
        Vec3::new(self.x.value(), self.y.value(), self.z.value())
    }

    /// Dot product.
    #[inline(always)]
    pub fn dot(self, o: Self) -> T {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Euclidean length.
    #[inline(always)]
    pub fn length(self) -> T {
        self.dot(self).sqrt()
    }

    /// Component-wise absolute value.
    #[inline(always)]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Multiply every component by a scalar.
    #[inline(always)]
    pub fn scale(self, s: T) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Multiply every component by a plain constant.
    #[inline(always)]
    pub fn scale_f(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }

    /// Divide component-wise.
    #[inline(always)]
    pub fn div_elem(self, o: Self) -> Self {
        Self::new(self.x / o.x, self.y / o.y, self.z / o.z)
    }

    /// Component-wise maximum against a constant.
    #[inline(always)]
    pub fn max_cst(self, v: f32) -> Self {
        let c = T::cst(v);
        Self::new(self.x.max(c), self.y.max(c), self.z.max(c))
    }

    /// Largest component.
    #[inline(always)]
    pub fn max_elem(self) -> T {
        self.x.max(self.y.max(self.z))
    }

    /// Smallest component.
    #[inline(always)]
    pub fn min_elem(self) -> T {
        self.x.min(self.y.min(self.z))
    }

    /// Linear interpolation `self + (o - self) * t`.
    #[inline(always)]
    pub fn lerp(self, o: Self, t: T) -> Self {
        self + (o - self).scale(t)
    }
}

impl<T: Real> Add for Vec3R<T> {
    type Output = Self;
    #[inline(always)]
    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl<T: Real> Sub for Vec3R<T> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl<T: Real> Neg for Vec3R<T> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

// ── Tests ────────────────────────────────────────────────────
