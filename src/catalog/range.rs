//! Learnable parameter ranges

use serde::{Deserialize, Serialize};

/// Closed interval a learnable parameter is kept in; `None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamRange {
    /// Lower bound
    pub min: Option<f32>,
    /// Upper bound
    pub max: Option<f32>,
}

impl ParamRange {
    /// `[min, max]`
    pub const fn bounded(min: f32, max: f32) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// `[min, +inf)`
    pub const fn at_least(min: f32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// `(-inf, +inf)`
    pub const fn unbounded() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// Whether `v` lies in the range (non-finite values never do)
    pub fn contains(&self, v: f32) -> bool {
        v.is_finite()
            && self.min.map_or(true, |lo| v >= lo)
            && self.max.map_or(true, |hi| v <= hi)
    }

    /// Project `v` into the range
    pub fn clamp(&self, v: f32) -> f32 {
        let v = self.min.map_or(v, |lo| v.max(lo));
        self.max.map_or(v, |hi| v.min(hi))
    }
}
