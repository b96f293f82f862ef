//! Error types for stroke lookup, evaluation and compositing
//!
//! Every failure is raised synchronously before any kernel work starts,
//! except numerical problems inside a backend (NaN/Inf), which are passed
//! through untouched for the caller to detect.

use thiserror::Error;

/// Errors raised by the stroke catalog, evaluation operator and compositor
#[derive(Error, Debug)]
pub enum StrokeError {
    /// Shape, color or base SDF name (or packed id) not present in the catalog
    #[error("unknown {kind}: {name}")]
    UnknownPrimitive {
        /// Which table was searched ("shape type", "color type", ...)
        kind: &'static str,
        /// The name or id that was not found
        name: String,
    },

    /// Composition strategy name not recognised
    #[error("unknown composition strategy: {0}")]
    UnknownStrategy(String),

    /// Rank or layout precondition violated
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Two arrays disagree on a dimension
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Which quantity was being checked
        what: &'static str,
        /// Expected dimensions
        expected: Vec<usize>,
        /// Actual dimensions
        actual: Vec<usize>,
    },

    /// Backward requested on a tape that recorded no gradient request
    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Malformed configuration document
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl StrokeError {
    pub(crate) fn mismatch(what: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        Self::ShapeMismatch {
            what,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, StrokeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = StrokeError::UnknownPrimitive {
            kind: "shape type",
            name: "blob".into(),
        };
        assert_eq!(e.to_string(), "unknown shape type: blob");

        let e = StrokeError::mismatch("density_params", &[3], &[4]);
        assert_eq!(
            e.to_string(),
            "shape mismatch for density_params: expected [3], got [4]"
        );
    }

    #[test]
    fn test_config_error_from_json() {
        let err: StrokeError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, StrokeError::Config(_)));
    }
}
