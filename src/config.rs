//! Stroke scene configuration
//!
//! ```json
//! {
//!   "shape_type": "ellipsoid",
//!   "color_type": "constant_sh2",
//!   "init_type": "gen_box",
//!   "composition": "softmax",
//!   "options": { "sdf_delta": 0.02, "use_laplace_transform": true },
//!   "seed": 7
//! }
//! ```
//!
//! Missing fields take their defaults.

use crate::backend::StrokeOptions;
use crate::catalog::{get_stroke, StrokeKind};
use crate::compose::CompositionType;
use crate::error::Result;
use crate::sampler::InitType;
use serde::{Deserialize, Serialize};

/// Everything needed to build a [`crate::StrokeSet`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Shape family name
    pub shape_type: String,
    /// Color model name
    pub color_type: String,
    /// Initialization regime
    pub init_type: InitType,
    /// Composition strategy
    pub composition: CompositionType,
    /// Kernel flags
    pub options: StrokeOptions,
    /// Density parameter given to new strokes
    pub initial_density: f32,
    /// Seed of the parameter sampler
    pub seed: u64,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            shape_type: "sphere".to_string(),
            color_type: "constant_rgb".to_string(),
            init_type: InitType::Reconstruction,
            composition: CompositionType::Over,
            options: StrokeOptions::default(),
            initial_density: 1.0,
            seed: 0,
        }
    }
}

impl StrokeConfig {
    /// Parse from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve the shape and color names against the catalog
    pub fn resolve(&self) -> Result<StrokeKind> {
        get_stroke(&self.shape_type, &self.color_type, self.init_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StrokeError;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let cfg = StrokeConfig::from_json(r#"{ "shape_type": "obb", "options": { "no_sdf": false } }"#).unwrap();
        assert_eq!(cfg.shape_type, "obb");
        assert_eq!(cfg.color_type, "constant_rgb");
        assert_eq!(cfg.composition, CompositionType::Over);
        assert!(!cfg.options.no_sdf);
        assert_eq!(cfg.options.sdf_delta, 0.01);
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = StrokeConfig {
            shape_type: "capsule".into(),
            init_type: InitType::GenSphere,
            composition: CompositionType::SoftmaxDensityWeighted,
            seed: 42,
            ..StrokeConfig::default()
        };
        let back = StrokeConfig::from_json(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_recon_alias() {
        let cfg = StrokeConfig::from_json(r#"{ "init_type": "recon" }"#).unwrap();
        assert_eq!(cfg.init_type, InitType::Reconstruction);
    }

    #[test]
    fn test_bad_documents() {
        assert!(matches!(StrokeConfig::from_json("{"), Err(StrokeError::Config(_))));
        assert!(matches!(
            StrokeConfig::from_json(r#"{ "composition": "average" }"#),
            Err(StrokeError::Config(_))
        ));
        let cfg = StrokeConfig {
            shape_type: "blob".into(),
            ..StrokeConfig::default()
        };
        assert!(matches!(cfg.resolve(), Err(StrokeError::UnknownPrimitive { .. })));
    }
}
