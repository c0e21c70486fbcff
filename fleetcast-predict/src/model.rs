use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use fleetcast_core::{CoreError, CoreResult, ZoneId};

use crate::features::DemandFeatures;

/// Feature order the artifact must declare. Anything else means the artifact
/// was trained against a different contract and cannot be served.
pub const FEATURE_NAMES: [&str; 6] = [
    "pickup_zone_encoded",
    "hour",
    "day_of_week",
    "month",
    "is_weekend",
    "is_peak_hour",
];

/// Opaque scoring contract: `(features) -> raw demand score`. Any regression
/// model honoring it is substitutable for the trained MLP.
pub trait DemandScorer: Send + Sync {
    /// The artifact's dense encoding for a zone, if the zone was seen in
    /// training.
    fn zone_code(&self, zone: ZoneId) -> Option<u32>;

    fn score(&self, features: &DemandFeatures) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Identity,
}

#[derive(Debug, Deserialize)]
struct LayerArtifact {
    /// Row-major: `weights[out][in]`.
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    activation: Activation,
}

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    feature_names: Vec<String>,
    /// Zone id (stringified JSON key) -> dense code.
    zone_codes: HashMap<String, u32>,
    layers: Vec<LayerArtifact>,
}

#[derive(Debug)]
struct Layer {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    activation: Activation,
}

/// The trained MLP demand regressor: dense layers with ReLU hidden
/// activations and an identity output, loaded once from a JSON artifact.
/// Weights are read-only; scoring is a pure bounded computation and safe to
/// run concurrently.
#[derive(Debug)]
pub struct DemandModel {
    zone_codes: HashMap<ZoneId, u32>,
    layers: Vec<Layer>,
}

impl DemandModel {
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> CoreResult<Self> {
        let artifact: ModelArtifact = serde_json::from_str(raw)
            .map_err(|e| CoreError::ModelUnavailable(format!("corrupt artifact: {}", e)))?;

        if artifact.feature_names != FEATURE_NAMES {
            return Err(CoreError::ModelUnavailable(format!(
                "artifact feature list {:?} does not match the serving contract",
                artifact.feature_names
            )));
        }
        if artifact.layers.is_empty() {
            return Err(CoreError::ModelUnavailable("artifact has no layers".to_string()));
        }

        let mut expected_inputs = FEATURE_NAMES.len();
        for (idx, layer) in artifact.layers.iter().enumerate() {
            if layer.weights.is_empty() || layer.weights.len() != layer.bias.len() {
                return Err(CoreError::ModelUnavailable(format!(
                    "layer {}: weight rows ({}) and bias length ({}) disagree",
                    idx,
                    layer.weights.len(),
                    layer.bias.len()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_inputs) {
                return Err(CoreError::ModelUnavailable(format!(
                    "layer {}: expected {} inputs per row",
                    idx, expected_inputs
                )));
            }
            expected_inputs = layer.weights.len();
        }
        if expected_inputs != 1 {
            return Err(CoreError::ModelUnavailable(format!(
                "output layer emits {} values, expected a single regression output",
                expected_inputs
            )));
        }

        let mut zone_codes = HashMap::new();
        for (key, code) in artifact.zone_codes {
            let id: ZoneId = key.parse().map_err(|_| {
                CoreError::ModelUnavailable(format!("artifact zone id {:?} is not numeric", key))
            })?;
            zone_codes.insert(id, code);
        }

        Ok(Self {
            zone_codes,
            layers: artifact
                .layers
                .into_iter()
                .map(|l| Layer {
                    weights: l.weights,
                    bias: l.bias,
                    activation: l.activation,
                })
                .collect(),
        })
    }

    fn forward(&self, input: &[f64]) -> f64 {
        let mut current = input.to_vec();
        for layer in &self.layers {
            let mut next = Vec::with_capacity(layer.weights.len());
            for (row, bias) in layer.weights.iter().zip(&layer.bias) {
                let mut acc = *bias;
                for (w, x) in row.iter().zip(&current) {
                    acc += w * x;
                }
                next.push(match layer.activation {
                    Activation::Relu => acc.max(0.0),
                    Activation::Identity => acc,
                });
            }
            current = next;
        }
        current[0]
    }
}

impl DemandScorer for DemandModel {
    fn zone_code(&self, zone: ZoneId) -> Option<u32> {
        self.zone_codes.get(&zone).copied()
    }

    fn score(&self, features: &DemandFeatures) -> f64 {
        self.forward(&features.to_input())
    }
}

impl<S: DemandScorer + ?Sized> DemandScorer for std::sync::Arc<S> {
    fn zone_code(&self, zone: ZoneId) -> Option<u32> {
        (**self).zone_code(zone)
    }

    fn score(&self, features: &DemandFeatures) -> f64 {
        (**self).score(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// `score = zone_code`, via a single identity layer.
    const PASSTHROUGH: &str = r#"{
        "feature_names": ["pickup_zone_encoded", "hour", "day_of_week", "month", "is_weekend", "is_peak_hour"],
        "zone_codes": {"1": 0, "2": 1, "3": 2},
        "layers": [
            {"weights": [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0]], "bias": [0.0], "activation": "identity"}
        ]
    }"#;

    #[test]
    fn passthrough_model_scores_zone_code() {
        let model = DemandModel::from_json(PASSTHROUGH).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        assert_eq!(model.score(&DemandFeatures::extract(2, at)), 2.0);
        assert_eq!(model.zone_code(3), Some(2));
        assert_eq!(model.zone_code(42), None);
    }

    #[test]
    fn relu_clamps_negative_activations() {
        let raw = r#"{
            "feature_names": ["pickup_zone_encoded", "hour", "day_of_week", "month", "is_weekend", "is_peak_hour"],
            "zone_codes": {"1": 0},
            "layers": [
                {"weights": [[-1.0, 0.0, 0.0, 0.0, 0.0, 0.0]], "bias": [0.0], "activation": "relu"},
                {"weights": [[1.0]], "bias": [0.5], "activation": "identity"}
            ]
        }"#;
        let model = DemandModel::from_json(raw).unwrap();
        let at = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        // -zone_code relus to 0, output layer adds its bias
        assert_eq!(model.score(&DemandFeatures::extract(5, at)), 0.5);
    }

    #[test]
    fn rejects_wrong_feature_list() {
        let raw = r#"{
            "feature_names": ["hour"],
            "zone_codes": {},
            "layers": [{"weights": [[1.0]], "bias": [0.0], "activation": "identity"}]
        }"#;
        assert!(matches!(
            DemandModel::from_json(raw).unwrap_err(),
            CoreError::ModelUnavailable(_)
        ));
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        let raw = r#"{
            "feature_names": ["pickup_zone_encoded", "hour", "day_of_week", "month", "is_weekend", "is_peak_hour"],
            "zone_codes": {},
            "layers": [
                {"weights": [[1.0, 0.0]], "bias": [0.0], "activation": "identity"}
            ]
        }"#;
        assert!(matches!(
            DemandModel::from_json(raw).unwrap_err(),
            CoreError::ModelUnavailable(_)
        ));
    }

    #[test]
    fn rejects_multi_output_final_layer() {
        let raw = r#"{
            "feature_names": ["pickup_zone_encoded", "hour", "day_of_week", "month", "is_weekend", "is_peak_hour"],
            "zone_codes": {},
            "layers": [
                {"weights": [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]], "bias": [0.0, 0.0], "activation": "identity"}
            ]
        }"#;
        assert!(matches!(
            DemandModel::from_json(raw).unwrap_err(),
            CoreError::ModelUnavailable(_)
        ));
    }

    #[test]
    fn missing_artifact_file_is_model_unavailable() {
        let err = DemandModel::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, CoreError::ModelUnavailable(_)));
    }
}
