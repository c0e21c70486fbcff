use chrono::{DateTime, Utc};
use serde::Serialize;

use fleetcast_core::ZoneId;
use fleetcast_store::app_config::RecommendationConfig;

use crate::features::DemandFeatures;
use crate::model::DemandScorer;

/// A zone eligible for recommendation, with its centroid distance from the
/// ride's drop zone already computed by the registry.
#[derive(Debug, Clone)]
pub struct ZoneCandidate {
    pub id: ZoneId,
    pub name: String,
    pub distance_m: f64,
}

/// One ranked recommendation. `probability` is a softmax-normalized ranking
/// signal in [0,1]: ordinal, not a calibrated likelihood.
#[derive(Debug, Clone, Serialize)]
pub struct ZoneRecommendation {
    pub id: ZoneId,
    pub name: String,
    pub probability: f64,
    pub distance_m: f64,
}

/// Scores candidate zones with the demand model and returns the top-K,
/// filtered to the configured radius and deterministically ordered.
pub struct ZoneRecommender<S> {
    scorer: S,
    config: RecommendationConfig,
}

impl<S: DemandScorer> ZoneRecommender<S> {
    pub fn new(scorer: S, config: RecommendationConfig) -> Self {
        Self { scorer, config }
    }

    /// Rank candidates for a drop at `at`. Zones beyond the radius are
    /// dropped before scoring; zones the artifact never saw get probability
    /// zero. Order: probability descending, then distance ascending, then
    /// zone id ascending. An empty result is legitimate (radius filter), not
    /// a failure.
    pub fn recommend(
        &self,
        candidates: &[ZoneCandidate],
        at: DateTime<Utc>,
    ) -> Vec<ZoneRecommendation> {
        let eligible: Vec<&ZoneCandidate> = candidates
            .iter()
            .filter(|c| c.distance_m <= self.config.max_radius_m)
            .collect();

        let raw_scores: Vec<Option<f64>> = eligible
            .iter()
            .map(|c| {
                self.scorer
                    .zone_code(c.id)
                    .map(|code| self.scorer.score(&DemandFeatures::extract(code, at)))
            })
            .collect();

        let probabilities = softmax_over_present(&raw_scores);

        let mut ranked: Vec<ZoneRecommendation> = eligible
            .iter()
            .zip(probabilities)
            .map(|(c, probability)| ZoneRecommendation {
                id: c.id,
                name: c.name.clone(),
                probability,
                distance_m: c.distance_m,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.probability
                .total_cmp(&a.probability)
                .then(a.distance_m.total_cmp(&b.distance_m))
                .then(a.id.cmp(&b.id))
        });
        ranked.truncate(self.config.top_k);
        ranked
    }
}

/// Softmax over the scores that exist; missing entries (zones unknown to the
/// artifact) come out as 0.0. Shifted by the max score for numeric stability.
fn softmax_over_present(scores: &[Option<f64>]) -> Vec<f64> {
    let max = scores
        .iter()
        .flatten()
        .fold(f64::NEG_INFINITY, |m, &s| m.max(s));
    if max == f64::NEG_INFINITY {
        return vec![0.0; scores.len()];
    }
    let total: f64 = scores.iter().flatten().map(|s| (s - max).exp()).sum();
    scores
        .iter()
        .map(|s| match s {
            Some(s) => (s - max).exp() / total,
            None => 0.0,
        })
        .collect()
}
