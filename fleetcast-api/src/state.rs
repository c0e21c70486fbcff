use std::sync::Arc;

use fleetcast_predict::{DemandModel, ZoneRecommender};
use fleetcast_store::app_config::{LimitsConfig, MatchingConfig};
use fleetcast_store::{PendingStore, RideLog, ZoneRegistry};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ZoneRegistry>,
    pub ride_log: Arc<RideLog>,
    pub pending: Arc<PendingStore>,
    /// `None` when the model artifact failed to load at startup; the
    /// recommendation path then answers 500 instead of silently degrading.
    pub recommender: Option<Arc<ZoneRecommender<Arc<DemandModel>>>>,
    pub matching: MatchingConfig,
    pub limits: LimitsConfig,
}
