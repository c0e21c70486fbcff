use std::net::SocketAddr;
use std::sync::Arc;

use fleetcast_api::{app, AppState};
use fleetcast_predict::{DemandModel, ZoneRecommender};
use fleetcast_store::{PendingStore, RideLog, ZoneRegistry};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetcast_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fleetcast_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Fleetcast API on port {}", config.server.port);

    let registry = ZoneRegistry::load(&config.data.zones_csv).expect("Failed to load zone registry");
    let ride_log = RideLog::open(&config.data.ride_log).expect("Failed to open ride log");
    let pending =
        PendingStore::open(&config.data.pending_journal).expect("Failed to open pending store");

    // A missing artifact is surfaced per request as a 500, not a crash; the
    // zone listing and health endpoints stay up.
    let recommender = match DemandModel::load(&config.data.model_artifact) {
        Ok(model) => Some(Arc::new(ZoneRecommender::new(
            Arc::new(model),
            config.recommendation.clone(),
        ))),
        Err(e) => {
            tracing::error!("Could not load demand model: {}", e);
            None
        }
    };

    let app_state = AppState {
        registry: Arc::new(registry),
        ride_log: Arc::new(ride_log),
        pending: Arc::new(pending),
        recommender,
        matching: config.matching.clone(),
        limits: config.limits.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}
