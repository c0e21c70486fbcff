use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use fleetcast_core::ZoneId;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ZonesResponse {
    pub zones: Vec<ZoneSummary>,
}

#[derive(Debug, Serialize)]
pub struct ZoneSummary {
    pub id: ZoneId,
    pub zone: String,
    pub borough: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/zones", get(list_zones))
}

/// GET /zones
/// The full static registry, no pagination.
async fn list_zones(State(state): State<AppState>) -> Json<ZonesResponse> {
    let zones = state
        .registry
        .all()
        .iter()
        .map(|z| ZoneSummary {
            id: z.id,
            zone: z.name.clone(),
            borough: z.borough.clone(),
        })
        .collect();
    Json(ZonesResponse { zones })
}
