use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use fleetcast_core::{CoreError, PendingReturnRequest, Ride, RideDraft, ReturnMatch, Zone, ZoneId};
use fleetcast_predict::ZoneCandidate;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// A zone reference in a submission: either the numeric id or the display
/// name (the dashboard submits names).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ZoneRef {
    Id(ZoneId),
    Name(String),
}

#[derive(Debug, Deserialize)]
pub struct CompleteRideRequest {
    pub pickup: ZoneRef,
    pub drop: ZoneRef,
    pub pickup_time: String,
    pub drop_time: String,
    pub passengers: i64,
    #[serde(default)]
    pub cab_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CompleteRideResponse {
    MatchFound {
        status: &'static str,
        matches: Vec<MatchReport>,
    },
    NewRide {
        new_ride: bool,
        recommendations: Vec<RecommendationReport>,
    },
}

#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub pickup: String,
    pub drop: String,
    pub time_difference_minutes: i64,
    pub passengers: u32,
}

#[derive(Debug, Serialize)]
pub struct RecommendationReport {
    pub id: ZoneId,
    pub name: String,
    pub probability: f64,
    pub distance: f64,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new().route("/complete_ride", post(complete_ride))
}

/// POST /complete_ride
/// Record a completed ride, then answer with exactly one of: outstanding
/// return-trip matches, or ranked zone recommendations.
async fn complete_ride(
    State(state): State<AppState>,
    Json(req): Json<CompleteRideRequest>,
) -> Result<Json<CompleteRideResponse>, AppError> {
    // 1. Resolve and validate the submission
    let pickup = resolve_zone(&state, &req.pickup)?.id;
    let drop = resolve_zone(&state, &req.drop)?.id;
    let pickup_time = parse_time("pickup_time", &req.pickup_time)?;
    let drop_time = parse_time("drop_time", &req.drop_time)?;

    let ride = Ride::from_draft(
        RideDraft {
            cab_id: req.cab_id,
            pickup,
            drop,
            pickup_time,
            drop_time,
            passengers: req.passengers,
        },
        state.limits.max_passengers,
    )?;

    // 2. Record the ride
    state.ride_log.append(&ride)?;

    // 3. Try outstanding return-trip requests first
    let tolerance = state.matching.zone_tolerance_m;
    let registry = state.registry.clone();
    let matches = state.pending.match_and_claim(ride.pickup, ride.pickup_time, |a, b| {
        tolerance > 0.0 && registry.distance_m(a, b).is_some_and(|d| d <= tolerance)
    })?;

    if !matches.is_empty() {
        tracing::info!(ride_id = %ride.id, count = matches.len(), "return trip match found");
        return Ok(Json(CompleteRideResponse::MatchFound {
            status: "match found",
            matches: matches.iter().map(|m| match_report(&state, m)).collect(),
        }));
    }

    // 4. No match: this drop becomes a pending return request
    state.pending.insert(PendingReturnRequest::for_ride(
        &ride,
        Duration::minutes(state.matching.window_minutes),
    ))?;

    // 5. Score candidate zones around the drop
    let recommender = state
        .recommender
        .as_ref()
        .ok_or_else(|| CoreError::ModelUnavailable("model artifact not loaded".to_string()))?;

    let candidates: Vec<ZoneCandidate> = state
        .registry
        .all()
        .iter()
        .filter(|z| z.id != ride.drop)
        .filter_map(|z| {
            state.registry.distance_m(ride.drop, z.id).map(|distance_m| ZoneCandidate {
                id: z.id,
                name: z.name.clone(),
                distance_m,
            })
        })
        .collect();

    let recommendations = recommender
        .recommend(&candidates, ride.drop_time)
        .into_iter()
        .map(|r| RecommendationReport {
            id: r.id,
            name: r.name,
            probability: r.probability,
            distance: r.distance_m,
        })
        .collect::<Vec<_>>();

    tracing::info!(ride_id = %ride.id, count = recommendations.len(), "recommended next pickup zones");
    Ok(Json(CompleteRideResponse::NewRide {
        new_ride: true,
        recommendations,
    }))
}

fn resolve_zone<'a>(state: &'a AppState, zone_ref: &ZoneRef) -> Result<&'a Zone, AppError> {
    let zone = match zone_ref {
        ZoneRef::Id(id) => state.registry.get(*id),
        ZoneRef::Name(name) => state.registry.get_by_name(name),
    };
    zone.ok_or_else(|| {
        AppError::NotFound(match zone_ref {
            ZoneRef::Id(id) => format!("unknown zone id {}", id),
            ZoneRef::Name(name) => format!("unknown zone {:?}", name),
        })
    })
}

/// Accept RFC 3339 or a bare `YYYY-MM-DDTHH:MM:SS` (treated as UTC).
fn parse_time(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(t.and_utc());
    }
    Err(CoreError::validation(
        field,
        format!("{:?} is not an ISO 8601 timestamp", raw),
    )
    .into())
}

fn match_report(state: &AppState, m: &ReturnMatch) -> MatchReport {
    let name = |id: ZoneId| {
        state
            .registry
            .get(id)
            .map(|z| z.name.clone())
            .unwrap_or_else(|| id.to_string())
    };
    MatchReport {
        pickup: name(m.pickup),
        drop: name(m.drop),
        time_difference_minutes: m.time_difference_minutes,
        passengers: m.passengers,
    }
}
