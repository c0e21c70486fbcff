use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ride::Ride;
use crate::zone::ZoneId;

/// An unmatched expectation that a vehicle dropped in `zone` will shortly
/// need a return ride from there. `return_to` is the originating ride's
/// pickup zone and becomes the drop of a matched return trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingReturnRequest {
    pub id: Uuid,
    pub zone: ZoneId,
    pub return_to: ZoneId,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub passengers: u32,
}

impl PendingReturnRequest {
    /// Open a return-trip window at the ride's drop point.
    pub fn for_ride(ride: &Ride, window: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            zone: ride.drop,
            return_to: ride.pickup,
            window_start: ride.drop_time,
            window_end: ride.drop_time + window,
            passengers: ride.passengers,
        }
    }

    pub fn accepts(&self, pickup_time: DateTime<Utc>) -> bool {
        self.window_start <= pickup_time && pickup_time <= self.window_end
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.window_end < now
    }
}

/// One claimed pending request, reported back to the submitting operator.
#[derive(Debug, Clone, Serialize)]
pub struct ReturnMatch {
    pub pickup: ZoneId,
    pub drop: ZoneId,
    pub time_difference_minutes: i64,
    pub passengers: u32,
}

impl ReturnMatch {
    pub fn new(request: &PendingReturnRequest, pickup_time: DateTime<Utc>) -> Self {
        Self {
            pickup: request.zone,
            drop: request.return_to,
            time_difference_minutes: (pickup_time - request.window_start).num_minutes(),
            passengers: request.passengers,
        }
    }
}

/// Select the pending requests satisfied by a new ride's pickup, ordered by
/// ascending time difference (closest match first, ties by request id for a
/// deterministic order). `within_tolerance` decides whether two zones are
/// close enough to count as the same pickup area.
pub fn find_matches<'a>(
    requests: &'a [PendingReturnRequest],
    pickup: ZoneId,
    pickup_time: DateTime<Utc>,
    within_tolerance: impl Fn(ZoneId, ZoneId) -> bool,
) -> Vec<&'a PendingReturnRequest> {
    let mut matched: Vec<&PendingReturnRequest> = requests
        .iter()
        .filter(|r| r.accepts(pickup_time))
        .filter(|r| r.zone == pickup || within_tolerance(r.zone, pickup))
        .collect();
    matched.sort_by_key(|r| (pickup_time - r.window_start, r.id));
    matched
}
