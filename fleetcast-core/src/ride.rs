use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::zone::ZoneId;
use crate::{CoreError, CoreResult};

/// A completed trip record. Appended to the ride log on submission; never
/// mutated or deleted afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub cab_id: Option<String>,
    pub pickup: ZoneId,
    pub drop: ZoneId,
    pub pickup_time: DateTime<Utc>,
    pub drop_time: DateTime<Utc>,
    pub passengers: u32,
}

/// A validated-field candidate for a ride, before cross-field checks. Zone
/// references have already been resolved against the registry and timestamps
/// parsed by the caller.
#[derive(Debug, Clone)]
pub struct RideDraft {
    pub cab_id: Option<String>,
    pub pickup: ZoneId,
    pub drop: ZoneId,
    pub pickup_time: DateTime<Utc>,
    pub drop_time: DateTime<Utc>,
    pub passengers: i64,
}

impl Ride {
    /// Validate a draft and mint a ride. Each failure names the offending
    /// field; no partial state is produced.
    pub fn from_draft(draft: RideDraft, max_passengers: u32) -> CoreResult<Self> {
        if draft.pickup == draft.drop {
            return Err(CoreError::validation(
                "drop",
                "pickup and drop zones must differ",
            ));
        }
        if draft.drop_time < draft.pickup_time {
            return Err(CoreError::validation(
                "drop_time",
                "drop_time must not be earlier than pickup_time",
            ));
        }
        if draft.passengers < 1 {
            return Err(CoreError::validation(
                "passengers",
                "passengers must be a positive integer",
            ));
        }
        if draft.passengers > i64::from(max_passengers) {
            return Err(CoreError::validation(
                "passengers",
                format!("passengers must not exceed {}", max_passengers),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            cab_id: draft.cab_id,
            pickup: draft.pickup,
            drop: draft.drop,
            pickup_time: draft.pickup_time,
            drop_time: draft.drop_time,
            passengers: draft.passengers as u32,
        })
    }
}
