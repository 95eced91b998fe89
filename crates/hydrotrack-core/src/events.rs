use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracker::TrackingState;

/// Every state change in the tracker produces an Event.
/// Hosts forward them to the front-end client; idempotent no-ops produce none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TrackingStarted {
        level_ml: f64,
        at: DateTime<Utc>,
    },
    TrackingStopped {
        level_ml: f64,
        at: DateTime<Utc>,
    },
    WaterAdded {
        amount_ml: f64,
        level_ml: f64,
        at: DateTime<Utc>,
    },
    /// One decay tick was applied. `clamped` is set when the level hit the floor.
    LevelDecayed {
        decrement_ml: f64,
        level_ml: f64,
        clamped: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TrackingState,
        level_ml: f64,
        running: bool,
        at: DateTime<Utc>,
    },
}
