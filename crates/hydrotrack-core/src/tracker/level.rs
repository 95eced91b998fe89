//! Hydration level store.
//!
//! A plain state container: the current level in milliliters and the
//! tracking flag. All mutation goes through guarded methods that keep the
//! level finite and non-negative.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Whether decay ticks are being scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingState {
    #[default]
    Stopped,
    Running,
}

/// Read-only projection of the store, derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub level_ml: f64,
    pub running: bool,
}

/// Outcome of a single decrease.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decrease {
    pub level_ml: f64,
    /// The decrement exceeded the level and the result was floored at zero.
    pub clamped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LevelStore {
    level_ml: f64,
    state: TrackingState,
}

impl LevelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an initial level. Invalid seeds collapse to zero.
    pub fn with_level(level_ml: f64) -> Self {
        let level_ml = if level_ml.is_finite() && level_ml > 0.0 {
            level_ml
        } else {
            0.0
        };
        Self {
            level_ml,
            state: TrackingState::Stopped,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn level_ml(&self) -> f64 {
        self.level_ml
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TrackingState::Running
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            level_ml: self.level_ml,
            running: self.is_running(),
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Returns `true` if the state actually changed.
    pub fn set_state(&mut self, state: TrackingState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    /// Add `amount_ml` to the level. Rejects non-positive, non-finite amounts
    /// and sums that would leave the finite range; the level is untouched on error.
    pub fn add(&mut self, amount_ml: f64) -> Result<f64, ValidationError> {
        if !amount_ml.is_finite() || amount_ml <= 0.0 {
            return Err(ValidationError::InvalidAmount { amount: amount_ml });
        }
        let next = self.level_ml + amount_ml;
        if !next.is_finite() {
            return Err(ValidationError::LevelOverflow {
                level: self.level_ml,
                amount: amount_ml,
            });
        }
        self.level_ml = next;
        Ok(next)
    }

    /// Subtract `decrement_ml`, flooring at zero.
    ///
    /// A decrement that is not a positive, finite number is ignored and the
    /// level is reported unchanged.
    pub fn decrease(&mut self, decrement_ml: f64) -> Decrease {
        if !decrement_ml.is_finite() || decrement_ml <= 0.0 {
            tracing::warn!(decrement_ml, "ignoring invalid decay decrement");
            return Decrease {
                level_ml: self.level_ml,
                clamped: false,
            };
        }
        let next = self.level_ml - decrement_ml;
        let clamped = next < 0.0;
        self.level_ml = if clamped { 0.0 } else { next };
        Decrease {
            level_ml: self.level_ml,
            clamped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty_and_stopped() {
        let store = LevelStore::new();
        assert_eq!(store.level_ml(), 0.0);
        assert_eq!(store.state(), TrackingState::Stopped);
        assert!(!store.snapshot().running);
    }

    #[test]
    fn add_rejects_invalid_amounts_without_mutation() {
        let mut store = LevelStore::with_level(10.0);
        for bad in [0.0, -5.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(store.add(bad).is_err(), "{bad} should be rejected");
            assert_eq!(store.level_ml(), 10.0);
        }
    }

    #[test]
    fn add_rejects_overflow() {
        let mut store = LevelStore::with_level(f64::MAX);
        let err = store.add(f64::MAX).unwrap_err();
        assert!(matches!(err, ValidationError::LevelOverflow { .. }));
        assert_eq!(store.level_ml(), f64::MAX);
    }

    #[test]
    fn decrease_clamps_at_zero() {
        let mut store = LevelStore::with_level(0.1);
        let out = store.decrease(0.144);
        assert!(out.clamped);
        assert_eq!(out.level_ml, 0.0);

        let out = store.decrease(0.144);
        assert!(out.clamped);
        assert_eq!(store.level_ml(), 0.0);
    }

    #[test]
    fn decrease_ignores_invalid_decrements() {
        let mut store = LevelStore::with_level(10.0);
        for bad in [f64::NAN, -5.0, 0.0, f64::INFINITY, f64::NEG_INFINITY] {
            let out = store.decrease(bad);
            assert!(!out.clamped, "{bad} should not clamp");
            assert_eq!(out.level_ml, 10.0);
            assert_eq!(store.level_ml(), 10.0);
        }
    }

    #[test]
    fn set_state_reports_changes() {
        let mut store = LevelStore::new();
        assert!(store.set_state(TrackingState::Running));
        assert!(!store.set_state(TrackingState::Running));
        assert!(store.set_state(TrackingState::Stopped));
    }

    #[test]
    fn with_level_ignores_invalid_seed() {
        assert_eq!(LevelStore::with_level(-3.0).level_ml(), 0.0);
        assert_eq!(LevelStore::with_level(f64::NAN).level_ml(), 0.0);
    }
}
