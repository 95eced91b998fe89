//! Tracking engine implementation.
//!
//! The engine is the single authority over the hydration level and the
//! tracking state. It is a cheap, cloneable handle around one mutex-guarded
//! core; every operation (external command or decay tick) runs to completion
//! inside that lock, including the status render.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Stopped
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = TrackingEngine::new(EngineSettings::default(), presenter)?;
//! engine.start();           // needs a tokio runtime to arm decay
//! engine.add_water(250.0)?;
//! let snapshot = engine.query();
//! ```

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::Utc;

use super::level::{LevelStore, StatusSnapshot, TrackingState};
use super::scheduler::DecayScheduler;
use crate::error::ValidationError;
use crate::events::Event;
use crate::status::StatusPresenter;

/// Default replenishment amount, one glass.
pub const GLASS_ML: f64 = 250.0;
/// Amount removed by one decay tick.
pub const DECAY_AMOUNT_ML: f64 = 0.144;
/// Cadence of decay ticks.
pub const DECAY_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub decay_interval: Duration,
    pub decay_amount_ml: f64,
    pub glass_ml: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            decay_interval: DECAY_INTERVAL,
            decay_amount_ml: DECAY_AMOUNT_ML,
            glass_ml: GLASS_ML,
        }
    }
}

impl EngineSettings {
    /// Reject settings that would break the level invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = |field: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: format!("{v} must be a positive, finite number"),
                })
            }
        };
        if self.decay_interval.is_zero() {
            return Err(ValidationError::InvalidValue {
                field: "decay_interval".into(),
                message: "must be greater than zero".into(),
            });
        }
        positive("decay_amount_ml", self.decay_amount_ml)?;
        positive("glass_ml", self.glass_ml)?;
        Ok(())
    }
}

struct Core {
    store: LevelStore,
    scheduler: DecayScheduler,
    presenter: StatusPresenter,
    settings: EngineSettings,
}

impl Core {
    /// Apply one decay tick if `generation` still names the armed timer.
    fn on_decay_tick(&mut self, generation: u64) -> Option<Event> {
        if generation != self.scheduler.generation() || !self.store.is_running() {
            tracing::trace!(generation, "stale decay tick ignored");
            return None;
        }
        let decrement_ml = self.settings.decay_amount_ml;
        let out = self.store.decrease(decrement_ml);
        tracing::debug!(level_ml = out.level_ml, clamped = out.clamped, "decay tick");
        self.presenter.present(&self.store.snapshot());
        Some(Event::LevelDecayed {
            decrement_ml,
            level_ml: out.level_ml,
            clamped: out.clamped,
            at: Utc::now(),
        })
    }
}

/// Core tracking engine.
///
/// Clones share the same state; the host constructs one and hands clones to
/// whoever needs to drive it.
#[derive(Clone)]
pub struct TrackingEngine {
    core: Arc<Mutex<Core>>,
}

impl TrackingEngine {
    /// Create a stopped engine at level zero.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` fail [`EngineSettings::validate`].
    pub fn new(settings: EngineSettings, presenter: StatusPresenter) -> Result<Self, ValidationError> {
        Self::with_store(LevelStore::new(), settings, presenter)
    }

    /// Create a stopped engine seeded with `level_ml`.
    ///
    /// # Errors
    ///
    /// Returns an error if `settings` fail [`EngineSettings::validate`].
    pub fn with_level(
        level_ml: f64,
        settings: EngineSettings,
        presenter: StatusPresenter,
    ) -> Result<Self, ValidationError> {
        Self::with_store(LevelStore::with_level(level_ml), settings, presenter)
    }

    fn with_store(
        store: LevelStore,
        settings: EngineSettings,
        presenter: StatusPresenter,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            core: Arc::new(Mutex::new(Core {
                store,
                scheduler: DecayScheduler::new(settings.decay_interval),
                presenter,
                settings,
            })),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        // Every mutation leaves the core consistent, so a poisoned lock is still usable.
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn query(&self) -> StatusSnapshot {
        self.lock().store.snapshot()
    }

    pub fn state(&self) -> TrackingState {
        self.lock().store.state()
    }

    pub fn settings(&self) -> EngineSettings {
        self.lock().settings
    }

    /// Number of armed decay timers. Zero or one.
    pub fn armed_timers(&self) -> usize {
        self.lock().scheduler.armed_count()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let core = self.lock();
        Event::StateSnapshot {
            state: core.store.state(),
            level_ml: core.store.level_ml(),
            running: core.store.is_running(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin tracking. Returns `None` if already running.
    ///
    /// When no runtime can drive the decay timer the engine still enters
    /// `Running`; decay stays paused until a later `start` can arm it.
    pub fn start(&self) -> Option<Event> {
        let mut core = self.lock();
        if core.store.is_running() {
            if !core.scheduler.is_armed() && self.arm_decay(&mut core) {
                tracing::info!("decay resumed");
            } else {
                tracing::debug!("start ignored, already tracking");
            }
            return None;
        }
        core.store.set_state(TrackingState::Running);
        self.arm_decay(&mut core);

        let snapshot = core.store.snapshot();
        core.presenter.present(&snapshot);
        tracing::info!(level_ml = snapshot.level_ml, "tracking started");
        Some(Event::TrackingStarted {
            level_ml: snapshot.level_ml,
            at: Utc::now(),
        })
    }

    fn arm_decay(&self, core: &mut Core) -> bool {
        let weak = Arc::downgrade(&self.core);
        match core.scheduler.arm(move |generation| decay_tick(&weak, generation)) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "decay paused: cannot schedule ticks");
                false
            }
        }
    }

    /// Stop tracking. After this returns no decay tick will touch the level.
    /// Returns `None` if already stopped.
    pub fn stop(&self) -> Option<Event> {
        let mut core = self.lock();
        core.scheduler.disarm();
        if !core.store.set_state(TrackingState::Stopped) {
            tracing::debug!("stop ignored, not tracking");
            return None;
        }
        core.presenter.withdraw();
        let level_ml = core.store.level_ml();
        tracing::info!(level_ml, "tracking stopped");
        Some(Event::TrackingStopped {
            level_ml,
            at: Utc::now(),
        })
    }

    /// Add `amount_ml` to the level, in either tracking state.
    ///
    /// # Errors
    ///
    /// Rejects zero, negative and non-finite amounts, and sums that would
    /// overflow. The level is unchanged on error.
    pub fn add_water(&self, amount_ml: f64) -> Result<Event, ValidationError> {
        let mut core = self.lock();
        let level_ml = core.store.add(amount_ml).inspect_err(|e| {
            tracing::warn!(error = %e, "add water rejected");
        })?;
        let snapshot = core.store.snapshot();
        core.presenter.present(&snapshot);
        tracing::info!(amount_ml, level_ml, "water added");
        Ok(Event::WaterAdded {
            amount_ml,
            level_ml,
            at: Utc::now(),
        })
    }

    /// Add one glass (the configured default amount).
    pub fn add_glass(&self) -> Result<Event, ValidationError> {
        let glass_ml = self.settings().glass_ml;
        self.add_water(glass_ml)
    }

    /// Force the status surface to be redrawn with the current snapshot.
    pub fn refresh_status(&self) -> bool {
        let mut core = self.lock();
        let snapshot = core.store.snapshot();
        core.presenter.redraw(&snapshot)
    }

    #[cfg(test)]
    fn tick_now(&self) -> Option<Event> {
        let mut core = self.lock();
        let generation = core.scheduler.generation();
        core.on_decay_tick(generation)
    }
}

/// Scheduler callback. Ends the timer task once the engine is gone.
fn decay_tick(core: &Weak<Mutex<Core>>, generation: u64) -> ControlFlow<()> {
    let Some(core) = core.upgrade() else {
        return ControlFlow::Break(());
    };
    let mut core = core.lock().unwrap_or_else(PoisonError::into_inner);
    core.on_decay_tick(generation);
    ControlFlow::Continue(())
}
