//! Periodic decay scheduler.
//!
//! Owns at most one tokio interval task. Each armed period gets a fresh
//! generation number which is handed to the tick callback; disarming bumps the
//! generation so a callback already in flight can recognise itself as stale.
//!
//! ## Usage
//!
//! ```ignore
//! let mut scheduler = DecayScheduler::new(Duration::from_millis(5000));
//! scheduler.arm(|generation| {
//!     // apply one tick
//!     ControlFlow::Continue(())
//! })?;
//! scheduler.disarm();
//! ```

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::ScheduleError;

#[derive(Debug)]
pub struct DecayScheduler {
    period: Duration,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl DecayScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            task: None,
            generation: 0,
        }
    }

    /// Generation of the currently armed task (or of the last disarm).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_armed(&self) -> bool {
        self.task.is_some()
    }

    /// Number of outstanding periodic handles. Never more than one.
    pub fn armed_count(&self) -> usize {
        usize::from(self.is_armed())
    }

    /// Start firing `on_tick` once per period, first after one full period.
    ///
    /// Arming an already armed scheduler is a no-op returning the current
    /// generation. Fails for a zero period, or when no tokio runtime is
    /// reachable from the caller.
    pub fn arm<F>(&mut self, on_tick: F) -> Result<u64, ScheduleError>
    where
        F: Fn(u64) -> ControlFlow<()> + Send + 'static,
    {
        if self.is_armed() {
            return Ok(self.generation);
        }
        if self.period.is_zero() {
            return Err(ScheduleError::ZeroPeriod);
        }
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;

        self.generation += 1;
        let generation = self.generation;
        let period = self.period;

        self.task = Some(runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            // Ticks missed while the host was not executing are dropped.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if on_tick(generation).is_break() {
                    tracing::debug!(generation, "decay task finished");
                    break;
                }
            }
        }));
        tracing::debug!(generation, ?period, "decay scheduler armed");
        Ok(generation)
    }

    /// Cancel the outstanding task, if any. Returns `true` if one was armed.
    pub fn disarm(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                self.generation += 1;
                tracing::debug!(generation = self.generation, "decay scheduler disarmed");
                true
            }
            None => false,
        }
    }
}

impl Drop for DecayScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
