//! Status presenter.
//!
//! Projects a [`StatusSnapshot`] onto the status surface. Presentation is
//! best-effort: an unavailable or failing sink is logged and skipped, and the
//! caller never sees an error.

use serde::{Deserialize, Serialize};

use super::sink::StatusSink;
use crate::tracker::StatusSnapshot;

pub const DEFAULT_TITLE: &str = "Hydration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Default,
    High,
}

/// How the surface should treat the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationHint {
    /// Stays on the surface until withdrawn.
    pub ongoing: bool,
    /// No sound, no vibration.
    pub silent: bool,
    pub dismissible: bool,
    pub priority: Priority,
}

impl PresentationHint {
    pub fn persistent() -> Self {
        Self {
            ongoing: true,
            silent: true,
            dismissible: false,
            priority: Priority::Low,
        }
    }
}

/// One rendered status record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub title: String,
    pub text: String,
    pub hint: PresentationHint,
}

/// `"<level, 1 decimal> ml"`.
pub fn format_level(level_ml: f64) -> String {
    format!("{level_ml:.1} ml")
}

pub struct StatusPresenter {
    sink: Box<dyn StatusSink>,
    title: String,
    enabled: bool,
    /// Last record successfully drawn; identical records are not re-issued.
    last: Option<StatusRecord>,
    /// Last observed availability, so a missing channel is reported once.
    available: bool,
}

impl StatusPresenter {
    pub fn new(title: impl Into<String>, sink: Box<dyn StatusSink>) -> Self {
        Self {
            sink,
            title: title.into(),
            enabled: true,
            last: None,
            available: true,
        }
    }

    /// Presenter that never touches its sink.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(DEFAULT_TITLE, Box::new(super::sink::NullSink))
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn compose(&self, snapshot: &StatusSnapshot) -> StatusRecord {
        StatusRecord {
            title: self.title.clone(),
            text: format_level(snapshot.level_ml),
            hint: PresentationHint::persistent(),
        }
    }

    /// Draw `snapshot` unless the same record is already on the surface.
    /// Returns `true` if the sink accepted a draw.
    pub fn present(&mut self, snapshot: &StatusSnapshot) -> bool {
        let record = self.compose(snapshot);
        if self.last.as_ref() == Some(&record) {
            tracing::trace!(text = %record.text, "status unchanged, skipping draw");
            return false;
        }
        self.draw(record)
    }

    /// Draw `snapshot` even if it matches what is already shown.
    pub fn redraw(&mut self, snapshot: &StatusSnapshot) -> bool {
        let record = self.compose(snapshot);
        self.draw(record)
    }

    /// Remove the record from the surface.
    pub fn withdraw(&mut self) {
        if !self.enabled || self.last.is_none() {
            return;
        }
        self.last = None;
        if let Err(e) = self.sink.withdraw() {
            tracing::warn!(error = %e, "failed to withdraw status");
        }
    }

    fn draw(&mut self, record: StatusRecord) -> bool {
        if !self.enabled {
            return false;
        }
        if !self.sink.is_available() {
            if self.available {
                tracing::warn!("status channel unavailable; tracking continues without indicator");
                self.available = false;
            }
            self.last = None;
            return false;
        }
        if !self.available {
            tracing::info!("status channel available again");
            self.available = true;
        }
        match self.sink.render(&record) {
            Ok(()) => {
                tracing::debug!(text = %record.text, "status rendered");
                self.last = Some(record);
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to render status");
                self.last = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::sink::RecordingSink;

    fn snap(level_ml: f64) -> StatusSnapshot {
        StatusSnapshot {
            level_ml,
            running: true,
        }
    }

    #[test]
    fn format_level_uses_one_decimal() {
        assert_eq!(format_level(250.0), "250.0 ml");
        assert_eq!(format_level(249.856), "249.9 ml");
        assert_eq!(format_level(0.0), "0.0 ml");
    }

    #[test]
    fn record_carries_persistent_low_priority_hint() {
        let presenter = StatusPresenter::new("Hydration", Box::new(RecordingSink::new()));
        let record = presenter.compose(&snap(10.0));
        assert_eq!(record.title, "Hydration");
        assert!(record.hint.ongoing);
        assert!(record.hint.silent);
        assert!(!record.hint.dismissible);
        assert_eq!(record.hint.priority, Priority::Low);
    }

    #[test]
    fn identical_snapshot_is_not_redrawn() {
        let probe = RecordingSink::new();
        let mut presenter = StatusPresenter::new("Hydration", Box::new(probe.clone()));
        assert!(presenter.present(&snap(250.0)));
        assert!(!presenter.present(&snap(250.0)));
        // Rounds to the same text.
        assert!(!presenter.present(&snap(250.01)));
        assert_eq!(probe.render_count(), 1);

        assert!(presenter.redraw(&snap(250.0)));
        assert_eq!(probe.render_count(), 2);
        assert_eq!(probe.rendered()[0], probe.rendered()[1]);
    }

    #[test]
    fn unavailable_channel_is_skipped_silently() {
        let probe = RecordingSink::new();
        probe.set_available(false);
        let mut presenter = StatusPresenter::new("Hydration", Box::new(probe.clone()));
        assert!(!presenter.present(&snap(1.0)));
        assert_eq!(probe.render_count(), 0);

        probe.set_available(true);
        assert!(presenter.present(&snap(1.0)));
        assert_eq!(probe.render_count(), 1);
    }

    #[test]
    fn failed_render_is_retried_on_next_present() {
        let probe = RecordingSink::new();
        probe.set_failing(true);
        let mut presenter = StatusPresenter::new("Hydration", Box::new(probe.clone()));
        assert!(!presenter.present(&snap(5.0)));

        probe.set_failing(false);
        assert!(presenter.present(&snap(5.0)));
        assert_eq!(probe.render_count(), 1);
    }

    #[test]
    fn withdraw_only_after_a_draw() {
        let probe = RecordingSink::new();
        let mut presenter = StatusPresenter::new("Hydration", Box::new(probe.clone()));
        presenter.withdraw();
        assert_eq!(probe.withdrawals(), 0);

        presenter.present(&snap(3.0));
        presenter.withdraw();
        presenter.withdraw();
        assert_eq!(probe.withdrawals(), 1);

        // Surface is empty again, so the same level draws anew.
        assert!(presenter.present(&snap(3.0)));
    }

    #[test]
    fn disabled_presenter_never_draws() {
        let mut presenter = StatusPresenter::disabled();
        assert!(!presenter.is_enabled());
        assert!(!presenter.present(&snap(3.0)));
    }
}
