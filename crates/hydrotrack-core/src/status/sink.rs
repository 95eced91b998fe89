//! Presentation channels for the status surface.
//!
//! A sink is whatever the host can show persistently: a terminal status line,
//! a log stream, an OS notification bridge. Sinks may be unavailable (no
//! terminal, permission denied) and may fail; the presenter absorbs both.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::presenter::StatusRecord;

#[derive(Error, Debug)]
pub enum PresentError {
    /// The channel exists but the host refused access
    #[error("Presentation channel denied: {0}")]
    Denied(String),

    /// The channel is not reachable right now
    #[error("Presentation channel unavailable: {0}")]
    Unavailable(String),

    #[error("Presentation IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A persistent, externally visible status surface.
pub trait StatusSink: Send {
    /// Whether the channel can currently be drawn on.
    fn is_available(&self) -> bool {
        true
    }

    /// Draw (or replace) the persistent status record.
    fn render(&mut self, record: &StatusRecord) -> Result<(), PresentError>;

    /// Remove the status record from the surface.
    fn withdraw(&mut self) -> Result<(), PresentError>;
}

/// Sink selection, as written in the `[status]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    #[default]
    Terminal,
    Log,
    None,
}

impl SinkKind {
    pub fn build(self) -> Box<dyn StatusSink> {
        match self {
            SinkKind::Terminal => Box::new(TerminalSink::stderr()),
            SinkKind::Log => Box::new(LogSink),
            SinkKind::None => Box::new(NullSink),
        }
    }
}

// ── Terminal ─────────────────────────────────────────────────────────

/// Writes one status line per render to the wrapped writer.
pub struct TerminalSink<W: Write + Send> {
    out: W,
}

impl TerminalSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StatusSink for TerminalSink<W> {
    fn render(&mut self, record: &StatusRecord) -> Result<(), PresentError> {
        writeln!(self.out, "[{}] {}", record.title, record.text)?;
        self.out.flush()?;
        Ok(())
    }

    fn withdraw(&mut self) -> Result<(), PresentError> {
        writeln!(self.out, "[status cleared]")?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Log ──────────────────────────────────────────────────────────────

/// Emits the status record as a structured log line.
pub struct LogSink;

impl StatusSink for LogSink {
    fn render(&mut self, record: &StatusRecord) -> Result<(), PresentError> {
        tracing::info!(
            target: "hydrotrack_core::status",
            title = %record.title,
            ongoing = record.hint.ongoing,
            "{}",
            record.text
        );
        Ok(())
    }

    fn withdraw(&mut self) -> Result<(), PresentError> {
        tracing::info!(target: "hydrotrack_core::status", "status withdrawn");
        Ok(())
    }
}

// ── Null ─────────────────────────────────────────────────────────────

/// A channel that is never available.
pub struct NullSink;

impl StatusSink for NullSink {
    fn is_available(&self) -> bool {
        false
    }

    fn render(&mut self, _record: &StatusRecord) -> Result<(), PresentError> {
        Err(PresentError::Unavailable("no status channel configured".into()))
    }

    fn withdraw(&mut self) -> Result<(), PresentError> {
        Ok(())
    }
}

// ── Recording ────────────────────────────────────────────────────────

/// In-memory sink for embedding hosts that poll the surface themselves.
///
/// Clones share the same buffer, so one clone can be handed to the presenter
/// while another is kept to inspect what was drawn. Availability and failure
/// can be toggled to simulate a denied channel.
#[derive(Clone, Default)]
pub struct RecordingSink {
    shared: Arc<Mutex<RecordingState>>,
}

#[derive(Default)]
struct RecordingState {
    rendered: Vec<StatusRecord>,
    withdrawals: usize,
    unavailable: bool,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, RecordingState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_available(&self, available: bool) {
        self.state().unavailable = !available;
    }

    /// Make every render return an error while still reporting availability.
    pub fn set_failing(&self, failing: bool) {
        self.state().failing = failing;
    }

    pub fn rendered(&self) -> Vec<StatusRecord> {
        self.state().rendered.clone()
    }

    pub fn last(&self) -> Option<StatusRecord> {
        self.state().rendered.last().cloned()
    }

    pub fn render_count(&self) -> usize {
        self.state().rendered.len()
    }

    pub fn withdrawals(&self) -> usize {
        self.state().withdrawals
    }
}

impl StatusSink for RecordingSink {
    fn is_available(&self) -> bool {
        !self.state().unavailable
    }

    fn render(&mut self, record: &StatusRecord) -> Result<(), PresentError> {
        let mut state = self.state();
        if state.failing {
            return Err(PresentError::Denied("notification permission missing".into()));
        }
        state.rendered.push(record.clone());
        Ok(())
    }

    fn withdraw(&mut self) -> Result<(), PresentError> {
        self.state().withdrawals += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::presenter::PresentationHint;

    fn record(text: &str) -> StatusRecord {
        StatusRecord {
            title: "Hydration".into(),
            text: text.into(),
            hint: PresentationHint::persistent(),
        }
    }

    #[test]
    fn terminal_sink_writes_one_line_per_render() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.render(&record("250.0 ml")).unwrap();
        sink.render(&record("249.9 ml")).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "[Hydration] 250.0 ml\n[Hydration] 249.9 ml\n");
    }

    #[test]
    fn null_sink_is_never_available() {
        let mut sink = NullSink;
        assert!(!sink.is_available());
        assert!(sink.render(&record("1.0 ml")).is_err());
    }

    #[test]
    fn recording_sink_clones_share_state() {
        let probe = RecordingSink::new();
        let mut sink = probe.clone();
        sink.render(&record("1.0 ml")).unwrap();
        assert_eq!(probe.render_count(), 1);

        probe.set_failing(true);
        assert!(sink.render(&record("2.0 ml")).is_err());
        assert_eq!(probe.render_count(), 1);
    }

    #[test]
    fn sink_kind_parses_lowercase() {
        let kind: SinkKind = serde_json::from_str("\"log\"").unwrap();
        assert_eq!(kind, SinkKind::Log);
        assert!(serde_json::from_str::<SinkKind>("\"popup\"").is_err());
    }
}
