mod presenter;
mod sink;

pub use presenter::{
    format_level, PresentationHint, Priority, StatusPresenter, StatusRecord, DEFAULT_TITLE,
};
pub use sink::{
    LogSink, NullSink, PresentError, RecordingSink, SinkKind, StatusSink, TerminalSink,
};
