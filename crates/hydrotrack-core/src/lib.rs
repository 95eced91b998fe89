//! # Hydrotrack Core Library
//!
//! This library provides the background tracking engine for Hydrotrack: a
//! hydration level that decays on a fixed cadence and is replenished by
//! explicit commands, mirrored onto a persistent status surface. Front-end
//! clients are thin layers that send commands and read state.
//!
//! ## Architecture
//!
//! - **Tracker**: level store, decay scheduler and the engine state machine
//! - **Status**: presenter and sinks for the persistent indicator
//! - **Gateway**: decodes external commands and applies them in order
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TrackingEngine`]: single authority over level and tracking state
//! - [`DecayScheduler`]: cancellable periodic decay task
//! - [`StatusPresenter`]: best-effort rendering of the status record
//! - [`CommandGateway`]: boundary for external commands
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod gateway;
pub mod status;
pub mod storage;
pub mod tracker;

pub use error::{CommandError, ConfigError, CoreError, ScheduleError, ValidationError};
pub use events::Event;
pub use gateway::{Command, CommandGateway, CommandReply};
pub use status::{SinkKind, StatusPresenter, StatusRecord, StatusSink};
pub use storage::Config;
pub use tracker::{
    DecayScheduler, EngineSettings, StatusSnapshot, TrackingEngine, TrackingState,
};
