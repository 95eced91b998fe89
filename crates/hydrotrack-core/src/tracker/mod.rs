mod engine;
mod level;
mod scheduler;

pub use engine::{EngineSettings, TrackingEngine, DECAY_AMOUNT_ML, DECAY_INTERVAL, GLASS_ML};
pub use level::{Decrease, LevelStore, StatusSnapshot, TrackingState};
pub use scheduler::DecayScheduler;
