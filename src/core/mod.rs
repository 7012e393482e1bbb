//! Core module - session, event log, sampler and monitor lifecycle

mod engine;
mod scheduler;
mod event_log;
mod session;

pub use engine::Monitor;
pub use scheduler::{CycleOutcome, Sampler, TickOutcome};
pub use event_log::{follow, Event, EventKind, SessionLog};
pub use session::Session;

use serde::{Deserialize, Serialize};

/// Sampler counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerStats {
    pub ticks: u64,
    pub dispatched: u64,
    pub completed: u64,
    pub skipped_busy: u64,
    pub skipped_video: u64,
    pub skipped_model: u64,
    pub discarded: u64,
    pub failed: u64,
    pub timeouts: u64,
}

/// Read-only snapshot handed to a UI layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorState {
    pub running: bool,
    pub face_detected: bool,
    pub model_ready: bool,
    pub video_ready: bool,
    pub events_logged: usize,
    pub score: u8,
    pub uptime_seconds: u64,
    pub sampler: SamplerStats,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self {
            running: false,
            face_detected: false,
            model_ready: false,
            video_ready: false,
            events_logged: 0,
            score: 100,
            uptime_seconds: 0,
            sampler: SamplerStats::default(),
        }
    }
}
