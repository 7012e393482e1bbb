// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Proctorwatch - Real-Time Proctoring Monitor
//!
//! Samples a live video feed once per second, runs each frame through an
//! object-detection model, applies behavioral rules and keeps a timestamped
//! event log from which an integrity score and a report are derived.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Proctorwatch Monitor                    │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌───────────┐  ┌────────────┐  ┌────────────┐  │
//! │  │ Sampler │→ │ Detection │→ │   Rule     │→ │  Session   │  │
//! │  │ (1 Hz)  │  │ Adapter   │  │   Engine   │  │  Log       │  │
//! │  └─────────┘  └───────────┘  └────────────┘  └────────────┘  │
//! │       ↑                                            ↓         │
//! │  ┌─────────┐                               ┌──────────────┐  │
//! │  │ Video   │                               │ Score/Report │  │
//! │  │ Source  │                               │  Generator   │  │
//! │  └─────────┘                               └──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod core;
pub mod capture;
pub mod detection;
pub mod rules;
pub mod report;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use config::Config;
pub use crate::core::{Event, EventKind, Monitor, MonitorState, Session, SessionLog};
pub use capture::{Frame, VideoSource};
pub use detection::{Detection, Detector, FrameContext};
pub use rules::{Rule, RuleEngine, RuleId};
pub use report::{compute_score, Report, ReportExporter};
pub use error::ProctorError;

/// Proctorwatch version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Proctorwatch name
pub const NAME: &str = "Proctorwatch";
