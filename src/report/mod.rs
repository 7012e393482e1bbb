//! Report module - integrity scoring and report export

mod score;
mod export;

pub use score::{compute_score, compute_score_with, ScoreWeights};
pub use export::ReportExporter;

use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{Event, EventKind, Session};

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the report is written to
    pub output_dir: PathBuf,

    /// Report file name
    pub file_name: String,

    /// Export format
    pub format: ExportFormat,

    /// Penalty per event kind
    pub weights: ScoreWeights,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_name: "proctoring_report.csv".to_string(),
            format: ExportFormat::Csv,
            weights: ScoreWeights::default(),
        }
    }
}

/// Export format
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Per-kind event totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub no_face: usize,
    pub multiple_faces: usize,
    pub suspicious_item: usize,
    pub eyes_closed: usize,
    pub looking_away: usize,
}

impl EventCounts {
    pub fn from_events(events: &[Event]) -> Self {
        let mut counts = Self::default();
        for event in events {
            *counts.slot(event.kind) += 1;
        }
        counts
    }

    pub fn get(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::NoFaceDetected => self.no_face,
            EventKind::MultipleFacesDetected => self.multiple_faces,
            EventKind::SuspiciousItemDetected => self.suspicious_item,
            EventKind::EyesClosed => self.eyes_closed,
            EventKind::LookingAway => self.looking_away,
        }
    }

    fn slot(&mut self, kind: EventKind) -> &mut usize {
        match kind {
            EventKind::NoFaceDetected => &mut self.no_face,
            EventKind::MultipleFacesDetected => &mut self.multiple_faces,
            EventKind::SuspiciousItemDetected => &mut self.suspicious_item,
            EventKind::EyesClosed => &mut self.eyes_closed,
            EventKind::LookingAway => &mut self.looking_away,
        }
    }

    pub fn total(&self) -> usize {
        EventKind::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

/// Structured end-of-session report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub session_id: Uuid,
    pub candidate_name: String,
    pub started_at: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub counts: EventCounts,
    pub score: u8,
    pub events: Vec<Event>,
}

/// Candidate name shown when none was entered
pub const UNKNOWN_CANDIDATE: &str = "Unknown";

/// Build a report for the session as of now
pub fn build_report(session: &Session, weights: &ScoreWeights) -> Report {
    build_report_at(session, weights, Utc::now())
}

/// Build a report for the session as of `at`
pub fn build_report_at(session: &Session, weights: &ScoreWeights, at: DateTime<Utc>) -> Report {
    let events = session.log().read_all();
    let name = session.candidate_name();
    let candidate_name = if name.trim().is_empty() {
        UNKNOWN_CANDIDATE.to_string()
    } else {
        name
    };

    Report {
        session_id: session.id(),
        candidate_name,
        started_at: session.start_time(),
        generated_at: at,
        duration_secs: session.elapsed_secs_at(at),
        counts: EventCounts::from_events(&events),
        score: compute_score_with(&events, weights),
        events,
    }
}
