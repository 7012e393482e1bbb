// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Rule engine - per-rule state machines that turn detections into events
//!
//! Every rule owns its own cooldown state and sees the same `FrameContext`.
//! One rule's suppression never affects another rule's eligibility.

mod presence;
mod occupancy;
mod objects;
mod attention;

pub use presence::AbsenceRule;
pub use occupancy::MultipleOccupantsRule;
pub use objects::ProhibitedObjectRule;
pub use attention::{EyesClosedRule, GazeRule};

use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Event, EventKind};
use crate::detection::{FrameContext, PERSON_LABEL};

/// Rule identifiers, ordered by evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    Absence,
    MultipleOccupants,
    ProhibitedObject,
    GazeDeviation,
    EyesClosed,
}

/// A behavioral rule evaluated once per sampling tick
pub trait Rule: Send {
    fn id(&self) -> RuleId;

    /// Inspect one frame at monotonic time `now`, returning any events fired
    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event>;
}

/// Minimum spacing between firings, measured from the rule's own last firing
#[derive(Debug, Clone)]
pub struct Cooldown {
    period: Duration,
    last_fired_at: Option<Instant>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_fired_at: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        match self.last_fired_at {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.period,
        }
    }

    pub fn fire(&mut self, now: Instant) {
        self.last_fired_at = Some(now);
    }

    pub fn last_fired_at(&self) -> Option<Instant> {
        self.last_fired_at
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Rule thresholds and cooldowns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Label the model uses for people
    pub person_label: String,

    /// Continuous absence before `NoFaceDetected` fires
    pub absence_threshold_ms: u64,

    /// Multiple occupants cooldown
    pub multiple_faces_cooldown_ms: u64,

    /// Labels that count as prohibited objects
    pub prohibited_labels: Vec<String>,

    /// Cooldown shared by all prohibited labels
    pub prohibited_cooldown_ms: u64,

    /// Gaze deviation cooldown
    pub gaze_cooldown_ms: u64,

    /// Accepted band for the normalized horizontal face center
    pub gaze_min_x: f32,
    pub gaze_max_x: f32,

    /// Normalized box height below which eyes count as closed
    pub eyes_closed_max_height: f32,

    /// Eyes-closed cooldown, 0 fires on every qualifying tick
    pub eyes_closed_cooldown_ms: u64,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            person_label: PERSON_LABEL.to_string(),
            absence_threshold_ms: 5000,
            multiple_faces_cooldown_ms: 5000,
            prohibited_labels: ["cell phone", "book", "laptop", "keyboard", "remote"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prohibited_cooldown_ms: 2000,
            gaze_cooldown_ms: 5000,
            gaze_min_x: 0.35,
            gaze_max_x: 0.65,
            eyes_closed_max_height: 0.10,
            eyes_closed_cooldown_ms: 0,
        }
    }
}

/// Holds every rule keyed by id and fans each frame out to them
pub struct RuleEngine {
    rules: BTreeMap<RuleId, Box<dyn Rule>>,
    person_label: String,
    face_detected: bool,
    frames_evaluated: u64,
}

impl RuleEngine {
    /// Standard rule set. `started` seeds the absence gate.
    pub fn new(config: &RuleConfig, started: Instant) -> Self {
        let mut engine = Self::empty();
        engine.person_label = config.person_label.clone();
        engine.insert(Box::new(AbsenceRule::new(config, started)));
        engine.insert(Box::new(MultipleOccupantsRule::new(config)));
        engine.insert(Box::new(ProhibitedObjectRule::new(config)));
        engine.insert(Box::new(GazeRule::new(config)));
        engine.insert(Box::new(EyesClosedRule::new(config)));
        engine
    }

    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
            person_label: PERSON_LABEL.to_string(),
            face_detected: false,
            frames_evaluated: 0,
        }
    }

    /// Add or replace a rule
    pub fn insert(&mut self, rule: Box<dyn Rule>) {
        self.rules.insert(rule.id(), rule);
    }

    pub fn remove(&mut self, id: RuleId) -> Option<Box<dyn Rule>> {
        self.rules.remove(&id)
    }

    pub fn rule_ids(&self) -> Vec<RuleId> {
        self.rules.keys().copied().collect()
    }

    /// Run every rule against one frame
    pub fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        self.frames_evaluated += 1;

        let mut events = Vec::new();
        for (id, rule) in self.rules.iter_mut() {
            let fired = rule.evaluate(ctx, now);
            if !fired.is_empty() {
                debug!("Rule {:?} fired {} event(s)", id, fired.len());
            }
            events.extend(fired);
        }

        if ctx.count_label(&self.person_label) > 0 {
            self.face_detected = true;
        } else if events.iter().any(|e| e.kind == EventKind::NoFaceDetected) {
            self.face_detected = false;
        }

        events
    }

    /// Status-badge flag: set on presence, cleared when absence fires
    pub fn face_detected(&self) -> bool {
        self.face_detected
    }

    pub fn frames_evaluated(&self) -> u64 {
        self.frames_evaluated
    }
}
