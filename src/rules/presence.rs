// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Absence detection with presence reset

use std::time::{Duration, Instant};

use super::{Rule, RuleConfig, RuleId};
use crate::core::{Event, EventKind};
use crate::detection::FrameContext;

/// Fires `NoFaceDetected` once per continuous absence
///
/// The gate is the last time a person was seen (or the session start), not
/// the last firing. After firing the rule stays quiet until presence is
/// regained, so one long absence yields one event.
pub struct AbsenceRule {
    person_label: String,
    threshold: Duration,
    last_present: Instant,
    armed: bool,
}

impl AbsenceRule {
    pub fn new(config: &RuleConfig, started: Instant) -> Self {
        Self {
            person_label: config.person_label.clone(),
            threshold: Duration::from_millis(config.absence_threshold_ms),
            last_present: started,
            armed: true,
        }
    }

    pub fn last_present(&self) -> Instant {
        self.last_present
    }
}

impl Rule for AbsenceRule {
    fn id(&self) -> RuleId {
        RuleId::Absence
    }

    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        if ctx.count_label(&self.person_label) > 0 {
            self.last_present = now;
            self.armed = true;
            return Vec::new();
        }

        if self.armed && now.saturating_duration_since(self.last_present) >= self.threshold {
            self.armed = false;
            return vec![Event::new(EventKind::NoFaceDetected, ctx.captured_at())];
        }

        Vec::new()
    }
}
