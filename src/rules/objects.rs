// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Prohibited objects on the desk

use std::time::Instant;

use super::{Cooldown, Rule, RuleConfig, RuleId};
use crate::core::{Event, EventKind};
use crate::detection::FrameContext;

/// One event per distinct prohibited label in the firing tick, then a
/// cooldown shared across all labels
pub struct ProhibitedObjectRule {
    labels: Vec<String>,
    cooldown: Cooldown,
}

impl ProhibitedObjectRule {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            labels: config.prohibited_labels.clone(),
            cooldown: Cooldown::from_millis(config.prohibited_cooldown_ms),
        }
    }

    fn is_prohibited(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

impl Rule for ProhibitedObjectRule {
    fn id(&self) -> RuleId {
        RuleId::ProhibitedObject
    }

    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        if !self.cooldown.is_ready(now) {
            return Vec::new();
        }

        let mut found: Vec<&str> = Vec::new();
        for d in ctx.detections() {
            if self.is_prohibited(&d.label) && !found.contains(&d.label.as_str()) {
                found.push(&d.label);
            }
        }

        if found.is_empty() {
            return Vec::new();
        }

        self.cooldown.fire(now);
        found
            .into_iter()
            .map(|label| {
                Event::new(EventKind::SuspiciousItemDetected, ctx.captured_at()).with_detail(label)
            })
            .collect()
    }
}
