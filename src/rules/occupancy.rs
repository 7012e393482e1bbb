// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Multiple occupants in frame

use std::time::Instant;

use super::{Cooldown, Rule, RuleConfig, RuleId};
use crate::core::{Event, EventKind};
use crate::detection::FrameContext;

pub struct MultipleOccupantsRule {
    person_label: String,
    cooldown: Cooldown,
}

impl MultipleOccupantsRule {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            person_label: config.person_label.clone(),
            cooldown: Cooldown::from_millis(config.multiple_faces_cooldown_ms),
        }
    }
}

impl Rule for MultipleOccupantsRule {
    fn id(&self) -> RuleId {
        RuleId::MultipleOccupants
    }

    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        let count = ctx.count_label(&self.person_label);
        if count <= 1 || !self.cooldown.is_ready(now) {
            return Vec::new();
        }

        self.cooldown.fire(now);
        vec![Event::new(EventKind::MultipleFacesDetected, ctx.captured_at())
            .with_detail(count.to_string())]
    }
}
