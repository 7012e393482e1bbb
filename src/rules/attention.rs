// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Gaze and eyes-closed heuristics
//!
//! Both are bounding-box proxies on a single person: horizontal center for
//! gaze, box height for eyes closed.

use std::time::Instant;

use super::{Cooldown, Rule, RuleConfig, RuleId};
use crate::core::{Event, EventKind};
use crate::detection::{Detection, FrameContext};

fn sole_person<'a>(ctx: &'a FrameContext, label: &str) -> Option<&'a Detection> {
    let mut people = ctx.detections().iter().filter(|d| d.is(label));
    match (people.next(), people.next()) {
        (Some(p), None) => Some(p),
        _ => None,
    }
}

/// Face center drifting out of the middle band of the frame
pub struct GazeRule {
    person_label: String,
    min_x: f32,
    max_x: f32,
    cooldown: Cooldown,
}

impl GazeRule {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            person_label: config.person_label.clone(),
            min_x: config.gaze_min_x,
            max_x: config.gaze_max_x,
            cooldown: Cooldown::from_millis(config.gaze_cooldown_ms),
        }
    }
}

impl Rule for GazeRule {
    fn id(&self) -> RuleId {
        RuleId::GazeDeviation
    }

    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        if ctx.frame_width() == 0 {
            return Vec::new();
        }
        let Some(person) = sole_person(ctx, &self.person_label) else {
            return Vec::new();
        };

        let x = person.bounding_box.center_x() / ctx.frame_width() as f32;
        if (self.min_x..=self.max_x).contains(&x) || !self.cooldown.is_ready(now) {
            return Vec::new();
        }

        self.cooldown.fire(now);
        vec![Event::new(EventKind::LookingAway, ctx.captured_at())]
    }
}

/// Person box collapsing below a height ratio
///
/// Defaults to no cooldown, so it fires on every qualifying tick.
pub struct EyesClosedRule {
    person_label: String,
    max_height: f32,
    cooldown: Cooldown,
}

impl EyesClosedRule {
    pub fn new(config: &RuleConfig) -> Self {
        Self {
            person_label: config.person_label.clone(),
            max_height: config.eyes_closed_max_height,
            cooldown: Cooldown::from_millis(config.eyes_closed_cooldown_ms),
        }
    }
}

impl Rule for EyesClosedRule {
    fn id(&self) -> RuleId {
        RuleId::EyesClosed
    }

    fn evaluate(&mut self, ctx: &FrameContext, now: Instant) -> Vec<Event> {
        if ctx.frame_height() == 0 {
            return Vec::new();
        }
        let Some(person) = sole_person(ctx, &self.person_label) else {
            return Vec::new();
        };

        let h = person.bounding_box.height / ctx.frame_height() as f32;
        if h >= self.max_height || !self.cooldown.is_ready(now) {
            return Vec::new();
        }

        self.cooldown.fire(now);
        vec![Event::new(EventKind::EyesClosed, ctx.captured_at())]
    }
}
