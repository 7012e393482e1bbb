// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Integrity score

use serde::{Deserialize, Serialize};

use crate::core::{Event, EventKind};

const BASELINE: i64 = 100;

/// Penalty deducted per logged event of each kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub no_face: u32,
    pub multiple_faces: u32,
    pub suspicious_item: u32,
    pub eyes_closed: u32,
    pub looking_away: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            no_face: 5,
            multiple_faces: 5,
            suspicious_item: 10,
            eyes_closed: 10,
            looking_away: 5,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, kind: EventKind) -> u32 {
        match kind {
            EventKind::NoFaceDetected => self.no_face,
            EventKind::MultipleFacesDetected => self.multiple_faces,
            EventKind::SuspiciousItemDetected => self.suspicious_item,
            EventKind::EyesClosed => self.eyes_closed,
            EventKind::LookingAway => self.looking_away,
        }
    }
}

/// Score with the default weights
pub fn compute_score(events: &[Event]) -> u8 {
    compute_score_with(events, &ScoreWeights::default())
}

/// 100 minus the weighted event penalties, floored at 0
pub fn compute_score_with(events: &[Event], weights: &ScoreWeights) -> u8 {
    let penalty: i64 = events
        .iter()
        .map(|e| i64::from(weights.weight(e.kind)))
        .sum();
    (BASELINE - penalty).clamp(0, BASELINE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn events(kind: EventKind, n: usize) -> Vec<Event> {
        (0..n).map(|_| Event::new(kind, Utc::now())).collect()
    }

    #[test]
    fn test_clean_log_scores_100() {
        assert_eq!(compute_score(&[]), 100);
    }

    #[test]
    fn test_mixed_penalties() {
        let mut log = events(EventKind::NoFaceDetected, 1);
        log.extend(events(EventKind::SuspiciousItemDetected, 1));
        assert_eq!(compute_score(&log), 85);
    }

    #[test]
    fn test_twelve_absences() {
        assert_eq!(compute_score(&events(EventKind::NoFaceDetected, 12)), 40);
    }

    #[test]
    fn test_floor_at_zero() {
        assert_eq!(compute_score(&events(EventKind::EyesClosed, 11)), 0);
        assert_eq!(compute_score(&events(EventKind::SuspiciousItemDetected, 500)), 0);
    }

    #[test]
    fn test_idempotent() {
        let mut log = events(EventKind::LookingAway, 3);
        log.extend(events(EventKind::MultipleFacesDetected, 2));
        let first = compute_score(&log);
        assert_eq!(first, compute_score(&log));
        assert_eq!(first, 75);
    }

    #[test]
    fn test_custom_weights() {
        let weights = ScoreWeights {
            looking_away: 20,
            ..Default::default()
        };
        assert_eq!(compute_score_with(&events(EventKind::LookingAway, 2), &weights), 60);
    }
}
