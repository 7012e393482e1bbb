// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! One continuous monitoring run

use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::event_log::SessionLog;

/// Session metadata plus its event log
pub struct Session {
    id: Uuid,
    candidate_name: RwLock<String>,
    started_at: DateTime<Utc>,
    log: Arc<SessionLog>,
}

impl Session {
    pub fn new(candidate_name: &str) -> Self {
        Self::started_at(candidate_name, Utc::now())
    }

    pub fn started_at(candidate_name: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            candidate_name: RwLock::new(candidate_name.to_string()),
            started_at,
            log: Arc::new(SessionLog::default()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn candidate_name(&self) -> String {
        self.candidate_name.read().clone()
    }

    /// The name may change at any time before export
    pub fn set_candidate_name(&self, name: &str) {
        *self.candidate_name.write() = name.to_string();
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Whole seconds between session start and `at`, never negative
    pub fn elapsed_secs_at(&self, at: DateTime<Utc>) -> u64 {
        (at - self.started_at).num_seconds().max(0) as u64
    }

    pub fn log(&self) -> &Arc<SessionLog> {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_rename_before_export() {
        let session = Session::new("");
        session.set_candidate_name("Ada");
        assert_eq!(session.candidate_name(), "Ada");
    }

    #[test]
    fn test_elapsed_seconds() {
        let start = Utc::now();
        let session = Session::started_at("x", start);
        assert_eq!(session.elapsed_secs_at(start + Duration::milliseconds(61_900)), 61);
        assert_eq!(session.elapsed_secs_at(start - Duration::seconds(5)), 0);
    }
}
