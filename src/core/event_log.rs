// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Append-only session event log with subscribe/notify

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

/// Behavioral event kinds emitted by the rule engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    NoFaceDetected,
    MultipleFacesDetected,
    SuspiciousItemDetected,
    EyesClosed,
    LookingAway,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::NoFaceDetected,
        EventKind::MultipleFacesDetected,
        EventKind::SuspiciousItemDetected,
        EventKind::EyesClosed,
        EventKind::LookingAway,
    ];
}

/// One logged occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub detail: Option<String>,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Human-readable text used in the UI log and the report
    pub fn message(&self) -> String {
        match (self.kind, self.detail.as_deref()) {
            (EventKind::NoFaceDetected, _) => "No face detected".to_string(),
            (EventKind::MultipleFacesDetected, Some(count)) => {
                format!("Multiple faces detected ({})", count)
            }
            (EventKind::MultipleFacesDetected, None) => "Multiple faces detected".to_string(),
            (EventKind::SuspiciousItemDetected, Some(label)) => {
                format!("Suspicious item detected: {}", label)
            }
            (EventKind::SuspiciousItemDetected, None) => "Suspicious item detected".to_string(),
            (EventKind::EyesClosed, _) => "Eyes closed".to_string(),
            (EventKind::LookingAway, _) => "Looking away from screen".to_string(),
        }
    }
}

/// Ordered, append-only sequence of events for one session
///
/// Insertion order is chronological order. Events are never mutated,
/// removed or reordered once appended.
pub struct SessionLog {
    events: RwLock<Vec<Event>>,
    event_tx: broadcast::Sender<Event>,
}

impl SessionLog {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            events: RwLock::new(Vec::new()),
            event_tx,
        }
    }

    pub fn append(&self, event: Event) {
        debug!("Logged {:?} at {}", event.kind, event.timestamp.to_rfc3339());
        self.events.write().push(event.clone());
        let _ = self.event_tx.send(event);
    }

    /// Owned snapshot of every event so far
    pub fn read_all(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.read().iter().filter(|e| e.kind == kind).count()
    }

    pub fn last(&self) -> Option<Event> {
        self.events.read().last().cloned()
    }

    /// Receive every event appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Feed a subscription into `on_event` until the log is dropped.
///
/// A lagging subscriber skips the overwritten events and keeps going.
/// Returns how many events were missed that way.
pub async fn follow<F>(mut rx: broadcast::Receiver<Event>, mut on_event: F) -> u64
where
    F: FnMut(Event),
{
    let mut missed = 0;
    loop {
        match rx.recv().await {
            Ok(event) => on_event(event),
            Err(RecvError::Lagged(n)) => {
                warn!("Event subscriber fell behind, {} events skipped", n);
                missed += n;
            }
            Err(RecvError::Closed) => break,
        }
    }
    missed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_append_preserves_order() {
        let log = SessionLog::default();
        let t0 = Utc::now();
        log.append(Event::new(EventKind::LookingAway, t0));
        log.append(Event::new(EventKind::EyesClosed, t0));
        log.append(Event::new(EventKind::NoFaceDetected, t0 + Duration::seconds(1)));

        let events = log.read_all();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, EventKind::LookingAway);
        assert_eq!(events[1].kind, EventKind::EyesClosed);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let log = SessionLog::default();
        log.append(Event::new(EventKind::EyesClosed, Utc::now()));
        let snapshot = log.read_all();
        log.append(Event::new(EventKind::EyesClosed, Utc::now()));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
        assert_eq!(log.count(EventKind::EyesClosed), 2);
    }

    #[tokio::test]
    async fn test_subscribers_are_notified() {
        let log = SessionLog::default();
        let mut rx = log.subscribe();
        log.append(Event::new(EventKind::SuspiciousItemDetected, Utc::now()).with_detail("book"));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.detail.as_deref(), Some("book"));
    }

    #[tokio::test]
    async fn test_follow_survives_lag() {
        let log = SessionLog::new(2);
        let rx = log.subscribe();
        let t0 = Utc::now();
        for i in 0..5 {
            log.append(Event::new(EventKind::LookingAway, t0 + Duration::seconds(i)));
        }
        drop(log);

        let mut seen = Vec::new();
        let missed = follow(rx, |event| seen.push(event.timestamp)).await;

        assert_eq!(missed, 3);
        assert_eq!(seen, vec![t0 + Duration::seconds(3), t0 + Duration::seconds(4)]);
    }

    #[test]
    fn test_messages() {
        let now = Utc::now();
        assert_eq!(
            Event::new(EventKind::MultipleFacesDetected, now).with_detail("3").message(),
            "Multiple faces detected (3)"
        );
        assert_eq!(
            Event::new(EventKind::SuspiciousItemDetected, now).with_detail("cell phone").message(),
            "Suspicious item detected: cell phone"
        );
        assert_eq!(Event::new(EventKind::NoFaceDetected, now).message(), "No face detected");
    }
}
