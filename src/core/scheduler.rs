// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Fixed-cadence sampler driving capture → detection → rules → log
//!
//! At most one detection cycle is in flight. A tick that lands while a
//! cycle is outstanding is skipped, never queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{SamplerStats, SessionLog};
use crate::capture::{Frame, VideoSource};
use crate::config::SamplerConfig;
use crate::detection::{Detector, FrameContext};
use crate::error::ProctorError;
use crate::rules::RuleEngine;

/// Result of one timer tick
#[derive(Debug)]
pub enum TickOutcome {
    /// A detection cycle was started
    Dispatched(JoinHandle<CycleOutcome>),
    /// Previous cycle still outstanding
    SkippedBusy,
    /// Video source not producing frames
    SkippedVideoNotReady,
    /// Sampler has been stopped
    Stopped,
}

/// Result of one detection cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Rules ran, this many events were logged
    Completed(usize),
    /// Model still loading, retried next tick
    ModelNotReady,
    /// Session ended while detection was running
    Discarded,
    /// Detection failed or timed out
    Failed(ProctorError),
}

/// Clears the in-flight flag when the cycle ends, however it ends
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Sampler {
    source: Arc<dyn VideoSource>,
    detector: Arc<dyn Detector>,
    rules: Mutex<RuleEngine>,
    log: Arc<SessionLog>,
    interval: Duration,
    watchdog: Option<Duration>,
    min_confidence: f32,
    in_flight: Arc<AtomicBool>,
    active: AtomicBool,
    stats: Mutex<SamplerStats>,
}

impl Sampler {
    pub fn new(
        config: &SamplerConfig,
        source: Arc<dyn VideoSource>,
        detector: Arc<dyn Detector>,
        rules: RuleEngine,
        log: Arc<SessionLog>,
    ) -> Self {
        Self {
            source,
            detector,
            rules: Mutex::new(rules),
            log,
            interval: Duration::from_millis(config.interval_ms.max(1)),
            watchdog: config.detect_timeout_ms.map(Duration::from_millis),
            min_confidence: config.min_confidence,
            in_flight: Arc::new(AtomicBool::new(false)),
            active: AtomicBool::new(true),
            stats: Mutex::new(SamplerStats::default()),
        }
    }

    /// Tick on the configured interval until shutdown
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        info!("Starting sampler at {:?} intervals", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Stopped = self.tick() {
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    info!("Sampler shutting down...");
                    break;
                }
            }
        }

        self.stop();
    }

    /// One sampling tick. Never blocks on detection.
    pub fn tick(self: &Arc<Self>) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Stopped;
        }
        self.stats.lock().ticks += 1;

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Detection still in flight, skipping tick");
            self.stats.lock().skipped_busy += 1;
            return TickOutcome::SkippedBusy;
        }
        let guard = InFlightGuard(self.in_flight.clone());

        if !self.source.is_ready() {
            debug!("Video source {} not ready, skipping tick", self.source.id());
            self.stats.lock().skipped_video += 1;
            return TickOutcome::SkippedVideoNotReady;
        }

        let frame = match self.source.capture() {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Capture failed: {}", e);
                self.stats.lock().skipped_video += 1;
                return TickOutcome::SkippedVideoNotReady;
            }
        };

        self.stats.lock().dispatched += 1;
        let sampler = Arc::clone(self);
        TickOutcome::Dispatched(tokio::spawn(async move { sampler.run_cycle(frame, guard).await }))
    }

    async fn run_cycle(self: Arc<Self>, frame: Frame, _guard: InFlightGuard) -> CycleOutcome {
        let result = match self.watchdog {
            Some(limit) => match timeout(limit, self.detector.detect(&frame)).await {
                Ok(result) => result,
                Err(_) => Err(ProctorError::Timeout(limit.as_millis() as u64)),
            },
            None => self.detector.detect(&frame).await,
        };

        if !self.is_active() {
            debug!("Session ended during detection, discarding frame {}", frame.sequence);
            self.stats.lock().discarded += 1;
            return CycleOutcome::Discarded;
        }

        let detections = match result {
            Ok(detections) => detections,
            Err(ProctorError::ModelNotReady) => {
                debug!("{} not ready, skipping cycle", self.detector.name());
                self.stats.lock().skipped_model += 1;
                return CycleOutcome::ModelNotReady;
            }
            Err(e) => {
                warn!("Detection on frame {} failed: {}", frame.sequence, e);
                let mut stats = self.stats.lock();
                stats.failed += 1;
                if matches!(e, ProctorError::Timeout(_)) {
                    stats.timeouts += 1;
                }
                return CycleOutcome::Failed(e);
            }
        };

        let ctx = FrameContext::from_frame(&frame, detections, self.min_confidence);
        let appended = {
            let mut rules = self.rules.lock();
            // stop() flips the flag under this lock, so nothing is logged after it returns
            if !self.is_active() {
                drop(rules);
                debug!("Session ended before rules ran, discarding frame {}", frame.sequence);
                self.stats.lock().discarded += 1;
                return CycleOutcome::Discarded;
            }
            let events = rules.evaluate(&ctx, Instant::now());
            let n = events.len();
            for event in events {
                self.log.append(event);
            }
            n
        };

        self.stats.lock().completed += 1;
        CycleOutcome::Completed(appended)
    }

    /// Stop scheduling. An outstanding cycle finishes and is discarded.
    pub fn stop(&self) {
        let _rules = self.rules.lock();
        if self.active.swap(false, Ordering::AcqRel) {
            info!("Sampler stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn face_detected(&self) -> bool {
        self.rules.lock().face_detected()
    }

    pub fn stats(&self) -> SamplerStats {
        self.stats.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Notify;

    use crate::capture::SimulatedCamera;
    use crate::core::EventKind;
    use crate::detection::{BoundingBox, Detection, ScriptedDetector, PERSON_LABEL};
    use crate::rules::RuleConfig;

    fn person() -> Detection {
        Detection::new(PERSON_LABEL, BoundingBox::new(270.0, 100.0, 100.0, 240.0))
    }

    async fn open_camera() -> Arc<SimulatedCamera> {
        let camera = Arc::new(SimulatedCamera::new("cam-test", 640, 480));
        camera.open().await.unwrap();
        camera
    }

    fn sampler(
        config: &SamplerConfig,
        camera: Arc<SimulatedCamera>,
        detector: Arc<ScriptedDetector>,
    ) -> Arc<Sampler> {
        Arc::new(Sampler::new(
            config,
            camera,
            detector,
            RuleEngine::new(&RuleConfig::default(), Instant::now()),
            Arc::new(SessionLog::default()),
        ))
    }

    #[tokio::test]
    async fn test_cycle_appends_events() {
        let detector = Arc::new(ScriptedDetector::new(vec![vec![person(), person()]]));
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector);

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        assert_eq!(handle.await.unwrap(), CycleOutcome::Completed(1));
        assert_eq!(s.log.count(EventKind::MultipleFacesDetected), 1);
        assert!(s.face_detected());
        assert!(!s.is_in_flight());
    }

    #[tokio::test]
    async fn test_log_stays_ordered_across_cycles() {
        let item = |label: &str| Detection::new(label, BoundingBox::new(20.0, 300.0, 60.0, 60.0));
        let off_center = Detection::new(PERSON_LABEL, BoundingBox::new(10.0, 100.0, 100.0, 240.0));
        let slumped = Detection::new(PERSON_LABEL, BoundingBox::new(270.0, 400.0, 100.0, 30.0));
        let script = vec![
            vec![person(), person()],
            vec![off_center, item("cell phone"), item("book")],
            vec![],
            vec![slumped],
            vec![person(), person()],
        ];
        let frames = script.len();
        let detector = Arc::new(ScriptedDetector::new(script));
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector);

        for _ in 0..frames {
            let TickOutcome::Dispatched(handle) = s.tick() else {
                panic!("expected dispatch");
            };
            handle.await.unwrap();
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let events = s.log.read_all();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::MultipleFacesDetected,
                EventKind::SuspiciousItemDetected,
                EventKind::SuspiciousItemDetected,
                EventKind::LookingAway,
                EventKind::EyesClosed,
            ]
        );
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[tokio::test]
    async fn test_at_most_one_cycle_in_flight() {
        let gate = Arc::new(Notify::new());
        let detector = Arc::new(ScriptedDetector::new(vec![vec![person()]]).with_gate(gate.clone()));
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector.clone());

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        assert!(s.is_in_flight());

        // Detection is parked on the gate; further ticks must not start another
        for _ in 0..3 {
            assert!(matches!(s.tick(), TickOutcome::SkippedBusy));
        }

        gate.notify_one();
        assert_eq!(handle.await.unwrap(), CycleOutcome::Completed(0));
        assert_eq!(detector.calls(), 1);
        assert!(!s.is_in_flight());

        let stats = s.stats();
        assert_eq!(stats.skipped_busy, 3);
        assert_eq!(stats.completed, 1);

        // Guard released, next tick dispatches again
        gate.notify_one();
        assert!(matches!(s.tick(), TickOutcome::Dispatched(_)));
    }

    #[tokio::test]
    async fn test_video_not_ready_skips() {
        let camera = Arc::new(SimulatedCamera::new("cam-test", 640, 480));
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let s = sampler(&SamplerConfig::default(), camera, detector.clone());

        assert!(matches!(s.tick(), TickOutcome::SkippedVideoNotReady));
        assert!(!s.is_in_flight());
        assert_eq!(detector.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_not_ready_skips_cycle() {
        let detector = Arc::new(ScriptedDetector::new(vec![]).unloaded());
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector.clone());

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        assert_eq!(handle.await.unwrap(), CycleOutcome::ModelNotReady);

        detector.load().await.unwrap();
        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        assert_eq!(handle.await.unwrap(), CycleOutcome::Completed(0));
        assert_eq!(s.stats().skipped_model, 1);
    }

    #[tokio::test]
    async fn test_stop_discards_in_flight_result() {
        let gate = Arc::new(Notify::new());
        let detector = Arc::new(
            ScriptedDetector::new(vec![vec![person(), person()]]).with_gate(gate.clone()),
        );
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector);

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        s.stop();
        assert!(matches!(s.tick(), TickOutcome::Stopped));

        gate.notify_one();
        assert_eq!(handle.await.unwrap(), CycleOutcome::Discarded);
        assert!(s.log.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_between_detection_and_rules_discards() {
        let gate = Arc::new(Notify::new());
        let detector = Arc::new(
            ScriptedDetector::new(vec![vec![person(), person()]]).with_gate(gate.clone()),
        );
        let s = sampler(&SamplerConfig::default(), open_camera().await, detector);

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };

        // Detection returns while the session is live, then the cycle waits on the rules
        let rules = s.rules.lock();
        gate.notify_one();
        tokio::time::sleep(Duration::from_millis(50)).await;
        s.active.store(false, Ordering::Release);
        drop(rules);

        assert_eq!(handle.await.unwrap(), CycleOutcome::Discarded);
        assert!(s.log.is_empty());
        assert_eq!(s.stats().discarded, 1);
    }

    #[tokio::test]
    async fn test_watchdog_releases_guard() {
        let gate = Arc::new(Notify::new());
        let detector = Arc::new(ScriptedDetector::new(vec![]).with_gate(gate));
        let config = SamplerConfig {
            detect_timeout_ms: Some(20),
            ..Default::default()
        };
        let s = sampler(&config, open_camera().await, detector);

        let TickOutcome::Dispatched(handle) = s.tick() else {
            panic!("expected dispatch");
        };
        assert_eq!(handle.await.unwrap(), CycleOutcome::Failed(ProctorError::Timeout(20)));
        assert!(!s.is_in_flight());
        assert_eq!(s.stats().timeouts, 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let detector = Arc::new(ScriptedDetector::new(vec![]));
        let config = SamplerConfig {
            interval_ms: 10,
            ..Default::default()
        };
        let s = sampler(&config, open_camera().await, detector);
        let (tx, rx) = broadcast::channel(1);

        let task = tokio::spawn(s.clone().run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(()).unwrap();
        task.await.unwrap();

        assert!(!s.is_active());
        assert!(s.stats().ticks >= 1);
    }
}
