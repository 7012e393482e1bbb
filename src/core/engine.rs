//! Monitor - owns the session and the sampler for one monitoring run

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{Event, MonitorState, Sampler, Session};
use crate::capture::VideoSource;
use crate::config::Config;
use crate::detection::Detector;
use crate::error::ProctorError;
use crate::report::{self, Report};
use crate::rules::RuleEngine;

/// Main proctoring monitor
pub struct Monitor {
    pub config: Arc<Config>,
    source: Arc<dyn VideoSource>,
    detector: Arc<dyn Detector>,
    candidate_name: String,
    session: Option<Arc<Session>>,
    sampler: Option<Arc<Sampler>>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    load_task: Option<JoinHandle<()>>,
    start_time: Option<Instant>,
}

impl Monitor {
    pub fn new(
        config: Config,
        source: Arc<dyn VideoSource>,
        detector: Arc<dyn Detector>,
    ) -> Self {
        let candidate_name = config.candidate_name.clone();
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config: Arc::new(config),
            source,
            detector,
            candidate_name,
            session: None,
            sampler: None,
            shutdown_tx,
            tasks: Vec::new(),
            load_task: None,
            start_time: None,
        }
    }

    /// Open the camera, kick off model loading and start sampling.
    ///
    /// `CaptureDenied` is returned to the caller as a notice; monitoring
    /// simply never starts.
    pub async fn start(&mut self) -> Result<(), ProctorError> {
        if self.is_running() {
            return Ok(());
        }
        info!("Starting proctoring monitor...");

        if let Err(e) = self.source.open().await {
            warn!("Monitoring not started: {}", e);
            return Err(e);
        }

        let detector = Arc::clone(&self.detector);
        self.load_task = Some(tokio::spawn(async move {
            if let Err(e) = detector.load().await {
                warn!("Failed to load {}: {}", detector.name(), e);
            }
        }));

        let session = Arc::new(Session::new(&self.candidate_name));
        let rules = RuleEngine::new(&self.config.rules, Instant::now());
        let sampler = Arc::new(Sampler::new(
            &self.config.sampler,
            Arc::clone(&self.source),
            Arc::clone(&self.detector),
            rules,
            Arc::clone(session.log()),
        ));

        let shutdown = self.shutdown_tx.subscribe();
        self.tasks.push(tokio::spawn(Arc::clone(&sampler).run(shutdown)));

        info!("Session {} started for '{}'", session.id(), session.candidate_name());
        self.session = Some(session);
        self.sampler = Some(sampler);
        self.start_time = Some(Instant::now());
        Ok(())
    }

    /// Stop sampling and release the camera. Any outstanding detection is
    /// left to finish and its result dropped.
    pub async fn stop(&mut self) {
        let Some(sampler) = self.sampler.take() else {
            return;
        };
        info!("Stopping proctoring monitor...");

        sampler.stop();
        // A model still loading must not hold up teardown
        if let Some(load) = self.load_task.take() {
            load.abort();
        }
        let _ = self.shutdown_tx.send(());
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("Monitor task ended abnormally: {}", e);
            }
        }
        self.source.close().await;

        // Keep the final counters visible after stop
        self.sampler = Some(sampler);
        info!("Proctoring monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.sampler.as_ref().map_or(false, |s| s.is_active())
    }

    pub fn set_candidate_name(&mut self, name: &str) {
        self.candidate_name = name.to_string();
        if let Some(session) = &self.session {
            session.set_candidate_name(name);
        }
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Events appended from now on, for a live log view
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Event>> {
        self.session.as_ref().map(|s| s.log().subscribe())
    }

    pub fn state(&self) -> MonitorState {
        let mut state = MonitorState {
            running: self.is_running(),
            model_ready: self.detector.is_ready(),
            video_ready: self.source.is_ready(),
            uptime_seconds: self.uptime(),
            ..Default::default()
        };

        if let Some(sampler) = &self.sampler {
            state.face_detected = sampler.face_detected();
            state.sampler = sampler.stats();
        }
        if let Some(session) = &self.session {
            let events = session.log().read_all();
            state.events_logged = events.len();
            state.score = report::compute_score_with(&events, &self.config.report.weights);
        }

        state
    }

    /// Report for the current session, `None` before `start`
    pub fn report(&self) -> Option<Report> {
        self.session
            .as_ref()
            .map(|s| report::build_report(s, &self.config.report.weights))
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }
}
