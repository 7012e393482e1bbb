// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated detection models for demo/testing

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info};

use super::{BoundingBox, Detection, Detector, PERSON_LABEL};
use crate::capture::Frame;
use crate::error::ProctorError;

/// What the simulated candidate is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    Attentive,
    Absent,
    Companion,
    PhoneOut,
    LookingAway,
    Drowsy,
}

impl Behavior {
    const ALL: [Behavior; 6] = [
        Behavior::Attentive,
        Behavior::Absent,
        Behavior::Companion,
        Behavior::PhoneOut,
        Behavior::LookingAway,
        Behavior::Drowsy,
    ];
}

/// Simulated model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// RNG seed, entropy when unset
    pub seed: Option<u64>,

    /// Time the model takes to load
    pub load_delay_ms: u64,

    /// Per-frame inference latency
    pub latency_ms: u64,

    /// Chance per frame of switching to a new behavior
    pub switch_probability: f64,

    /// Relative weights when picking the next behavior
    pub attentive_weight: f64,
    pub absent_weight: f64,
    pub companion_weight: f64,
    pub phone_weight: f64,
    pub looking_away_weight: f64,
    pub drowsy_weight: f64,

    /// Positional noise as a fraction of frame size
    pub jitter: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            load_delay_ms: 1500,
            latency_ms: 120,
            switch_probability: 0.15,
            attentive_weight: 6.0,
            absent_weight: 1.0,
            companion_weight: 0.5,
            phone_weight: 0.5,
            looking_away_weight: 1.0,
            drowsy_weight: 0.5,
            jitter: 0.02,
        }
    }
}

impl SimulationConfig {
    fn weights(&self) -> [f64; 6] {
        [
            self.attentive_weight,
            self.absent_weight,
            self.companion_weight,
            self.phone_weight,
            self.looking_away_weight,
            self.drowsy_weight,
        ]
    }
}

const DISTRACTORS: [&str; 3] = ["cell phone", "book", "laptop"];
const BENIGN: [&str; 3] = ["chair", "cup", "bottle"];

/// Generates plausible detections from a drifting behavior state
pub struct SimulatedDetector {
    config: SimulationConfig,
    rng: Mutex<StdRng>,
    behavior: Mutex<Behavior>,
    ready: AtomicBool,
    frames: AtomicU64,
}

impl SimulatedDetector {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            rng: Mutex::new(rng),
            behavior: Mutex::new(Behavior::Attentive),
            ready: AtomicBool::new(false),
            frames: AtomicU64::new(0),
        }
    }

    /// Start in a fixed behavior, mostly useful in tests
    pub fn with_behavior(self, behavior: Behavior) -> Self {
        *self.behavior.lock() = behavior;
        self
    }

    pub fn behavior(&self) -> Behavior {
        *self.behavior.lock()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn generate(&self, width: f32, height: f32) -> Vec<Detection> {
        let mut rng = self.rng.lock();
        let mut behavior = self.behavior.lock();

        if rng.gen::<f64>() < self.config.switch_probability {
            if let Ok(dist) = WeightedIndex::new(self.config.weights()) {
                let next = Behavior::ALL[dist.sample(&mut *rng)];
                if next != *behavior {
                    debug!("Simulated candidate: {:?} -> {:?}", *behavior, next);
                }
                *behavior = next;
            }
        }

        let noise = Normal::new(0.0, self.config.jitter.max(1e-6)).ok();
        let rng = &mut *rng;
        let jitter = |rng: &mut StdRng, scale: f32| -> f32 {
            noise.map_or(0.0, |n| n.sample(rng) as f32) * scale
        };

        let person = |cx: f32, h_ratio: f32, jx: f32, jy: f32| {
            let w = width * 0.3;
            let h = height * h_ratio;
            let x = (cx * width - w / 2.0 + jx).clamp(0.0, width - w);
            let y = (height * 0.2 + jy).clamp(0.0, height - h);
            Detection::new(PERSON_LABEL, BoundingBox::new(x, y, w, h))
        };

        let mut detections = Vec::new();
        match *behavior {
            Behavior::Attentive => {
                detections.push(person(0.5, 0.55, jitter(rng, width), jitter(rng, height)));
            }
            Behavior::Absent => {}
            Behavior::Companion => {
                detections.push(person(0.5, 0.55, jitter(rng, width), jitter(rng, height)));
                detections.push(person(0.82, 0.45, jitter(rng, width), jitter(rng, height)));
            }
            Behavior::PhoneOut => {
                detections.push(person(0.5, 0.55, jitter(rng, width), jitter(rng, height)));
                let label = DISTRACTORS[rng.gen_range(0..DISTRACTORS.len())];
                detections.push(Detection::new(
                    label,
                    BoundingBox::new(width * 0.6, height * 0.65, width * 0.08, height * 0.12),
                ));
            }
            Behavior::LookingAway => {
                let cx = if rng.gen_bool(0.5) { 0.2 } else { 0.8 };
                detections.push(person(cx, 0.55, jitter(rng, width), jitter(rng, height)));
            }
            Behavior::Drowsy => {
                detections.push(person(0.5, 0.08, jitter(rng, width), 0.0));
            }
        }

        if rng.gen::<f64>() < 0.1 {
            let label = BENIGN[rng.gen_range(0..BENIGN.len())];
            detections.push(Detection::new(
                label,
                BoundingBox::new(width * 0.05, height * 0.7, width * 0.1, height * 0.15),
            ));
        }

        for d in detections.iter_mut() {
            d.confidence = Some(rng.gen_range(0.55..0.99));
        }

        detections
    }
}

#[async_trait]
impl Detector for SimulatedDetector {
    fn name(&self) -> &str {
        "simulated-coco-ssd"
    }

    async fn load(&self) -> Result<(), ProctorError> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }
        info!("Loading {} ({} ms)...", self.name(), self.config.load_delay_ms);
        tokio::time::sleep(Duration::from_millis(self.config.load_delay_ms)).await;
        self.ready.store(true, Ordering::Release);
        info!("{} ready", self.name());
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, ProctorError> {
        if !self.is_ready() {
            return Err(ProctorError::ModelNotReady);
        }
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(self.generate(frame.width as f32, frame.height as f32))
    }
}

/// Replays a fixed list of per-frame results
///
/// Once the script runs out every further call yields no detections. An
/// optional gate holds each call until the test releases it.
pub struct ScriptedDetector {
    script: Mutex<VecDeque<Vec<Detection>>>,
    ready: AtomicBool,
    gate: Option<Arc<Notify>>,
    calls: AtomicU64,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            ready: AtomicBool::new(true),
            gate: None,
            calls: AtomicU64::new(0),
        }
    }

    /// Start unloaded so `detect` fails until `load` runs
    pub fn unloaded(self) -> Self {
        self.ready.store(false, Ordering::Release);
        self
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn load(&self) -> Result<(), ProctorError> {
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, ProctorError> {
        if !self.is_ready() {
            return Err(ProctorError::ModelNotReady);
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.script.lock().pop_front().unwrap_or_default())
    }
}
