// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Detection module - object-detection adapter and per-frame context

mod simulator;

pub use simulator::{Behavior, ScriptedDetector, SimulatedDetector, SimulationConfig};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capture::Frame;
use crate::error::ProctorError;

/// Label the detection model assigns to people
pub const PERSON_LABEL: &str = "person";

/// Axis-aligned box in pixel coordinates, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }
}

/// One labeled box returned by the model for a single frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: String,
    pub bounding_box: BoundingBox,
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(label: &str, bounding_box: BoundingBox) -> Self {
        Self {
            label: label.to_string(),
            bounding_box,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn is(&self, label: &str) -> bool {
        self.label == label
    }
}

/// Everything the rules see for one sampling tick
#[derive(Debug, Clone)]
pub struct FrameContext {
    detections: Vec<Detection>,
    frame_width: u32,
    frame_height: u32,
    captured_at: DateTime<Utc>,
}

impl FrameContext {
    pub fn new(
        detections: Vec<Detection>,
        frame_width: u32,
        frame_height: u32,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            detections,
            frame_width,
            frame_height,
            captured_at,
        }
    }

    /// Build from a captured frame, dropping detections below `min_confidence`.
    /// Detections without a confidence are always kept.
    pub fn from_frame(frame: &Frame, detections: Vec<Detection>, min_confidence: f32) -> Self {
        let detections = detections
            .into_iter()
            .filter(|d| d.confidence.map_or(true, |c| c >= min_confidence))
            .collect();
        Self::new(detections, frame.width, frame.height, frame.captured_at)
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Detection> + 'a {
        self.detections.iter().filter(move |d| d.is(label))
    }

    pub fn count_label(&self, label: &str) -> usize {
        self.with_label(label).count()
    }
}

/// Wraps an object-detection model
#[async_trait]
pub trait Detector: Send + Sync {
    /// Model name for logging
    fn name(&self) -> &str;

    /// One-time load step, must complete before the first `detect`
    async fn load(&self) -> Result<(), ProctorError>;

    /// True once `load` has completed
    fn is_ready(&self) -> bool;

    /// Run inference on one frame. Fails with `ModelNotReady` before `load`.
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, ProctorError>;
}
