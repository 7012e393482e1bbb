// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Video source traits and frame type

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProctorError;

/// Capture operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureStatus {
    Closed,
    Opening,
    Streaming,
    Denied,
}

/// A single decoded video frame
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,

    /// Raw pixel data, RGB24. Empty for synthetic sources.
    pub data: Arc<[u8]>,
}

impl Frame {
    pub fn new(sequence: u64, width: u32, height: u32) -> Self {
        Self {
            sequence,
            width,
            height,
            captured_at: Utc::now(),
            data: Arc::from(Vec::<u8>::new()),
        }
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = Arc::from(data);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Trait for live video sources
///
/// Methods take `&self` so a source can be shared between the sampler loop
/// and an outstanding detection cycle.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Source identifier
    fn id(&self) -> &str;

    /// Current status
    fn status(&self) -> CaptureStatus;

    /// Acquire the camera stream. Fails with `CaptureDenied` when the user
    /// declines access.
    async fn open(&self) -> Result<(), ProctorError>;

    /// Release the stream
    async fn close(&self);

    /// True once the source produces decodable frames
    fn is_ready(&self) -> bool;

    /// Frame width in pixels
    fn width(&self) -> u32;

    /// Frame height in pixels
    fn height(&self) -> u32;

    /// Grab the current frame
    fn capture(&self) -> Result<Frame, ProctorError>;
}
