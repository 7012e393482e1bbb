// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Error taxonomy for the monitoring pipeline
//!
//! None of these are fatal. Every variant degrades to "skip this cycle" and
//! the sampling cadence itself acts as the retry loop.

use thiserror::Error;

/// Errors raised by the capture and detection collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProctorError {
    /// Detection model has not finished loading
    #[error("detection model is not ready")]
    ModelNotReady,

    /// Video source is not producing decodable frames yet
    #[error("video source is not ready")]
    VideoNotReady,

    /// User declined camera/microphone access
    #[error("camera access was denied")]
    CaptureDenied,

    /// Inference call failed
    #[error("detection failed: {0}")]
    Detection(String),

    /// Inference exceeded the watchdog deadline
    #[error("detection timed out after {0} ms")]
    Timeout(u64),
}

impl ProctorError {
    /// True when the condition is expected to clear on its own by a later tick
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProctorError::CaptureDenied)
    }
}
