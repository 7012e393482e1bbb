// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.

//! Simulated camera for demo/testing

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{CaptureStatus, Frame, VideoSource};
use crate::error::ProctorError;

/// Produces empty frames of a fixed size after a warm-up period
pub struct SimulatedCamera {
    id: String,
    width: u32,
    height: u32,
    warmup: Duration,
    deny_access: bool,
    status: Mutex<CaptureStatus>,
    opened_at: Mutex<Option<Instant>>,
    sequence: AtomicU64,
}

impl SimulatedCamera {
    pub fn new(id: &str, width: u32, height: u32) -> Self {
        Self {
            id: id.to_string(),
            width,
            height,
            warmup: Duration::ZERO,
            deny_access: false,
            status: Mutex::new(CaptureStatus::Closed),
            opened_at: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    /// Delay between `open` and the first decodable frame
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Simulate the user declining the permission prompt
    pub fn with_denied_access(mut self, denied: bool) -> Self {
        self.deny_access = denied;
        self
    }

    pub fn frames_captured(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VideoSource for SimulatedCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> CaptureStatus {
        *self.status.lock()
    }

    async fn open(&self) -> Result<(), ProctorError> {
        if self.deny_access {
            *self.status.lock() = CaptureStatus::Denied;
            warn!("Camera access denied for {}", self.id);
            return Err(ProctorError::CaptureDenied);
        }

        *self.status.lock() = CaptureStatus::Opening;
        *self.opened_at.lock() = Some(Instant::now());
        info!("Opened simulated camera {} ({}x{})", self.id, self.width, self.height);
        Ok(())
    }

    async fn close(&self) {
        *self.status.lock() = CaptureStatus::Closed;
        *self.opened_at.lock() = None;
        debug!("Closed simulated camera {}", self.id);
    }

    fn is_ready(&self) -> bool {
        let opened_at = *self.opened_at.lock();
        match opened_at {
            Some(t) if t.elapsed() >= self.warmup => {
                let mut status = self.status.lock();
                if *status == CaptureStatus::Opening {
                    *status = CaptureStatus::Streaming;
                }
                true
            }
            _ => false,
        }
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn capture(&self) -> Result<Frame, ProctorError> {
        if !self.is_ready() {
            return Err(ProctorError::VideoNotReady);
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        Ok(Frame::new(sequence, self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_ready_before_open() {
        let camera = SimulatedCamera::new("cam-0", 640, 480);
        assert!(!camera.is_ready());
        assert_eq!(camera.capture().unwrap_err(), ProctorError::VideoNotReady);
    }

    #[tokio::test]
    async fn test_capture_after_open() {
        let camera = SimulatedCamera::new("cam-0", 640, 480);
        camera.open().await.unwrap();
        assert!(camera.is_ready());
        assert_eq!(camera.status(), CaptureStatus::Streaming);

        let first = camera.capture().unwrap();
        let second = camera.capture().unwrap();
        assert_eq!(first.width, 640);
        assert_eq!(first.height, 480);
        assert_eq!(second.sequence, first.sequence + 1);
    }

    #[tokio::test]
    async fn test_warmup_delays_readiness() {
        let camera = SimulatedCamera::new("cam-0", 640, 480)
            .with_warmup(Duration::from_secs(3600));
        camera.open().await.unwrap();
        assert!(!camera.is_ready());
        assert_eq!(camera.status(), CaptureStatus::Opening);
    }

    #[tokio::test]
    async fn test_denied_access() {
        let camera = SimulatedCamera::new("cam-0", 640, 480).with_denied_access(true);
        assert_eq!(camera.open().await.unwrap_err(), ProctorError::CaptureDenied);
        assert_eq!(camera.status(), CaptureStatus::Denied);
        assert!(!camera.is_ready());
    }
}
