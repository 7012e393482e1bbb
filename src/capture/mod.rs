//! Capture module - video source interface and simulated camera

mod traits;
mod simulator;

pub use traits::{CaptureStatus, Frame, VideoSource};
pub use simulator::SimulatedCamera;
