//! Capture session ownership
//!
//! This module provides the `CaptureController` abstraction that manages:
//! - The session's single recorder (exclusive device ownership)
//! - The recorded-audio and uploaded-file trimmers
//! - The save-pipeline contract (blob + optional trim bounds)
//! - Session statistics for the host UI

mod controller;
mod payload;
mod stats;

pub use controller::{CaptureController, TrimmerKind};
pub use payload::{SavePayload, TrimBounds};
pub use stats::SessionStats;
