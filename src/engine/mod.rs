// SPDX-License-Identifier: GPL-3.0-only

//! Inference engine contract
//!
//! The face-landmark engine is an external collaborator: the application
//! configures it once at startup and afterwards only calls detect-for-frame.
//! Construction failure is terminal for the session and is never retried.

pub mod remote;

pub use remote::RemoteEngine;

use crate::backends::camera::CameraFrame;
use crate::landmark::DetectionResult;
use std::fmt;

/// Engine configuration, applied once at construction
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Location of the model asset the engine should load
    pub model_asset_path: String,
    /// Maximum number of faces the engine returns per frame
    pub num_faces: usize,
    /// Whether the engine should compute blend-shape scores
    pub output_blend_shapes: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            model_asset_path: String::new(),
            num_faces: crate::constants::DEFAULT_NUM_FACES,
            output_blend_shapes: true,
        }
    }
}

/// Detect-for-frame contract
///
/// `detect` takes the current frame and a monotonic timestamp in
/// milliseconds and resolves to the detection result. The render loop
/// guarantees single-flight usage: it never issues a second call before the
/// previous one resolves, which is why `&mut self` suffices.
pub trait LandmarkEngine: Send {
    fn detect(
        &mut self,
        frame: &CameraFrame,
        timestamp_ms: u64,
    ) -> impl Future<Output = Result<DetectionResult, EngineError>> + Send;
}

/// Errors from engine construction or per-frame detection
#[derive(Debug, Clone)]
pub enum EngineError {
    /// Could not reach the inference service
    ConnectFailed(String),
    /// The service rejected the configuration (e.g. bad model path)
    ConfigureRejected(String),
    /// The service sent data that does not match the protocol
    Protocol(String),
    /// Frame encoding failed before the call
    Encode(String),
    /// I/O failure mid-session
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ConnectFailed(msg) => write!(f, "failed to connect: {}", msg),
            EngineError::ConfigureRejected(msg) => write!(f, "configuration rejected: {}", msg),
            EngineError::Protocol(msg) => write!(f, "protocol error: {}", msg),
            EngineError::Encode(msg) => write!(f, "frame encoding failed: {}", msg),
            EngineError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}
