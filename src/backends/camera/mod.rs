// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend: frame source contract plus the V4L2 implementation

pub mod capture;
pub mod convert;
pub mod types;
pub mod v4l2;

pub use types::{CameraFrame, CameraInfo};
pub use v4l2::{enumerate_cameras, FrameView, V4l2Camera};

/// Contract between a media-stream source and the render loop
///
/// Readiness means a decodable frame with non-zero native dimensions is
/// available right now. Native dimensions may change over the session; the
/// loop re-reads them from the frame every tick.
pub trait FrameSource: Send {
    /// Whether a decodable frame is currently available
    fn ready(&self) -> bool;

    /// The most recent frame, if any
    fn current_frame(&self) -> Option<CameraFrame>;
}
