// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 camera source
//!
//! Opens a V4L2 capture device, negotiates a supported pixel format, and
//! runs a capture thread that converts every frame to RGBA and publishes it
//! into a latest-frame slot. Consumers read through [`FrameView`].

use super::capture::CaptureLoop;
use super::convert::{self, SourceFormat};
use super::types::{CameraFrame, CameraInfo};
use super::FrameSource;
use crate::errors::CameraError;

use std::sync::atomic::Ordering;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

/// Number of mmap buffers queued with the driver
const BUFFER_COUNT: u32 = 4;

/// Enumerate V4L2 capture devices
pub fn enumerate_cameras() -> Vec<CameraInfo> {
    let mut cameras: Vec<CameraInfo> = v4l::context::enum_devices()
        .iter()
        .map(|node| CameraInfo {
            index: node.index(),
            name: node
                .name()
                .unwrap_or_else(|| format!("video{}", node.index())),
            path: node.path().display().to_string(),
        })
        .collect();
    cameras.sort_by_key(|c| c.index);
    cameras
}

/// Shared latest-frame slot written by the capture thread
#[derive(Debug, Default)]
struct FrameSlot {
    latest: RwLock<Option<CameraFrame>>,
}

impl FrameSlot {
    fn store(&self, frame: CameraFrame) {
        if let Ok(mut slot) = self.latest.write() {
            *slot = Some(frame);
        }
    }

    fn latest(&self) -> Option<CameraFrame> {
        self.latest.read().ok()?.clone()
    }
}

/// Read-only view of a camera's latest frame
///
/// Cheap to clone; the render loop holds one while the viewer holds the
/// owning [`V4l2Camera`].
#[derive(Clone)]
pub struct FrameView {
    slot: Arc<FrameSlot>,
}

impl FrameSource for FrameView {
    fn ready(&self) -> bool {
        self.slot
            .latest
            .read()
            .map(|slot| slot.as_ref().is_some_and(|f| f.is_decodable()))
            .unwrap_or(false)
    }

    fn current_frame(&self) -> Option<CameraFrame> {
        self.slot.latest()
    }
}

/// Negotiated capture format
#[derive(Debug, Clone, Copy)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub source: SourceFormat,
}

/// A running V4L2 camera
///
/// Owns the capture thread; dropping or stopping it releases the device.
pub struct V4l2Camera {
    slot: Arc<FrameSlot>,
    capture: CaptureLoop,
    format: CaptureFormat,
}

impl V4l2Camera {
    /// Open the camera at `index` and start capturing.
    ///
    /// Format negotiation happens synchronously so initialization failures
    /// (missing device, no supported format) surface to the caller; the
    /// capture thread then re-opens the device with the negotiated format.
    pub fn open(index: usize, width: u32, height: u32) -> Result<Self, CameraError> {
        let probe = Device::new(index)
            .map_err(|e| CameraError::InitializationFailed(format!("/dev/video{}: {}", index, e)))?;
        let format = negotiate(&probe, width, height)?;
        drop(probe);

        info!(
            index,
            width = format.width,
            height = format.height,
            format = ?format.source,
            "Opened camera"
        );

        let slot = Arc::new(FrameSlot::default());
        let slot_writer = Arc::clone(&slot);

        let capture = CaptureLoop::spawn("v4l2-capture", move |stop| {
            let dev = Device::new(index).map_err(|e| e.to_string())?;
            let format = negotiate(&dev, format.width, format.height).map_err(|e| e.to_string())?;
            let mut stream = MmapStream::with_buffers(&dev, Type::VideoCapture, BUFFER_COUNT)
                .map_err(|e| e.to_string())?;

            while !stop.load(Ordering::SeqCst) {
                let (buf, meta) = match stream.next() {
                    Ok(frame) => frame,
                    Err(e) => {
                        if stop.load(Ordering::SeqCst) {
                            break;
                        }
                        return Err(format!("capture failed: {}", e));
                    }
                };

                let used = meta.bytesused as usize;
                let data = if used > 0 && used <= buf.len() {
                    &buf[..used]
                } else {
                    buf
                };

                match convert::to_rgba(format.source, data, format.width, format.height, 0) {
                    Ok(rgba) => {
                        slot_writer.store(CameraFrame::from_rgba(format.width, format.height, rgba));
                    }
                    Err(e) => {
                        // Corrupt frames happen; skip and keep capturing
                        debug!(error = %e, "Dropped undecodable frame");
                    }
                }
            }
            Ok(())
        });

        Ok(Self {
            slot,
            capture,
            format,
        })
    }

    /// Negotiated capture format
    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    /// Latest captured frame, if any
    pub fn latest_frame(&self) -> Option<CameraFrame> {
        self.slot.latest()
    }

    /// Frame-source view for the render loop
    pub fn view(&self) -> FrameView {
        FrameView {
            slot: Arc::clone(&self.slot),
        }
    }

    /// Whether the capture thread is still running
    pub fn is_running(&self) -> bool {
        self.capture.is_running()
    }

    /// Stop capturing and release the device
    pub fn stop(&mut self) {
        self.capture.stop();
    }
}

fn negotiate(dev: &Device, width: u32, height: u32) -> Result<CaptureFormat, CameraError> {
    for fourcc in SourceFormat::PREFERRED {
        let mut fmt = dev
            .format()
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;
        fmt.width = width;
        fmt.height = height;
        fmt.fourcc = FourCC::new(fourcc);

        let actual = match dev.set_format(&fmt) {
            Ok(actual) => actual,
            Err(e) => {
                warn!(fourcc = %FourCC::new(fourcc), error = %e, "Format rejected");
                continue;
            }
        };

        if let Some(source) = SourceFormat::from_fourcc(&actual.fourcc.repr)
            && actual.fourcc.repr == *fourcc
        {
            if actual.width != width || actual.height != height {
                debug!(
                    requested = %format!("{}x{}", width, height),
                    actual = %format!("{}x{}", actual.width, actual.height),
                    "Driver adjusted capture resolution"
                );
            }
            return Ok(CaptureFormat {
                width: actual.width,
                height: actual.height,
                source,
            });
        }
    }

    Err(CameraError::UnsupportedFormat(
        "no supported pixel format (tried YUYV, MJPG, RGB3, GREY)".to_string(),
    ))
}
