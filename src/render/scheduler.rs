// SPDX-License-Identifier: GPL-3.0-only

//! Render loop scheduler
//!
//! Drives the per-tick cycle at display-refresh cadence: precondition
//! check, canvas resync, single-flight detect call, overlay draw, snapshot
//! publish. The detect call is the only suspension point per tick and the
//! next tick is scheduled only after it resolves, so at most one inference
//! call is ever in flight and a slow engine degrades cadence instead of
//! queuing work.

use super::blend::{self, BlendShapeView};
use super::canvas::OverlayCanvas;
use super::overlay;
use crate::backends::camera::FrameSource;
use crate::constants::DISPLAY_REFRESH_INTERVAL;
use crate::engine::LandmarkEngine;
use crate::landmark::ConnectorTopology;
use crate::state::DisplayState;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Why a tick did not draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `model_loading` or `camera_error` is set
    Gated,
    /// No decodable frame with non-zero dimensions available
    SourceNotReady,
    /// The viewer has not reported a non-zero viewport
    EmptyViewport,
    /// The detect call failed; logged once, tick dropped
    DetectFailed,
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Geometry (possibly none, for zero faces) was drawn and published
    Drawn { faces: usize },
    /// Preconditions failed; canvas untouched, engine not invoked
    Skipped(SkipReason),
    /// The loop was cancelled; any in-flight result was discarded
    Cancelled,
}

/// Published result of a drawn tick
#[derive(Debug, Clone)]
pub struct OverlaySnapshot {
    pub width: u32,
    pub height: u32,
    /// RGBA overlay canvas bytes
    pub pixels: Arc<[u8]>,
    /// Number of faces in the detection result
    pub faces: usize,
    /// Blend-shape panel content for the first face
    pub blend: BlendShapeView,
    /// Monotonic draw counter
    pub sequence: u64,
}

impl Default for OverlaySnapshot {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Arc::from(Vec::new().into_boxed_slice()),
            faces: 0,
            blend: BlendShapeView::Placeholder,
            sequence: 0,
        }
    }
}

/// The render loop: owns the canvas and the engine, reads display state
/// fresh each tick, publishes snapshots through a latest-value channel.
pub struct RenderLoop<E, S> {
    engine: E,
    source: S,
    state: Arc<DisplayState>,
    topology: Arc<ConnectorTopology>,
    canvas: OverlayCanvas,
    cancel: Arc<AtomicBool>,
    snapshot_tx: watch::Sender<OverlaySnapshot>,
    started: Instant,
    sequence: u64,
    detect_error_logged: bool,
}

impl<E, S> RenderLoop<E, S>
where
    E: LandmarkEngine,
    S: FrameSource,
{
    pub fn new(
        engine: E,
        source: S,
        state: Arc<DisplayState>,
        topology: Arc<ConnectorTopology>,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(OverlaySnapshot::default());
        Self {
            engine,
            source,
            state,
            topology,
            canvas: OverlayCanvas::new(),
            cancel: Arc::new(AtomicBool::new(false)),
            snapshot_tx,
            started: Instant::now(),
            sequence: 0,
            detect_error_logged: false,
        }
    }

    /// Receiver for published overlay snapshots (latest value wins)
    pub fn subscribe(&self) -> watch::Receiver<OverlaySnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Shared cancel flag; setting it stops the loop before the next draw
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// The overlay canvas (primarily for tick-level tests)
    pub fn canvas(&self) -> &OverlayCanvas {
        &self.canvas
    }

    /// Run one tick of the render cycle
    pub async fn tick(&mut self) -> TickOutcome {
        if self.cancel.load(Ordering::SeqCst) {
            return TickOutcome::Cancelled;
        }

        if self.state.model_loading() || self.state.camera_error() {
            return TickOutcome::Skipped(SkipReason::Gated);
        }
        if !self.source.ready() {
            return TickOutcome::Skipped(SkipReason::SourceNotReady);
        }
        let Some(frame) = self.source.current_frame() else {
            return TickOutcome::Skipped(SkipReason::SourceNotReady);
        };
        if frame.width == 0 || frame.height == 0 {
            return TickOutcome::Skipped(SkipReason::SourceNotReady);
        }
        let (viewport_width, viewport_height) = self.state.viewport();
        if viewport_width == 0 || viewport_height == 0 {
            return TickOutcome::Skipped(SkipReason::EmptyViewport);
        }

        // Resync the pixel buffer to the frame's native dimensions; the
        // source may have been reconfigured between ticks.
        self.canvas.resize(frame.width, frame.height);

        let timestamp_ms = self.started.elapsed().as_millis() as u64;
        let result = match self.engine.detect(&frame, timestamp_ms).await {
            Ok(result) => result,
            Err(e) => {
                if !self.detect_error_logged {
                    warn!(error = %e, "Detection failed; dropping ticks until it recovers");
                    self.detect_error_logged = true;
                }
                return TickOutcome::Skipped(SkipReason::DetectFailed);
            }
        };
        self.detect_error_logged = false;

        // A result that resolves after cancellation must not be drawn
        if self.cancel.load(Ordering::SeqCst) {
            return TickOutcome::Cancelled;
        }

        self.canvas.clear();
        self.canvas.set_mirrored(self.state.mirrored());
        overlay::draw_detection(&mut self.canvas, &result, self.state.mode(), &self.topology);
        self.canvas.set_mirrored(false);

        let blend = blend::build_view(result.first_blend_shapes());

        self.sequence += 1;
        let snapshot = OverlaySnapshot {
            width: self.canvas.width(),
            height: self.canvas.height(),
            pixels: Arc::from(self.canvas.as_bytes().to_vec().into_boxed_slice()),
            faces: result.faces.len(),
            blend,
            sequence: self.sequence,
        };
        let _ = self.snapshot_tx.send(snapshot);

        TickOutcome::Drawn {
            faces: result.faces.len(),
        }
    }

    /// Run ticks at display-refresh cadence until cancelled
    pub async fn run(mut self) {
        info!("Render loop started");
        let mut interval = tokio::time::interval(DISPLAY_REFRESH_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if matches!(self.tick().await, TickOutcome::Cancelled) {
                break;
            }
        }
        debug!(draws = self.sequence, "Render loop exited");
    }

    /// Spawn the loop on the current runtime
    pub fn spawn(self) -> RenderLoopHandle
    where
        E: 'static,
        S: 'static,
    {
        let cancel = self.cancel_flag();
        let snapshots = self.subscribe();
        let task = tokio::spawn(self.run());
        RenderLoopHandle {
            cancel,
            task,
            snapshots,
        }
    }
}

/// Handle to a spawned render loop
pub struct RenderLoopHandle {
    cancel: Arc<AtomicBool>,
    task: JoinHandle<()>,
    snapshots: watch::Receiver<OverlaySnapshot>,
}

impl RenderLoopHandle {
    /// Receiver for published overlay snapshots
    pub fn snapshots(&self) -> watch::Receiver<OverlaySnapshot> {
        self.snapshots.clone()
    }

    /// Request cancellation without waiting
    pub fn request_stop(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Cancel the loop and wait for it to finish.
    ///
    /// An in-flight detect call is allowed to complete; its result is
    /// discarded without drawing.
    pub async fn stop(self) {
        self.request_stop();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Render loop task failed");
        }
    }
}
