// SPDX-License-Identifier: GPL-3.0-only

//! Thread lifecycle management for the capture loop
//!
//! The capture body owns the device and its memory-mapped stream (the
//! stream borrows the device, so both must live on the capture thread);
//! this controller owns the stop signal and the join handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Controller for a capture loop running in a separate thread
pub struct CaptureLoop {
    thread_handle: Option<JoinHandle<()>>,
    stop_signal: Arc<AtomicBool>,
    name: String,
}

impl CaptureLoop {
    /// Spawn the capture thread.
    ///
    /// The body receives the stop signal and is expected to poll it between
    /// frames and return promptly once it is set. Returning `Err` logs the
    /// failure and ends the thread; the capture device is released either
    /// way when the body's locals drop.
    pub fn spawn<F>(name: &str, body: F) -> Self
    where
        F: FnOnce(&AtomicBool) -> Result<(), String> + Send + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop_signal_clone = Arc::clone(&stop_signal);
        let name_clone = name.to_string();

        info!(name = %name, "Starting capture loop");

        let thread_handle = thread::spawn(move || {
            debug!(name = %name_clone, "Capture loop thread started");

            match body(&stop_signal_clone) {
                Ok(()) => info!(name = %name_clone, "Capture loop thread exiting"),
                Err(e) => warn!(name = %name_clone, error = %e, "Capture loop failed"),
            }
        });

        Self {
            thread_handle: Some(thread_handle),
            stop_signal,
            name: name.to_string(),
        }
    }

    /// Check if the loop is still running
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Signal the loop to stop (non-blocking)
    pub fn request_stop(&self) {
        debug!(name = %self.name, "Requesting capture loop stop");
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and wait for the thread to finish
    pub fn stop(&mut self) {
        self.request_stop();
        self.join();
    }

    /// Wait for the thread to finish without sending the stop signal
    pub fn join(&mut self) {
        if let Some(handle) = self.thread_handle.take() {
            debug!(name = %self.name, "Waiting for capture loop thread to finish");
            if let Err(e) = handle.join() {
                warn!(name = %self.name, "Capture loop thread panicked: {:?}", e);
            } else {
                debug!(name = %self.name, "Capture loop thread finished");
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            debug!(name = %self.name, "CaptureLoop dropped, stopping loop");
            self.stop();
        }
    }
}
