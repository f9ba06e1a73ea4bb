// SPDX-License-Identifier: GPL-3.0-only

//! Shared display state read by the render loop and written by UI chrome
//!
//! Each field is an independent atomic value. The render loop reads the
//! current values once per tick; there is no cross-field transaction, so a
//! write landing mid-tick at worst takes effect one frame later.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

/// Overlay drawing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Dense tessellation plus feature-accent connectors
    #[default]
    Landmark,
    /// Feature-accent connectors only
    Contour,
    /// Tessellation only
    Mesh,
}

impl DisplayMode {
    /// All modes, in cycle order
    pub const ALL: [DisplayMode; 3] = [DisplayMode::Landmark, DisplayMode::Contour, DisplayMode::Mesh];

    /// Display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            DisplayMode::Landmark => "Landmark",
            DisplayMode::Contour => "Contour",
            DisplayMode::Mesh => "Mesh",
        }
    }

    /// Next mode in cycle order
    pub fn next(&self) -> DisplayMode {
        match self {
            DisplayMode::Landmark => DisplayMode::Contour,
            DisplayMode::Contour => DisplayMode::Mesh,
            DisplayMode::Mesh => DisplayMode::Landmark,
        }
    }

    fn to_u8(self) -> u8 {
        match self {
            DisplayMode::Landmark => 0,
            DisplayMode::Contour => 1,
            DisplayMode::Mesh => 2,
        }
    }

    fn from_u8(value: u8) -> DisplayMode {
        match value {
            1 => DisplayMode::Contour,
            2 => DisplayMode::Mesh,
            _ => DisplayMode::Landmark,
        }
    }
}

/// Externally-mutated state consumed by the render loop
///
/// The loop never mutates `mode`, `mirrored`, or the gate flags; it only
/// reads them. The viewer updates the viewport dimensions on every draw.
#[derive(Debug)]
pub struct DisplayState {
    mode: AtomicU8,
    mirrored: AtomicBool,
    model_loading: AtomicBool,
    camera_error: AtomicBool,
    viewport_width: AtomicU32,
    viewport_height: AtomicU32,
}

impl DisplayState {
    /// Create display state with the given initial mode and mirror flag.
    ///
    /// `model_loading` starts set; the owner clears it once the engine is
    /// constructed. Viewport dimensions start at zero until the viewer
    /// reports its size.
    pub fn new(mode: DisplayMode, mirrored: bool) -> Self {
        Self {
            mode: AtomicU8::new(mode.to_u8()),
            mirrored: AtomicBool::new(mirrored),
            model_loading: AtomicBool::new(true),
            camera_error: AtomicBool::new(false),
            viewport_width: AtomicU32::new(0),
            viewport_height: AtomicU32::new(0),
        }
    }

    pub fn mode(&self) -> DisplayMode {
        DisplayMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    pub fn set_mode(&self, mode: DisplayMode) {
        self.mode.store(mode.to_u8(), Ordering::SeqCst);
    }

    /// Cycle to the next mode and return it
    pub fn cycle_mode(&self) -> DisplayMode {
        let next = self.mode().next();
        self.set_mode(next);
        next
    }

    pub fn mirrored(&self) -> bool {
        self.mirrored.load(Ordering::SeqCst)
    }

    pub fn set_mirrored(&self, mirrored: bool) {
        self.mirrored.store(mirrored, Ordering::SeqCst);
    }

    /// Toggle the mirror flag and return the new value
    pub fn toggle_mirrored(&self) -> bool {
        !self.mirrored.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn model_loading(&self) -> bool {
        self.model_loading.load(Ordering::SeqCst)
    }

    pub fn set_model_loading(&self, loading: bool) {
        self.model_loading.store(loading, Ordering::SeqCst);
    }

    pub fn camera_error(&self) -> bool {
        self.camera_error.load(Ordering::SeqCst)
    }

    pub fn set_camera_error(&self, error: bool) {
        self.camera_error.store(error, Ordering::SeqCst);
    }

    pub fn viewport(&self) -> (u32, u32) {
        (
            self.viewport_width.load(Ordering::SeqCst),
            self.viewport_height.load(Ordering::SeqCst),
        )
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.viewport_width.store(width, Ordering::SeqCst);
        self.viewport_height.store(height, Ordering::SeqCst);
    }
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(DisplayMode::default(), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_landmark() {
        assert_eq!(DisplayMode::default(), DisplayMode::Landmark);
    }

    #[test]
    fn test_mode_cycle_covers_all_modes() {
        let mut mode = DisplayMode::Landmark;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(mode);
            mode = mode.next();
        }
        assert_eq!(mode, DisplayMode::Landmark, "cycle should wrap around");
        assert_eq!(seen.len(), DisplayMode::ALL.len());
        for m in DisplayMode::ALL {
            assert!(seen.contains(&m));
        }
    }

    #[test]
    fn test_state_defaults() {
        let state = DisplayState::default();
        assert_eq!(state.mode(), DisplayMode::Landmark);
        assert!(state.mirrored(), "selfie view is the default");
        assert!(state.model_loading());
        assert!(!state.camera_error());
        assert_eq!(state.viewport(), (0, 0));
    }

    #[test]
    fn test_toggle_mirrored_returns_new_value() {
        let state = DisplayState::new(DisplayMode::Landmark, true);
        assert!(!state.toggle_mirrored());
        assert!(!state.mirrored());
        assert!(state.toggle_mirrored());
        assert!(state.mirrored());
    }

    #[test]
    fn test_cycle_mode_updates_state() {
        let state = DisplayState::default();
        assert_eq!(state.cycle_mode(), DisplayMode::Contour);
        assert_eq!(state.mode(), DisplayMode::Contour);
    }
}
