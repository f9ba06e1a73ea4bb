// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use image::Rgba;
use std::time::Duration;

/// Number of landmarks produced per face by the face landmark model
/// (468 mesh points plus 10 iris points)
pub const LANDMARKS_PER_FACE: usize = 478;

/// Target cadence of the render loop (~60 Hz)
pub const DISPLAY_REFRESH_INTERVAL: Duration = Duration::from_millis(16);

/// Dense tessellation stroke: translucent neutral gray
pub const TESSELLATION_COLOR: Rgba<u8> = Rgba([192, 192, 192, 112]);

/// Accent stroke for right-side features (eye, eyebrow, iris)
pub const RIGHT_ACCENT_COLOR: Rgba<u8> = Rgba([255, 48, 48, 255]);

/// Accent stroke for left-side features (eye, eyebrow, iris)
pub const LEFT_ACCENT_COLOR: Rgba<u8> = Rgba([48, 48, 255, 255]);

/// Neutral accent stroke for face oval and lips
pub const NEUTRAL_ACCENT_COLOR: Rgba<u8> = Rgba([224, 224, 224, 255]);

/// Line width for tessellation edges (pixels)
pub const TESSELLATION_LINE_WIDTH: u32 = 1;

/// Line width for feature-accent connector groups (pixels)
pub const FEATURE_LINE_WIDTH: u32 = 2;

/// Label shown by the blend-shape panel when no face is detected
pub const NO_FACE_PLACEHOLDER: &str = "no face detected";

/// Width of the blend-shape side panel in terminal cells
pub const BLEND_PANEL_WIDTH: u16 = 32;

/// Default inference service endpoint
pub const DEFAULT_ENGINE_ENDPOINT: &str = "127.0.0.1:9944";

/// Default maximum number of faces the engine is asked to return
pub const DEFAULT_NUM_FACES: usize = 1;

/// Default capture resolution requested from the camera
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

/// JPEG quality used when shipping frames to the inference service
pub const FRAME_JPEG_QUALITY: u8 = 80;

/// Directory name used under the config and pictures directories
pub const APP_DIR_NAME: &str = "facemark";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tessellation_color_is_translucent() {
        assert!(TESSELLATION_COLOR.0[3] < 255);
    }

    #[test]
    fn test_accent_colors_are_opaque() {
        for color in [RIGHT_ACCENT_COLOR, LEFT_ACCENT_COLOR, NEUTRAL_ACCENT_COLOR] {
            assert_eq!(color.0[3], 255);
        }
    }

    #[test]
    fn test_refresh_interval_is_display_rate() {
        let hz = 1000 / DISPLAY_REFRESH_INTERVAL.as_millis();
        assert!((30..=120).contains(&hz), "cadence should be a plausible display rate");
    }
}
