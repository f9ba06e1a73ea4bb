// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot storage
//!
//! Composites the current camera frame with the overlay canvas and saves
//! the result as a timestamped JPEG under the pictures directory.

use crate::backends::camera::CameraFrame;
use crate::constants::APP_DIR_NAME;
use crate::errors::{AppError, AppResult};
use crate::render::OverlaySnapshot;
use std::path::PathBuf;
use tracing::info;

/// Directory snapshots are saved to
pub fn photo_directory() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Composite frame and overlay into packed RGB bytes.
///
/// The viewer mirrors the video at display time while the overlay already
/// carries the mirror transform, so only the base frame is flipped here.
/// An overlay whose dimensions do not match the frame is skipped.
fn compose_rgb(frame: &CameraFrame, overlay: &OverlaySnapshot, mirrored: bool) -> Vec<u8> {
    let width = frame.width;
    let height = frame.height;
    let overlay_matches = overlay.width == width && overlay.height == height;
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);

    for y in 0..height {
        for x in 0..width {
            let src_x = if mirrored { width - 1 - x } else { x };
            let (mut r, mut g, mut b) = frame.rgb_at(src_x, y);

            if overlay_matches {
                let idx = ((y * width + x) * 4) as usize;
                if idx + 3 < overlay.pixels.len() {
                    let a = overlay.pixels[idx + 3] as u32;
                    if a > 0 {
                        let blend = |base: u8, over: u8| -> u8 {
                            ((over as u32 * a + base as u32 * (255 - a)) / 255) as u8
                        };
                        r = blend(r, overlay.pixels[idx]);
                        g = blend(g, overlay.pixels[idx + 1]);
                        b = blend(b, overlay.pixels[idx + 2]);
                    }
                }
            }
            rgb.extend_from_slice(&[r, g, b]);
        }
    }
    rgb
}

/// Save the composited frame + overlay as a JPEG photo
pub fn save_snapshot(
    frame: &CameraFrame,
    overlay: &OverlaySnapshot,
    mirrored: bool,
) -> AppResult<PathBuf> {
    if frame.width == 0 || frame.height == 0 {
        return Err(AppError::Storage("no frame to save".to_string()));
    }

    let rgb = compose_rgb(frame, overlay, mirrored);
    let img: image::RgbImage = image::ImageBuffer::from_raw(frame.width, frame.height, rgb)
        .ok_or_else(|| AppError::Storage("failed to create image".to_string()))?;

    let photo_dir = photo_directory();
    std::fs::create_dir_all(&photo_dir)?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filepath = photo_dir.join(format!("IMG_{}.jpg", timestamp));

    img.save(&filepath)
        .map_err(|e| AppError::Storage(e.to_string()))?;
    info!(path = %filepath.display(), "Snapshot saved");

    Ok(filepath)
}
