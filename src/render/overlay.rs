// SPDX-License-Identifier: GPL-3.0-only

//! Overlay renderer
//!
//! Draws connector geometry for every detected face onto the overlay
//! canvas. Which connector sets are drawn depends on the display mode:
//! Landmark draws tessellation plus feature accents, Contour draws accents
//! only, Mesh draws tessellation only.

use super::canvas::OverlayCanvas;
use crate::constants::{TESSELLATION_COLOR, TESSELLATION_LINE_WIDTH};
use crate::landmark::{Connector, ConnectorTopology, DetectionResult, FeatureGroup, NormalizedLandmark};
use crate::state::DisplayMode;
use image::Rgba;

/// Draw the detection result in the given mode.
///
/// The canvas is expected to be cleared and carry the current mirror
/// transform; this function only strokes geometry.
pub fn draw_detection(
    canvas: &mut OverlayCanvas,
    result: &DetectionResult,
    mode: DisplayMode,
    topology: &ConnectorTopology,
) {
    for face in &result.faces {
        draw_face(canvas, &face.landmarks, mode, topology);
    }
}

fn draw_face(
    canvas: &mut OverlayCanvas,
    landmarks: &[NormalizedLandmark],
    mode: DisplayMode,
    topology: &ConnectorTopology,
) {
    if matches!(mode, DisplayMode::Landmark | DisplayMode::Mesh) {
        draw_connectors(
            canvas,
            landmarks,
            &topology.tessellation,
            TESSELLATION_COLOR,
            TESSELLATION_LINE_WIDTH,
        );
    }

    if matches!(mode, DisplayMode::Landmark | DisplayMode::Contour) {
        for group in FeatureGroup::ALL {
            draw_connectors(
                canvas,
                landmarks,
                topology.feature(group),
                group.color(),
                group.line_width(),
            );
        }
    }
}

/// Stroke one connector set; pairs referencing indices beyond the landmark
/// sequence are skipped.
fn draw_connectors(
    canvas: &mut OverlayCanvas,
    landmarks: &[NormalizedLandmark],
    connectors: &[Connector],
    color: Rgba<u8>,
    line_width: u32,
) {
    for &(start, end) in connectors {
        let (Some(a), Some(b)) = (landmarks.get(start as usize), landmarks.get(end as usize))
        else {
            continue;
        };
        canvas.stroke(a, b, color, line_width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{NEUTRAL_ACCENT_COLOR, RIGHT_ACCENT_COLOR};
    use crate::landmark::DetectedFace;

    /// Four corner-ish landmarks and a topology using them
    fn test_topology() -> ConnectorTopology {
        ConnectorTopology::parse(
            r#"{
                "tessellation": [[0, 1]],
                "rightEye": [[2, 3]],
                "rightEyebrow": [],
                "leftEye": [],
                "leftEyebrow": [],
                "faceOval": [[0, 3]],
                "lips": [],
                "rightIris": [],
                "leftIris": []
            }"#,
            4,
        )
        .unwrap()
    }

    fn test_face() -> DetectedFace {
        DetectedFace {
            landmarks: vec![
                NormalizedLandmark::new(0.1, 0.1),
                NormalizedLandmark::new(0.9, 0.1),
                NormalizedLandmark::new(0.1, 0.9),
                NormalizedLandmark::new(0.9, 0.9),
            ],
            blend_shapes: None,
        }
    }

    fn colors_on_canvas(canvas: &OverlayCanvas) -> Vec<Rgba<u8>> {
        let mut colors = Vec::new();
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                let pixel = canvas.pixel(x, y);
                if pixel.0[3] != 0 && !colors.contains(&pixel) {
                    colors.push(pixel);
                }
            }
        }
        colors
    }

    fn has_rgb(colors: &[Rgba<u8>], color: Rgba<u8>) -> bool {
        colors.iter().any(|c| c.0[..3] == color.0[..3])
    }

    fn render(mode: DisplayMode) -> OverlayCanvas {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(100, 100);
        let result = DetectionResult {
            faces: vec![test_face()],
        };
        draw_detection(&mut canvas, &result, mode, &test_topology());
        canvas
    }

    #[test]
    fn test_mesh_mode_draws_only_tessellation() {
        let canvas = render(DisplayMode::Mesh);
        let colors = colors_on_canvas(&canvas);
        assert!(has_rgb(&colors, TESSELLATION_COLOR));
        assert!(!has_rgb(&colors, RIGHT_ACCENT_COLOR));
        assert!(!has_rgb(&colors, NEUTRAL_ACCENT_COLOR));
    }

    #[test]
    fn test_contour_mode_draws_only_accents() {
        let canvas = render(DisplayMode::Contour);
        let colors = colors_on_canvas(&canvas);
        assert!(!has_rgb(&colors, TESSELLATION_COLOR));
        assert!(has_rgb(&colors, RIGHT_ACCENT_COLOR));
        assert!(has_rgb(&colors, NEUTRAL_ACCENT_COLOR));
    }

    #[test]
    fn test_landmark_mode_draws_both() {
        let canvas = render(DisplayMode::Landmark);
        let colors = colors_on_canvas(&canvas);
        assert!(has_rgb(&colors, TESSELLATION_COLOR));
        assert!(has_rgb(&colors, RIGHT_ACCENT_COLOR));
        assert!(has_rgb(&colors, NEUTRAL_ACCENT_COLOR));
    }

    #[test]
    fn test_empty_result_draws_nothing() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(50, 50);
        draw_detection(
            &mut canvas,
            &DetectionResult::empty(),
            DisplayMode::Landmark,
            &test_topology(),
        );
        assert!(colors_on_canvas(&canvas).is_empty());
    }

    #[test]
    fn test_every_face_is_drawn() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(100, 100);

        let mut second = test_face();
        for p in &mut second.landmarks {
            p.x *= 0.5;
            p.y *= 0.5;
        }
        let result = DetectionResult {
            faces: vec![test_face(), second],
        };
        draw_detection(&mut canvas, &result, DisplayMode::Contour, &test_topology());

        // First face's eye connector spans row 90; the second, scaled face
        // puts its eye connector on row 45
        assert!(canvas.pixel(50, 90).0[3] != 0, "first face missing");
        assert!(canvas.pixel(10, 45).0[3] != 0, "second face missing");
    }

    #[test]
    fn test_out_of_range_connector_is_skipped() {
        let mut canvas = OverlayCanvas::new();
        canvas.resize(50, 50);

        let face = DetectedFace {
            landmarks: vec![NormalizedLandmark::new(0.5, 0.5)],
            blend_shapes: None,
        };
        let result = DetectionResult { faces: vec![face] };
        // Topology references indices 0..4; the face has a single landmark
        draw_detection(&mut canvas, &result, DisplayMode::Landmark, &test_topology());
        assert!(colors_on_canvas(&canvas).is_empty());
    }
}
