// SPDX-License-Identifier: GPL-3.0-only

//! Detection result data model
//!
//! A detection result is produced fresh for every tick and discarded after
//! drawing. Landmark sequences are index-addressable; index meaning is
//! defined by the external model and is never reordered here.

/// A single tracked facial point, normalized to frame dimensions
///
/// `x` and `y` are in `[0, 1]` relative to the frame width and height.
/// `z` is carried through from the model but unused by rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// A named facial-expression intensity score in `[0, 1]`
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShape {
    /// Machine category name (e.g. "jawOpen")
    pub category_name: String,
    /// Optional human-readable name
    pub display_name: Option<String>,
    /// Intensity score, clamped to `[0, 1]` at the engine boundary
    pub score: f32,
}

impl BlendShape {
    /// Label to show for this category: the display name when present and
    /// non-empty, else the category name.
    pub fn label(&self) -> &str {
        match &self.display_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.category_name,
        }
    }
}

/// One detected face: an ordered landmark sequence plus optional blend shapes
///
/// `blend_shapes` is `None` both when the engine was configured without
/// blend-shape output and when the engine returned malformed category data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectedFace {
    pub landmarks: Vec<NormalizedLandmark>,
    pub blend_shapes: Option<Vec<BlendShape>>,
}

/// Result of one detect-for-frame call: zero or more faces, in engine order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub faces: Vec<DetectedFace>,
}

impl DetectionResult {
    /// Result with no detected faces
    pub fn empty() -> Self {
        Self::default()
    }

    /// Blend shapes of the first detected face, if any
    pub fn first_blend_shapes(&self) -> Option<&[BlendShape]> {
        self.faces.first()?.blend_shapes.as_deref()
    }
}
