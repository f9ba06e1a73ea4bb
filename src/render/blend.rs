// SPDX-License-Identifier: GPL-3.0-only

//! Blend-shape visualization rows
//!
//! Pure data computation for the blend-shape panel: one row per category
//! with a label, a fill fraction, and a four-decimal readout. Absent or
//! empty input yields the designated placeholder variant instead of rows.

use crate::landmark::BlendShape;

/// One rendered row of the blend-shape panel
#[derive(Debug, Clone, PartialEq)]
pub struct BlendShapeRow {
    /// Display name if present, else category name
    pub label: String,
    /// Fill fraction of the bar track, equal to the score
    pub score: f32,
    /// Score formatted to exactly four decimal places
    pub readout: String,
    /// Fill percentage rounded to two decimal places
    pub percent: f32,
}

/// Panel content: either rows for the first face or the placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum BlendShapeView {
    /// No face, no blend shapes, or malformed blend-shape data
    Placeholder,
    Rows(Vec<BlendShapeRow>),
}

impl BlendShapeView {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, BlendShapeView::Placeholder)
    }
}

/// Build the panel view from the first face's blend shapes
pub fn build_view(shapes: Option<&[BlendShape]>) -> BlendShapeView {
    match shapes {
        None => BlendShapeView::Placeholder,
        Some([]) => BlendShapeView::Placeholder,
        Some(shapes) => BlendShapeView::Rows(shapes.iter().map(build_row).collect()),
    }
}

fn build_row(shape: &BlendShape) -> BlendShapeRow {
    let score = shape.score.clamp(0.0, 1.0);
    BlendShapeRow {
        label: shape.label().to_string(),
        score,
        readout: format!("{:.4}", score),
        percent: (score * 10000.0).round() / 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(category: &str, display: Option<&str>, score: f32) -> BlendShape {
        BlendShape {
            category_name: category.to_string(),
            display_name: display.map(str::to_string),
            score,
        }
    }

    #[test]
    fn test_absent_input_yields_placeholder() {
        assert!(build_view(None).is_placeholder());
    }

    #[test]
    fn test_empty_input_yields_placeholder() {
        assert!(build_view(Some(&[])).is_placeholder());
    }

    #[test]
    fn test_readout_is_rounded_to_four_decimals() {
        let shapes = [shape("jawOpen", None, 0.123456)];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].readout, "0.1235");
        assert_eq!(rows[0].percent, 12.35);
    }

    #[test]
    fn test_rounding_not_truncation() {
        let shapes = [shape("x", None, 0.99999)];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].readout, "1.0000");
        assert_eq!(rows[0].percent, 100.0);
    }

    #[test]
    fn test_label_prefers_display_name() {
        let shapes = [
            shape("jawOpen", Some("Jaw Open"), 0.5),
            shape("browDownLeft", None, 0.25),
        ];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].label, "Jaw Open");
        assert_eq!(rows[1].label, "browDownLeft");
    }

    #[test]
    fn test_order_is_preserved() {
        let shapes = [
            shape("c", None, 0.3),
            shape("a", None, 0.1),
            shape("b", None, 0.2),
        ];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["c", "a", "b"]);
    }

    #[test]
    fn test_out_of_range_score_clamped() {
        let shapes = [shape("x", None, 1.5)];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].score, 1.0);
        assert_eq!(rows[0].readout, "1.0000");
    }

    #[test]
    fn test_zero_score_renders_empty_bar() {
        let shapes = [shape("x", None, 0.0)];
        let BlendShapeView::Rows(rows) = build_view(Some(&shapes)) else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].readout, "0.0000");
        assert_eq!(rows[0].percent, 0.0);
    }
}
