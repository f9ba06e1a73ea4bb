// SPDX-License-Identifier: GPL-3.0-only

//! Connector topology table
//!
//! The topology ships as a JSON companion file of the inference model: one
//! dense tessellation edge set plus eight named feature groups, all as
//! landmark index pairs. It is loaded once at startup and held immutable;
//! the renderer treats it as opaque constant data.

use crate::constants::{
    FEATURE_LINE_WIDTH, LEFT_ACCENT_COLOR, NEUTRAL_ACCENT_COLOR, RIGHT_ACCENT_COLOR,
};
use image::Rgba;
use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// A feature-accent connector group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureGroup {
    RightEye,
    RightEyebrow,
    LeftEye,
    LeftEyebrow,
    FaceOval,
    Lips,
    RightIris,
    LeftIris,
}

impl FeatureGroup {
    /// All feature groups, in draw order
    pub const ALL: [FeatureGroup; 8] = [
        FeatureGroup::RightEye,
        FeatureGroup::RightEyebrow,
        FeatureGroup::LeftEye,
        FeatureGroup::LeftEyebrow,
        FeatureGroup::FaceOval,
        FeatureGroup::Lips,
        FeatureGroup::RightIris,
        FeatureGroup::LeftIris,
    ];

    /// Display name for the group
    pub fn display_name(&self) -> &'static str {
        match self {
            FeatureGroup::RightEye => "right eye",
            FeatureGroup::RightEyebrow => "right eyebrow",
            FeatureGroup::LeftEye => "left eye",
            FeatureGroup::LeftEyebrow => "left eyebrow",
            FeatureGroup::FaceOval => "face oval",
            FeatureGroup::Lips => "lips",
            FeatureGroup::RightIris => "right iris",
            FeatureGroup::LeftIris => "left iris",
        }
    }

    /// Fixed stroke color for the group
    pub fn color(&self) -> Rgba<u8> {
        match self {
            FeatureGroup::RightEye | FeatureGroup::RightEyebrow | FeatureGroup::RightIris => {
                RIGHT_ACCENT_COLOR
            }
            FeatureGroup::LeftEye | FeatureGroup::LeftEyebrow | FeatureGroup::LeftIris => {
                LEFT_ACCENT_COLOR
            }
            FeatureGroup::FaceOval | FeatureGroup::Lips => NEUTRAL_ACCENT_COLOR,
        }
    }

    /// Fixed stroke width for the group
    pub fn line_width(&self) -> u32 {
        FEATURE_LINE_WIDTH
    }
}

/// A landmark index pair drawn as a line segment
pub type Connector = (u32, u32);

/// Errors loading or validating a topology file
#[derive(Debug, Clone)]
pub enum TopologyError {
    /// File could not be read
    Io(String),
    /// File is not valid topology JSON
    Parse(String),
    /// A connector references an index beyond the landmark count
    IndexOutOfRange {
        group: &'static str,
        index: u32,
        landmark_count: usize,
    },
    /// The tessellation set is empty
    EmptyTessellation,
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::Io(msg) => write!(f, "failed to read topology file: {}", msg),
            TopologyError::Parse(msg) => write!(f, "invalid topology data: {}", msg),
            TopologyError::IndexOutOfRange {
                group,
                index,
                landmark_count,
            } => write!(
                f,
                "{} connector references landmark {} but the model has {}",
                group, index, landmark_count
            ),
            TopologyError::EmptyTessellation => write!(f, "tessellation set is empty"),
        }
    }
}

impl std::error::Error for TopologyError {}

/// The full connector table for one model
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConnectorTopology {
    pub tessellation: Vec<Connector>,
    pub right_eye: Vec<Connector>,
    pub right_eyebrow: Vec<Connector>,
    pub left_eye: Vec<Connector>,
    pub left_eyebrow: Vec<Connector>,
    pub face_oval: Vec<Connector>,
    pub lips: Vec<Connector>,
    pub right_iris: Vec<Connector>,
    pub left_iris: Vec<Connector>,
}

impl ConnectorTopology {
    /// Load and validate a topology file against the given landmark count
    pub fn load(path: &Path, landmark_count: usize) -> Result<Self, TopologyError> {
        let data = std::fs::read_to_string(path).map_err(|e| TopologyError::Io(e.to_string()))?;
        Self::parse(&data, landmark_count)
    }

    /// Parse and validate topology JSON
    pub fn parse(data: &str, landmark_count: usize) -> Result<Self, TopologyError> {
        let topology: ConnectorTopology =
            serde_json::from_str(data).map_err(|e| TopologyError::Parse(e.to_string()))?;
        topology.validate(landmark_count)?;
        Ok(topology)
    }

    /// Connectors for a feature group
    pub fn feature(&self, group: FeatureGroup) -> &[Connector] {
        match group {
            FeatureGroup::RightEye => &self.right_eye,
            FeatureGroup::RightEyebrow => &self.right_eyebrow,
            FeatureGroup::LeftEye => &self.left_eye,
            FeatureGroup::LeftEyebrow => &self.left_eyebrow,
            FeatureGroup::FaceOval => &self.face_oval,
            FeatureGroup::Lips => &self.lips,
            FeatureGroup::RightIris => &self.right_iris,
            FeatureGroup::LeftIris => &self.left_iris,
        }
    }

    /// Check every connector index against the model's landmark count
    pub fn validate(&self, landmark_count: usize) -> Result<(), TopologyError> {
        if self.tessellation.is_empty() {
            return Err(TopologyError::EmptyTessellation);
        }

        check_indices("tessellation", &self.tessellation, landmark_count)?;
        for group in FeatureGroup::ALL {
            check_indices(group.display_name(), self.feature(group), landmark_count)?;
        }
        Ok(())
    }
}

fn check_indices(
    group: &'static str,
    connectors: &[Connector],
    landmark_count: usize,
) -> Result<(), TopologyError> {
    for &(start, end) in connectors {
        for index in [start, end] {
            if index as usize >= landmark_count {
                return Err(TopologyError::IndexOutOfRange {
                    group,
                    index,
                    landmark_count,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "tessellation": [[0, 1], [1, 2], [2, 0]],
        "rightEye": [[0, 1]],
        "rightEyebrow": [[1, 2]],
        "leftEye": [[2, 3]],
        "leftEyebrow": [[3, 0]],
        "faceOval": [[0, 2]],
        "lips": [[1, 3]],
        "rightIris": [[0, 3]],
        "leftIris": [[2, 1]]
    }"#;

    #[test]
    fn test_parse_sample() {
        let topology = ConnectorTopology::parse(SAMPLE, 4).unwrap();
        assert_eq!(topology.tessellation.len(), 3);
        assert_eq!(topology.feature(FeatureGroup::LeftEye), &[(2, 3)]);
    }

    #[test]
    fn test_index_out_of_range() {
        let err = ConnectorTopology::parse(SAMPLE, 3).unwrap_err();
        match err {
            TopologyError::IndexOutOfRange {
                index,
                landmark_count,
                ..
            } => {
                assert_eq!(index, 3);
                assert_eq!(landmark_count, 3);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_tessellation_rejected() {
        let data = SAMPLE.replace("[[0, 1], [1, 2], [2, 0]]", "[]");
        let err = ConnectorTopology::parse(&data, 4).unwrap_err();
        assert!(matches!(err, TopologyError::EmptyTessellation));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let data = SAMPLE.replace("\"tessellation\"", "\"mustache\": [], \"tessellation\"");
        let err = ConnectorTopology::parse(&data, 4).unwrap_err();
        assert!(matches!(err, TopologyError::Parse(_)));
    }

    #[test]
    fn test_group_colors() {
        use crate::constants::{LEFT_ACCENT_COLOR, NEUTRAL_ACCENT_COLOR, RIGHT_ACCENT_COLOR};

        assert_eq!(FeatureGroup::RightEye.color(), RIGHT_ACCENT_COLOR);
        assert_eq!(FeatureGroup::RightIris.color(), RIGHT_ACCENT_COLOR);
        assert_eq!(FeatureGroup::LeftEyebrow.color(), LEFT_ACCENT_COLOR);
        assert_eq!(FeatureGroup::FaceOval.color(), NEUTRAL_ACCENT_COLOR);
        assert_eq!(FeatureGroup::Lips.color(), NEUTRAL_ACCENT_COLOR);
    }
}
