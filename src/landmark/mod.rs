// SPDX-License-Identifier: GPL-3.0-only

//! Landmark data model and connector topology

pub mod topology;
pub mod types;

pub use topology::{Connector, ConnectorTopology, FeatureGroup, TopologyError};
pub use types::{BlendShape, DetectedFace, DetectionResult, NormalizedLandmark};
