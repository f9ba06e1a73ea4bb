// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for connector topology loading

use facemark::landmark::{ConnectorTopology, FeatureGroup, TopologyError};
use std::path::PathBuf;

const SAMPLE: &str = r#"{
    "tessellation": [[0, 1], [1, 2], [2, 3], [3, 0]],
    "rightEye": [[0, 1]],
    "rightEyebrow": [[1, 2]],
    "leftEye": [[2, 3]],
    "leftEyebrow": [[3, 0]],
    "faceOval": [[0, 2]],
    "lips": [[1, 3]],
    "rightIris": [[0, 3]],
    "leftIris": [[2, 1]]
}"#;

fn write_temp(name: &str, data: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("facemark-{}-{}", std::process::id(), name));
    std::fs::write(&path, data).unwrap();
    path
}

#[test]
fn test_load_from_file() {
    let path = write_temp("topology.json", SAMPLE);
    let topology = ConnectorTopology::load(&path, 4).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(topology.tessellation.len(), 4);
    for group in FeatureGroup::ALL {
        assert_eq!(topology.feature(group).len(), 1);
    }
}

#[test]
fn test_load_missing_file() {
    let path = std::env::temp_dir().join("facemark-does-not-exist.json");
    let err = ConnectorTopology::load(&path, 4).unwrap_err();
    assert!(matches!(err, TopologyError::Io(_)));
}

#[test]
fn test_load_rejects_undersized_model() {
    let path = write_temp("topology-small.json", SAMPLE);
    let err = ConnectorTopology::load(&path, 2).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, TopologyError::IndexOutOfRange { .. }));
}

#[test]
fn test_load_rejects_garbage() {
    let path = write_temp("topology-garbage.json", "not json at all");
    let err = ConnectorTopology::load(&path, 4).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, TopologyError::Parse(_)));
}
