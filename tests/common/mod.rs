//! Shared fixtures: a tiny "digit" bundle where pixels `2d` and `2d + 1`
//! light up class `d`.
#![allow(dead_code)]

use std::fs;
use std::path::Path;

use artifacts::format::{ClassifierFile, ModelSpec, ProjectorFile, VotingKind};
use digitrec::ArtifactPaths;
use serde_json::{Value, json};

pub const INPUT_DIM: usize = 20;
pub const FEATURE_DIM: usize = 10;

pub fn projector_file() -> ProjectorFile {
    let components = (0..FEATURE_DIM)
        .map(|k| {
            let mut row = vec![0.0; INPUT_DIM];
            row[2 * k] = 1.0;
            row[2 * k + 1] = 1.0;
            row
        })
        .collect();
    let mut file = ProjectorFile::pca(vec![0.0; INPUT_DIM], components);
    file.model_version = Some("pca-10".into());
    file
}

fn one_hot_rows(scale: f32) -> Vec<Vec<f32>> {
    (0..FEATURE_DIM)
        .map(|k| {
            let mut row = vec![0.0; FEATURE_DIM];
            row[k] = scale;
            row
        })
        .collect()
}

/// Soft-voting ensemble of a nearest-centroid and a linear member.
/// `classes[k]` is the tag emitted for feature axis `k`.
pub fn classifier_file(classes: Vec<u8>) -> ClassifierFile {
    let model = ModelSpec::Voting {
        voting: VotingKind::Soft,
        weights: None,
        members: vec![
            ModelSpec::NearestCentroid {
                centroids: one_hot_rows(2.0),
            },
            ModelSpec::Linear {
                weights: one_hot_rows(1.0),
                bias: vec![0.0; FEATURE_DIM],
            },
        ],
    };
    let mut file = ClassifierFile::new(FEATURE_DIM, classes, model);
    file.model_version = Some("voting-1".into());
    file
}

pub fn identity_classes() -> Vec<u8> {
    (0..10).collect()
}

/// Tag `d` sits on axis `d - 1`, so every prediction shifts by one.
pub fn shifted_classes() -> Vec<u8> {
    (0..10).map(|k| (k + 1) % 10).collect()
}

/// Writes through a temporary file and a rename so readers never observe a
/// half-written artifact.
pub fn write_atomic<T: serde::Serialize>(path: &Path, value: &T) {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_vec(value).unwrap()).unwrap();
    fs::rename(&tmp, path).unwrap();
}

pub fn write_artifacts(dir: &Path, classes: Vec<u8>) -> ArtifactPaths {
    let paths = ArtifactPaths::new(dir.join("projector.json"), dir.join("classifier.json"));
    write_atomic(&paths.projector, &projector_file());
    write_atomic(&paths.classifier, &classifier_file(classes));
    paths
}

pub fn digit_pixels(digit: u8) -> Vec<f32> {
    let mut pixels = vec![0.0; INPUT_DIM];
    pixels[2 * digit as usize] = 1.0;
    pixels[2 * digit as usize + 1] = 0.8;
    pixels
}

pub fn record(identifier: u64, label: Option<u8>, pixels: &[f32]) -> Value {
    match label {
        Some(label) => json!({"identifier": identifier, "label": label, "pixels": pixels}),
        None => json!({"identifier": identifier, "pixels": pixels}),
    }
}

pub fn body(records: Vec<Value>) -> Vec<u8> {
    serde_json::to_vec(&Value::Array(records)).unwrap()
}
