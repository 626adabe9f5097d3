mod common;

use std::fs;

use artifacts::format::{ClassifierFile, ModelSpec};
use common::*;
use digitrec::{
    ArtifactLoadError, ArtifactPaths, DecodeError, EncodeOptions, IngestConfig, PipelineError,
    RecordSchema, SchemaError, Stage,
};
use serde_json::json;
use tempfile::TempDir;

fn run(body: &[u8]) -> Result<digitrec::PredictionBatch, PipelineError> {
    let dir = TempDir::new().unwrap();
    let bundle = digitrec::load(&write_artifacts(dir.path(), identity_classes())).unwrap();
    digitrec::run_batch(&bundle, body, &IngestConfig::default(), EncodeOptions::default())
}

#[test]
fn short_pixel_vector_fails_whole_batch() {
    let body = body(vec![
        record(1, None, &digit_pixels(0)),
        record(2, None, &digit_pixels(1)[..INPUT_DIM - 1]),
    ]);

    match run(&body) {
        Err(PipelineError::Decode(DecodeError::InvalidRecord {
            index,
            identifier,
            source,
        })) => {
            assert_eq!(index, 1);
            assert_eq!(identifier, Some(2));
            assert_eq!(
                source,
                SchemaError::WrongLength {
                    expected: INPUT_DIM,
                    actual: INPUT_DIM - 1
                }
            );
        }
        other => panic!("expected wrong length, got {other:?}"),
    }
}

#[test]
fn truncated_json_is_malformed() {
    let err = run(br#"[{"identifier": 1, "pixels": [0.0"#).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::MalformedPayload(_))
    ));
    assert!(err.is_client_error());
}

#[test]
fn scalar_payload_is_malformed() {
    let err = run(b"42").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::MalformedPayload(_))
    ));
}

#[test]
fn missing_pixels_names_the_field() {
    let body = serde_json::to_vec(&json!([{"identifier": 4}])).unwrap();
    match run(&body) {
        Err(PipelineError::Decode(DecodeError::InvalidRecord { source, .. })) => {
            assert_eq!(source, SchemaError::MissingField("pixels".into()));
            assert_eq!(source.field(), Some("pixels"));
        }
        other => panic!("expected missing field, got {other:?}"),
    }
}

#[test]
fn out_of_range_label_is_rejected() {
    let body = body(vec![record(1, Some(0), &digit_pixels(0))]);
    let mut value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    value[0]["label"] = json!(11);

    let err = run(&serde_json::to_vec(&value).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Decode(DecodeError::InvalidRecord {
            source: SchemaError::UnrecognizedLabel(_),
            ..
        })
    ));
}

#[test]
fn oversized_batch_is_rejected_before_validation() {
    let dir = TempDir::new().unwrap();
    let bundle = digitrec::load(&write_artifacts(dir.path(), identity_classes())).unwrap();
    let cfg = IngestConfig::default().with_max_batch_records(Some(2));
    let body = body((1..=3).map(|id| record(id, None, &[0.0])).collect());

    let err = digitrec::run_batch(&bundle, &body, &cfg, EncodeOptions::default()).unwrap_err();
    assert_eq!(
        err,
        PipelineError::Decode(DecodeError::TooManyRecords {
            limit: 2,
            actual: 3
        })
    );
}

#[test]
fn missing_artifact_is_not_found() {
    let dir = TempDir::new().unwrap();
    let paths = write_artifacts(dir.path(), identity_classes());
    let paths = ArtifactPaths::new(&paths.projector, dir.path().join("absent.json"));

    match digitrec::load(&paths) {
        Err(ArtifactLoadError::NotFound { path }) => assert!(path.ends_with("absent.json")),
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn corrupt_artifact_is_format_error() {
    let dir = TempDir::new().unwrap();
    let paths = write_artifacts(dir.path(), identity_classes());
    fs::write(&paths.projector, b"{\"format\": \"digit-projector\"").unwrap();

    assert!(matches!(
        digitrec::load(&paths),
        Err(ArtifactLoadError::Format { .. })
    ));
}

#[test]
fn skewed_artifacts_refuse_to_load() {
    let dir = TempDir::new().unwrap();
    let paths = write_artifacts(dir.path(), identity_classes());
    let narrow = ClassifierFile::new(
        5,
        vec![0, 1],
        ModelSpec::NearestCentroid {
            centroids: vec![vec![0.0; 5], vec![1.0; 5]],
        },
    );
    write_atomic(&paths.classifier, &narrow);

    match digitrec::load(&paths) {
        Err(ArtifactLoadError::DimensionSkew {
            projector_output,
            classifier_input,
        }) => {
            assert_eq!(projector_output, FEATURE_DIM);
            assert_eq!(classifier_input, 5);
        }
        other => panic!("expected skew, got {other:?}"),
    }
}

#[test]
fn records_built_for_another_bundle_fail_projection() {
    let dir = TempDir::new().unwrap();
    let bundle = digitrec::load(&write_artifacts(dir.path(), identity_classes())).unwrap();

    let wide = vec![0.0; INPUT_DIM + 1];
    let records = digitrec::decode(
        &body(vec![record(2, None, &wide)]),
        &RecordSchema::new(INPUT_DIM + 1),
        &IngestConfig::default(),
    )
    .unwrap();

    let err = digitrec::predict_records(&bundle, &records, EncodeOptions::default()).unwrap_err();
    assert_eq!(
        err,
        PipelineError::DimensionMismatch {
            stage: Stage::Project,
            index: 0,
            expected: INPUT_DIM,
            actual: INPUT_DIM + 1,
        }
    );
    assert!(!err.is_client_error());
}
