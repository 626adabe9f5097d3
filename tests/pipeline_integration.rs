mod common;

use artifacts::format::{ClassifierFile, ModelSpec, ProjectorFile};
use common::*;
use digitrec::{ArtifactBundle, EncodeOptions, IngestConfig, PcaProjector, TrainedClassifier};
use serde_json::json;
use tempfile::TempDir;

fn fixture_bundle() -> (TempDir, ArtifactBundle) {
    let dir = TempDir::new().unwrap();
    let paths = write_artifacts(dir.path(), identity_classes());
    let bundle = digitrec::load(&paths).unwrap();
    (dir, bundle)
}

fn run(bundle: &ArtifactBundle, body: &[u8]) -> digitrec::PredictionBatch {
    digitrec::run_batch(
        bundle,
        body,
        &IngestConfig::default(),
        EncodeOptions::default(),
    )
    .expect("batch should succeed")
}

#[test]
fn labeled_record_echoes_actual() {
    // Single-feature bundle that maps a lit last pixel to class 3.
    let input_dim = 16;
    let mut component = vec![0.0; input_dim];
    component[input_dim - 1] = 1.0;
    let projector = PcaProjector::from_file(
        ProjectorFile::pca(vec![0.0; input_dim], vec![component]),
        std::path::Path::new("scenario.json"),
    )
    .unwrap();
    let classifier = TrainedClassifier::from_file(
        ClassifierFile::new(
            1,
            vec![3, 0],
            ModelSpec::NearestCentroid {
                centroids: vec![vec![1.0], vec![0.0]],
            },
        ),
        std::path::Path::new("scenario.json"),
    )
    .unwrap();
    let bundle = ArtifactBundle::new(Box::new(projector), Box::new(classifier)).unwrap();

    let mut pixels = vec![0.0; input_dim];
    pixels[input_dim - 1] = 1.0;
    let body = serde_json::to_vec(&json!([{"identifier": 7, "pixels": pixels, "label": "3"}]))
        .unwrap();

    let batch = run(&bundle, &body);
    let value = serde_json::to_value(&batch.predictions).unwrap();
    assert_eq!(value, json!([{"identifier": 7, "predicted": 3, "actual": 3}]));
}

#[test]
fn response_preserves_cardinality_and_order() {
    let (_dir, bundle) = fixture_bundle();
    let ids = [42u64, 3, 17, 8, 1000, 5];
    let records = ids
        .iter()
        .enumerate()
        .map(|(i, id)| record(*id, None, &digit_pixels((i % 10) as u8)))
        .collect();

    let batch = run(&bundle, &body(records));

    assert_eq!(batch.count, ids.len());
    let got: Vec<u64> = batch.predictions.iter().map(|p| p.identifier).collect();
    assert_eq!(got, ids);
}

#[test]
fn predicts_each_digit() {
    let (_dir, bundle) = fixture_bundle();
    let records = (0..10u8)
        .map(|d| record(u64::from(d) + 1, Some(d), &digit_pixels(d)))
        .collect();

    let batch = run(&bundle, &body(records));

    for p in &batch.predictions {
        assert_eq!(Some(p.predicted), p.actual, "record {}", p.identifier);
    }
}

#[test]
fn absent_label_differs_from_zero_label() {
    let (_dir, bundle) = fixture_bundle();
    let body = body(vec![
        record(1, Some(0), &digit_pixels(0)),
        record(2, None, &digit_pixels(0)),
    ]);

    let batch = run(&bundle, &body);
    let value = serde_json::to_value(&batch).unwrap();

    assert_eq!(value["predictions"][0]["actual"], json!(0));
    assert!(value["predictions"][1].get("actual").is_none());
}

#[test]
fn empty_batch_yields_empty_response() {
    let (_dir, bundle) = fixture_bundle();
    for body in [&b"[]"[..], &b"{}"[..], &br#"{"records": []}"#[..]] {
        let batch = run(&bundle, body);
        assert_eq!(batch.count, 0);
        assert!(batch.predictions.is_empty());
        assert_eq!(batch.model.projector_version.as_deref(), Some("pca-10"));
    }
}

#[test]
fn keyed_payload_matches_array_payload() {
    let (_dir, bundle) = fixture_bundle();
    let keyed = serde_json::to_vec(&json!({
        "12": {"pixels": digit_pixels(4), "label": 4},
        "3": {"pixels": digit_pixels(9)},
    }))
    .unwrap();
    let array = body(vec![
        record(12, Some(4), &digit_pixels(4)),
        record(3, None, &digit_pixels(9)),
    ]);

    let from_keyed = run(&bundle, &keyed);
    let from_array = run(&bundle, &array);

    assert_eq!(from_keyed.predictions, from_array.predictions);
    assert_eq!(from_keyed.predictions[0].identifier, 12);
}

#[test]
fn duplicate_identifiers_are_independent() {
    let (_dir, bundle) = fixture_bundle();
    let batch = run(
        &bundle,
        &body(vec![
            record(9, None, &digit_pixels(1)),
            record(9, None, &digit_pixels(6)),
        ]),
    );
    assert_eq!(batch.count, 2);
    assert_eq!(batch.predictions[0].predicted.value(), 1);
    assert_eq!(batch.predictions[1].predicted.value(), 6);
}

#[test]
fn scores_are_opt_in() {
    let (_dir, bundle) = fixture_bundle();
    let body = body(vec![record(1, None, &digit_pixels(5))]);

    let plain = run(&bundle, &body);
    assert!(plain.predictions[0].score.is_none());

    let scored = digitrec::run_batch(
        &bundle,
        &body,
        &IngestConfig::default(),
        EncodeOptions {
            include_scores: true,
        },
    )
    .unwrap();
    let score = scored.predictions[0].score.unwrap();
    assert!(score > 0.5 && score <= 1.0);
}

#[test]
fn model_stamp_carries_digest() {
    let (_dir, bundle) = fixture_bundle();
    let batch = run(&bundle, &body(vec![record(1, None, &digit_pixels(2))]));
    assert_eq!(batch.model.digest, bundle.info().digest);
    assert_eq!(batch.model.classifier_version.as_deref(), Some("voting-1"));
}
