#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use artifacts::format::{ClassifierFile, ModelSpec, ProjectorFile};
use artifacts::{ArtifactPaths, ArtifactStore};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

pub const INPUT_DIM: usize = 4;

/// Two features: `pixels[0] + pixels[1]` and `pixels[2] + pixels[3]`.
/// Class 3 sits on the first axis, class 8 on the second.
pub fn write_artifacts(dir: &Path, classes: [u8; 2]) -> ArtifactPaths {
    let projector = ProjectorFile::pca(
        vec![0.0; INPUT_DIM],
        vec![vec![1.0, 1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0, 1.0]],
    );
    let classifier = ClassifierFile::new(
        2,
        classes.to_vec(),
        ModelSpec::NearestCentroid {
            centroids: vec![vec![2.0, 0.0], vec![0.0, 2.0]],
        },
    );
    let paths = ArtifactPaths::new(dir.join("projector.json"), dir.join("classifier.json"));
    std::fs::write(&paths.projector, serde_json::to_vec(&projector).unwrap()).unwrap();
    std::fs::write(&paths.classifier, serde_json::to_vec(&classifier).unwrap()).unwrap();
    paths
}

pub fn app_with(dir: &Path, config: ServerConfig) -> (Router, Arc<ArtifactStore>) {
    let paths = write_artifacts(dir, [3, 8]);
    let config = ServerConfig {
        projector_path: paths.projector.clone(),
        classifier_path: paths.classifier.clone(),
        ..config
    };
    let store = Arc::new(ArtifactStore::open(paths).unwrap());
    let state = ServerState::with_store(config, Arc::clone(&store));
    (build_router(Arc::new(state)), store)
}

pub fn app(dir: &Path) -> Router {
    app_with(dir, ServerConfig::default()).0
}

pub fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
