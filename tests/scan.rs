//! Scan pipeline integration tests
//!
//! Exercises the orchestrator against mock collaborators; no network, no
//! camera hardware.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use nutriscan::persona::UNREADABLE_LABEL;
use nutriscan::scan::{DeviceCapture, ImageSource, LabelAnalyzer, NutrientScore, ProductVerifier};
use nutriscan::{AnalysisOrchestrator, Error};

mod common;

use common::{CatalogBehavior, MockCatalog, MockGeneration, StubCamera, PARLE_G_RESPONSE};

fn orchestrator(
    generation: MockGeneration,
    catalog: MockCatalog,
    capture: DeviceCapture,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(
        capture,
        LabelAnalyzer::new(Box::new(generation)),
        ProductVerifier::new(Arc::new(catalog)),
    )
}

fn temp_image() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("label.jpg");
    std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
    (dir, path)
}

#[tokio::test]
async fn successful_scan_yields_verified_result_with_score_counts() {
    let (_dir, image) = temp_image();
    let mut orchestrator = orchestrator(
        MockGeneration::ok(PARLE_G_RESPONSE),
        MockCatalog::new(CatalogBehavior::Match),
        DeviceCapture::file_only(),
    );

    let result = orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap();

    assert_eq!(result.product_name, "Parle-G Biscuit");
    assert!(result.verified);
    assert_eq!(result.nutrients.len(), 1);
    assert_eq!(result.nutrients[0].score, NutrientScore::High);
    assert_eq!(result.allergens, vec!["Gluten".to_string()]);

    let counts = result.score_counts();
    assert_eq!((counts.good, counts.moderate, counts.high), (0, 0, 1));

    assert!(orchestrator.result().is_some());
    assert!(orchestrator.error().is_none());
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn catalog_timeout_yields_unverified_result() {
    let (_dir, image) = temp_image();
    let mut orchestrator = orchestrator(
        MockGeneration::ok(PARLE_G_RESPONSE),
        MockCatalog::new(CatalogBehavior::Timeout),
        DeviceCapture::file_only(),
    );

    let result = orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap();

    assert!(!result.verified);
    assert_eq!(result.product_name, "Parle-G Biscuit");
    assert!(orchestrator.error().is_none());
}

#[tokio::test]
async fn missing_allergens_is_fixed_error_and_no_lookup() {
    let (_dir, image) = temp_image();
    let generation = MockGeneration::ok(
        r#"{"productName": "X", "nutrients": [], "summary": "ok"}"#,
    );
    let catalog = MockCatalog::new(CatalogBehavior::Match);
    let catalog_calls = Arc::clone(&catalog.calls);
    let mut orchestrator = orchestrator(generation, catalog, DeviceCapture::file_only());

    let err = orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Analysis(_)));
    assert_eq!(err.to_string(), UNREADABLE_LABEL);
    assert_eq!(catalog_calls.load(Ordering::SeqCst), 0);
    assert!(orchestrator.result().is_none());
    assert_eq!(orchestrator.error(), Some(UNREADABLE_LABEL));
}

#[tokio::test]
async fn nutrient_order_follows_response() {
    let (_dir, image) = temp_image();
    let response = r#"{
        "productName": "Trail Mix",
        "nutrients": [
            {"name": "Calories", "value": "150", "dv": "N/A", "score": "neutral"},
            {"name": "Fiber", "value": "4g", "dv": "14%", "score": "good"},
            {"name": "Sodium", "value": "300mg", "dv": "13%", "score": "moderate"}
        ],
        "allergens": ["Nuts"],
        "summary": "A balanced snack!"
    }"#;
    let mut orchestrator = orchestrator(
        MockGeneration::ok(response),
        MockCatalog::new(CatalogBehavior::Miss),
        DeviceCapture::file_only(),
    );

    let result = orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap();

    let names: Vec<&str> = result.nutrients.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Calories", "Fiber", "Sodium"]);
    assert!(!result.verified);
}

#[tokio::test]
async fn transport_failure_uses_same_message_as_parse_failure() {
    let (_dir, image) = temp_image();
    let catalog = MockCatalog::new(CatalogBehavior::Match);
    let catalog_calls = Arc::clone(&catalog.calls);
    let mut orchestrator = orchestrator(
        MockGeneration::failing("503 service unavailable"),
        catalog,
        DeviceCapture::file_only(),
    );

    let err = orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), UNREADABLE_LABEL);
    assert_eq!(catalog_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn capture_failure_never_reaches_analyzer() {
    let generation = MockGeneration::ok(PARLE_G_RESPONSE);
    let generation_calls = Arc::clone(&generation.calls);
    let mut orchestrator = orchestrator(
        generation,
        MockCatalog::new(CatalogBehavior::Match),
        DeviceCapture::file_only(),
    );

    let err = orchestrator
        .analyze(ImageSource::File("/nonexistent/label.jpg".into()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Capture(_)));
    assert_eq!(generation_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn camera_scan_releases_stream_exactly_once() {
    let camera = StubCamera::new(vec![0xFF, 0xD8, 0xFF]);
    let stops = Arc::clone(&camera.stops);
    let mut orchestrator = orchestrator(
        MockGeneration::ok(PARLE_G_RESPONSE),
        MockCatalog::new(CatalogBehavior::Match),
        DeviceCapture::with_camera(Box::new(camera)),
    );

    // Preview running, then a scan captures from it.
    orchestrator.capture_mut().start_camera().await.unwrap();
    assert!(orchestrator.capture_mut().camera_active());

    let result = orchestrator.analyze(ImageSource::Camera).await.unwrap();
    assert_eq!(result.product_name, "Parle-G Biscuit");

    assert!(!orchestrator.capture_mut().camera_active());
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    // Releasing again is a no-op, not a double stop.
    orchestrator.capture_mut().release();
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_file_scan_releases_active_camera_first() {
    let (_dir, image) = temp_image();
    let camera = StubCamera::new(vec![0xFF, 0xD8, 0xFF]);
    let stops = Arc::clone(&camera.stops);
    let mut orchestrator = orchestrator(
        MockGeneration::ok(PARLE_G_RESPONSE),
        MockCatalog::new(CatalogBehavior::Match),
        DeviceCapture::with_camera(Box::new(camera)),
    );

    orchestrator.capture_mut().start_camera().await.unwrap();
    orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap();

    assert!(!orchestrator.capture_mut().camera_active());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn new_attempt_clears_previous_result_and_error() {
    let (_dir, image) = temp_image();
    let mut orchestrator = orchestrator(
        MockGeneration::ok(PARLE_G_RESPONSE),
        MockCatalog::new(CatalogBehavior::Match),
        DeviceCapture::file_only(),
    );

    orchestrator
        .analyze(ImageSource::File(image))
        .await
        .unwrap();
    assert!(orchestrator.result().is_some());

    // A failing attempt supersedes the previous result wholesale.
    let err = orchestrator
        .analyze(ImageSource::File("/nonexistent/x.jpg".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Capture(_)));
    assert!(orchestrator.result().is_none());
    assert!(orchestrator.error().is_some());

    orchestrator.reset();
    assert!(orchestrator.error().is_none());
}
