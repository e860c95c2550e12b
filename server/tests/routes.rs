use actix_web::{
    App,
    http::{StatusCode, header},
    test, web,
};
use machine_learning::{Classifier, MlErr, Result};
use ndarray::ArrayView1;
use serde_json::json;
use server::{
    AppState,
    routes::{self, DIFFERENT_DIGIT, GREETING, SAME_DIGIT},
};

/// Labels a sample 1 when its first pixel is positive, 0 otherwise.
struct FirstPixel;

impl Classifier for FirstPixel {
    fn n_features(&self) -> usize {
        4
    }

    fn predict(&self, sample: ArrayView1<f64>) -> Result<usize> {
        if sample.len() != self.n_features() {
            return Err(MlErr::SizeMismatch {
                a: "sample",
                b: "model features",
                got: sample.len(),
                expected: self.n_features(),
            });
        }
        Ok(usize::from(sample[0] > 0.0))
    }
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new(FirstPixel)))
                .configure(routes::configure),
        )
        .await
    };
}

#[actix_web::test]
async fn index_returns_the_greeting() {
    let app = app!();

    let req = test::TestRequest::get()
        .uri("/")
        .set_payload("ignored")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers().get(header::CONTENT_TYPE).unwrap();
    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    assert_eq!(test::read_body(resp).await, GREETING.as_bytes());
}

#[actix_web::test]
async fn sum_adds_integers() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/sum")
        .set_json(json!({"x": 2, "y": 3}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"sum": 5}));
}

#[actix_web::test]
async fn sum_adds_floats() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/sum")
        .set_json(json!({"x": 1.5, "y": -4}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body, json!({"sum": -2.5}));
}

#[actix_web::test]
async fn sum_overflow_becomes_a_float() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/sum")
        .set_json(json!({"x": i64::MAX, "y": 1}))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["sum"].as_f64(), Some(i64::MAX as f64 + 1.0));
    assert!(body["sum"].is_f64());
}

#[actix_web::test]
async fn sum_rejects_missing_operands() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/sum")
        .set_json(json!({"x": 2}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn predict_same_digit() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "image1": [3.0, 0.0, 0.0, 1.0],
            "image2": [9.0, 2.0, 2.0, 0.0],
        }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, SAME_DIGIT.as_bytes());
}

#[actix_web::test]
async fn predict_different_digits() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "image1": [3.0, 0.0, 0.0, 1.0],
            "image2": [0.0, 2.0, 2.0, 0.0],
        }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;

    assert_eq!(body, DIFFERENT_DIGIT.as_bytes());
}

#[actix_web::test]
async fn predict_rejects_wrong_sample_length() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({
            "image1": [3.0, 0.0, 0.0, 1.0],
            "image2": [1.0, 2.0],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&body).contains("expected 4"));
}

#[actix_web::test]
async fn predict_rejects_missing_images() {
    let app = app!();

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({"image1": [1.0, 2.0, 3.0, 4.0]}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
