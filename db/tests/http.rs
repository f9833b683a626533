//! End-to-end HTTP scenarios, run in-process against the axum router via
//! `tower::ServiceExt::oneshot` - no real socket needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use vector_db::engine::VectorStore;
use vector_db::http::router;

fn app(dimension: usize) -> axum::Router {
    router(Arc::new(VectorStore::new(dimension, 0)))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn crud_round_trip() {
    let app = app(3);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vector",
            json!({"uuid": "11111111-1111-1111-1111-111111111111", "vector": [1.0, 2.0, 3.0]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["index"], 0);

    let response = app.clone().oneshot(get("/vector?index=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["vector"], json!([1.0, 2.0, 3.0]));
    assert_eq!(body["uuid"], "11111111-1111-1111-1111-111111111111");

    let response = app
        .clone()
        .oneshot(json_request("PUT", "/vector?index=0", json!([4.0, 5.0, 6.0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/vector?index=0")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["vector"], json!([4.0, 5.0, 6.0]));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/vector?index=0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/vector?index=0")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uuid_lookup() {
    let app = app(3);
    for (uuid, vector) in [
        ("11111111-1111-1111-1111-111111111111", [1.0, 0.0, 0.0]),
        ("22222222-2222-2222-2222-222222222222", [0.0, 1.0, 0.0]),
        ("33333333-3333-3333-3333-333333333333", [0.0, 0.0, 1.0]),
    ] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/vector",
                json!({"uuid": uuid, "vector": vector}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(get(
            "/vector?uuid=22222222-2222-2222-2222-222222222222",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["vector"], json!([0.0, 1.0, 0.0]));
    assert_eq!(body["index"], 1);
}

#[tokio::test]
async fn similarity_endpoints() {
    let app = app(3);
    for uuid in [
        "11111111-1111-1111-1111-111111111111",
        "22222222-2222-2222-2222-222222222222",
    ] {
        app.clone()
            .oneshot(json_request(
                "POST",
                "/vector",
                json!({"uuid": uuid, "vector": [1.0, 0.0, 0.0]}),
            ))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(get("/compare/cosine_similarity?index1=0&index2=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!((body["result"].as_f64().unwrap() - 1.0).abs() < 1e-5);

    let response = app
        .clone()
        .oneshot(get("/compare/euclidean_distance?index1=0&index2=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"], 0.0);

    let response = app
        .clone()
        .oneshot(get("/compare/dot_product?index1=0&index2=1"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["result"], 1.0);
}

#[tokio::test]
async fn dimension_mismatch_is_bad_request() {
    let app = app(3);
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/vector",
            json!({"vector": [1.0, 2.0]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("dimension"));
}

#[tokio::test]
async fn nearest_neighbor() {
    let app = app(2);
    for vector in [[0.0, 0.0], [10.0, 10.0], [3.0, 4.0]] {
        app.clone()
            .oneshot(json_request("POST", "/vector", json!({"vector": vector})))
            .await
            .unwrap();
    }

    let response = app
        .clone()
        .oneshot(json_request("POST", "/nearest", json!([2.0, 3.0])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["index"], 2);
}

#[tokio::test]
async fn health_check() {
    let app = app(3);
    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
