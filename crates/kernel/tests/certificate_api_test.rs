#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Integration tests for the certificate API.

mod common;

use std::sync::atomic::Ordering;

use axum::http::{Method, StatusCode};
use common::{TestApp, json_body, message};
use electrolyte_test_utils::{MultipartBody, PDF_BYTES};
use serde_json::Value;

fn with_image(name: &str) -> MultipartBody {
    MultipartBody::new()
        .text("name", name)
        .png("image", &format!("{name}.png"))
}

fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_image_is_required() {
    let app = TestApp::new();

    let response = app
        .admin_multipart(
            Method::POST,
            "/api/certificates",
            MultipartBody::new().text("name", "ISO 9001"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message(response).await,
        "Certificate image required (multipart/form-data name=image)"
    );
}

#[tokio::test]
async fn test_create_defaults() {
    let app = TestApp::new();

    let cert = app.create_certificate(with_image("IPC-A-610")).await;
    assert_eq!(cert["order"], 0);
    assert_eq!(cert["active"], true);
    assert_eq!(cert["description"], "");
    assert!(
        cert["image"]["filename"]
            .as_str()
            .unwrap()
            .starts_with("electrolyte/certificates/")
    );
    assert_eq!(app.relay.uploads.lock()[0].0, "certificates");
}

#[tokio::test]
async fn test_pdf_certificates_are_accepted() {
    let app = TestApp::new();

    let cert = app
        .create_certificate(
            MultipartBody::new()
                .text("name", "Scan")
                .file("image", "scan.pdf", "application/pdf", PDF_BYTES),
        )
        .await;
    assert_eq!(cert["name"], "Scan");
}

#[tokio::test]
async fn test_active_and_order_parsing() {
    let app = TestApp::new();

    let cert = app
        .create_certificate(with_image("Inactive").text("active", "yes").text("order", "7"))
        .await;
    assert_eq!(cert["active"], false);
    assert_eq!(cert["order"], 7);

    let response = app
        .admin_multipart(
            Method::POST,
            "/api/certificates",
            with_image("Bad Order").text("order", "first"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_order_and_active_filter() {
    let app = TestApp::new();

    app.create_certificate(with_image("Third").text("order", "5")).await;
    app.create_certificate(with_image("Older").text("order", "1")).await;
    app.create_certificate(with_image("Newer").text("order", "1")).await;
    app.create_certificate(with_image("Hidden").text("order", "0").text("active", "false"))
        .await;

    let all = json_body(app.get("/api/certificates").await).await;
    assert_eq!(names(&all), ["Hidden", "Newer", "Older", "Third"]);

    let active = json_body(app.get("/api/certificates?active=true").await).await;
    assert_eq!(names(&active), ["Newer", "Older", "Third"]);

    let inactive = json_body(app.get("/api/certificates?active=false").await).await;
    assert_eq!(names(&inactive), ["Hidden"]);
}

#[tokio::test]
async fn test_get_by_id() {
    let app = TestApp::new();
    let cert = app.create_certificate(with_image("Lookup")).await;

    let response = app
        .get(&format!("/api/certificates/{}", cert["_id"].as_str().unwrap()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["name"], "Lookup");

    let response = app.get("/api/certificates/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(response).await, "Certificate not found");
}

#[tokio::test]
async fn test_update_replaces_and_purges_image() {
    let app = TestApp::new();
    let cert = app.create_certificate(with_image("Renew")).await;
    let uri = format!("/api/certificates/{}", cert["_id"].as_str().unwrap());

    let response = app
        .admin_multipart(
            Method::PUT,
            &uri,
            MultipartBody::new()
                .text("description", "Renewed 2026")
                .png("image", "renewed.png"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;

    assert_eq!(updated["name"], "Renew");
    assert_eq!(updated["description"], "Renewed 2026");
    assert_ne!(updated["image"], cert["image"]);
    assert_eq!(
        app.relay.destroyed.lock().clone(),
        [cert["image"]["filename"].as_str().unwrap().to_string()]
    );
}

#[tokio::test]
async fn test_update_without_image_keeps_it() {
    let app = TestApp::new();
    let cert = app.create_certificate(with_image("Steady")).await;
    let uri = format!("/api/certificates/{}", cert["_id"].as_str().unwrap());

    let updated = json_body(
        app.admin_multipart(Method::PUT, &uri, MultipartBody::new().text("active", "false"))
            .await,
    )
    .await;

    assert_eq!(updated["active"], false);
    assert_eq!(updated["image"], cert["image"]);
    assert!(app.relay.destroyed.lock().is_empty());
}

#[tokio::test]
async fn test_update_succeeds_when_purge_fails() {
    let app = TestApp::new();
    app.relay.fail_destroy.store(true, Ordering::SeqCst);
    let cert = app.create_certificate(with_image("Flaky")).await;
    let uri = format!("/api/certificates/{}", cert["_id"].as_str().unwrap());

    let response = app
        .admin_multipart(Method::PUT, &uri, MultipartBody::new().png("image", "new.png"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_unknown_certificate() {
    let app = TestApp::new();

    let response = app
        .admin_multipart(
            Method::PUT,
            &format!("/api/certificates/{}", uuid::Uuid::now_v7()),
            MultipartBody::new().text("name", "Ghost"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete() {
    let app = TestApp::new();
    let cert = app.create_certificate(with_image("Expired")).await;
    let uri = format!("/api/certificates/{}", cert["_id"].as_str().unwrap());

    let response = app.admin_delete(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(message(response).await, "Certificate deleted successfully");
    assert_eq!(app.relay.destroyed.lock().len(), 1);

    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.admin_delete(&uri).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_succeeds_when_purge_fails() {
    let app = TestApp::new();
    app.relay.fail_destroy.store(true, Ordering::SeqCst);
    let cert = app.create_certificate(with_image("Stuck")).await;
    let uri = format!("/api/certificates/{}", cert["_id"].as_str().unwrap());

    let response = app.admin_delete(&uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.get(&uri).await.status(), StatusCode::NOT_FOUND);
}
