//! Shared test utilities.

pub mod server;
pub mod store;

pub use server::TestServer;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use locker_core::grant::{Grant, Method};
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;

/// Multipart boundary used by the hand-built request bodies.
pub const BOUNDARY: &str = "locker-test-boundary";

/// Build a multipart body with the gateway's two fields.
/// `file` is `(filename, content_type, bytes)`.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub fn multipart_body(params: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(params) = params {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"r2_params\"\r\n\r\n{params}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Multipart body whose file part declares no content type at all.
#[allow(dead_code)]
pub fn multipart_body_untyped_file(params: Option<&str>, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(params) = params {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"r2_params\"\r\n\r\n{params}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Send a request and decode the JSON body (Null when empty).
#[allow(dead_code)]
pub async fn send(
    router: &axum::Router,
    method: &str,
    uri: &str,
    origin: Option<&str>,
    content_type: Option<&str>,
    body: Vec<u8>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header("Origin", origin);
    }
    if let Some(content_type) = content_type {
        builder = builder.header("Content-Type", content_type);
    }

    let request = builder.body(Body::from(body)).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
    };

    (status, headers, json)
}

/// POST a multipart body to the gateway.
#[allow(dead_code)]
pub async fn post_gateway(
    router: &axum::Router,
    origin: Option<&str>,
    body: Vec<u8>,
) -> (StatusCode, HeaderMap, Value) {
    send(
        router,
        "POST",
        "/v1/gateway",
        origin,
        Some(&format!("multipart/form-data; boundary={BOUNDARY}")),
        body,
    )
    .await
}

/// An avatar grant expiring an hour from now.
#[allow(dead_code)]
pub fn avatar_grant(key: &str) -> Grant {
    Grant {
        method: Method::Avatar,
        expires: OffsetDateTime::now_utc().unix_timestamp() + 3600,
        key: key.to_string(),
        max_size: Some(5 * 1024 * 1024),
        mime_type: Some("image/png".to_string()),
        previous_key: None,
        verbose_feedback: false,
    }
}
