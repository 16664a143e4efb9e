//! CAPTCHA verification proxy.
//!
//! Accepts a challenge token (JSON or form-encoded body), forwards it
//! to the configured verification service together with the shared
//! secret and the caller's IP, and returns the verifier's full payload
//! sealed in the gateway's envelope format. Rejections from the
//! verifier are collapsed into one uniform 400; only genuinely
//! unexpected failures surface as 500 with detail.

use axum::extract::{Request, State};
use axum::http::{Method as HttpMethod, StatusCode, header::CONTENT_TYPE};
use axum::response::Response;
use serde::Deserialize;
use serde_json::Value;

use locker_core::envelope;

use crate::cors::CorsHeaders;
use crate::reply::{Denial, Envelope, Reply};
use crate::state::AppState;

/// Header carrying the original client IP at the edge.
const CLIENT_IP_HEADER: &str = "cf-connecting-ip";

#[derive(Debug, Deserialize)]
struct TokenBody {
    token: Option<String>,
}

/// Entry point for `/v1/verify`, all verbs.
pub async fn verify_entry(State(state): State<AppState>, req: Request) -> Response {
    let cors = CorsHeaders::resolve(req.headers(), &state.config.cors);
    let reply = Reply::new(cors);

    match *req.method() {
        HttpMethod::OPTIONS => reply.preflight(),
        HttpMethod::POST => handle_post(&state, &reply, req).await,
        _ => reply.failure(&Denial::VerbNotAllowed, false),
    }
}

async fn handle_post(state: &AppState, reply: &Reply, req: Request) -> Response {
    let (parts, body) = req.into_parts();

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let client_ip = parts
        .headers
        .get(CLIENT_IP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let Some(content_type) = content_type else {
        return invalid_request(reply);
    };

    let bytes = match axum::body::to_bytes(body, state.config.server.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => return invalid_request(reply),
    };

    let Some(token) = extract_token(&content_type, &bytes) else {
        return invalid_request(reply);
    };

    let (Some(verify), Some(secret)) = (state.config.verify.as_ref(), state.verify_secret.as_deref())
    else {
        return reply.failure(
            &Denial::Unknown("verification is not configured".to_string()),
            false,
        );
    };

    let mut form: Vec<(&str, &str)> = vec![("secret", secret), ("response", token.as_str())];
    if let Some(ip) = client_ip.as_deref() {
        form.push(("remoteip", ip));
    }

    let response = match state.http.post(&verify.siteverify_url).form(&form).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "verification service unreachable");
            return verification_failed(reply);
        }
    };

    if !response.status().is_success() {
        tracing::warn!(status = %response.status(), "verification service rejected the request");
        return verification_failed(reply);
    }

    let payload: Value = match response.json().await {
        Ok(payload) => payload,
        Err(e) => {
            return reply.failure(
                &Denial::Unknown(format!("verifier returned an unparseable payload: {e}")),
                false,
            );
        }
    };

    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        tracing::debug!("challenge token rejected by verifier");
        return verification_failed(reply);
    }

    // The caller gets the verifier's payload, but sealed; only the
    // issuer can open it.
    match envelope::seal_json(&state.secret, &payload) {
        Ok(sealed) => reply.verified(sealed),
        Err(e) => reply.failure(&Denial::Unknown(e.to_string()), false),
    }
}

fn invalid_request(reply: &Reply) -> Response {
    reply.json(
        StatusCode::BAD_REQUEST,
        &Envelope::failure(StatusCode::BAD_REQUEST, "Invalid parameters"),
    )
}

fn verification_failed(reply: &Reply) -> Response {
    reply.json(
        StatusCode::BAD_REQUEST,
        &Envelope::failure(StatusCode::BAD_REQUEST, "Cloudflare verification failed"),
    )
}

/// Pull the challenge token out of a JSON or form-encoded body.
fn extract_token(content_type: &str, body: &[u8]) -> Option<String> {
    if content_type.starts_with("application/json") {
        serde_json::from_slice::<TokenBody>(body).ok()?.token
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        serde_urlencoded::from_bytes::<TokenBody>(body).ok()?.token
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_token_from_json() {
        let body = br#"{"token": "challenge-token"}"#;
        assert_eq!(
            extract_token("application/json", body).as_deref(),
            Some("challenge-token")
        );
        assert_eq!(
            extract_token("application/json; charset=utf-8", body).as_deref(),
            Some("challenge-token")
        );
    }

    #[test]
    fn test_extract_token_from_form() {
        let body = b"token=challenge-token&other=ignored";
        assert_eq!(
            extract_token("application/x-www-form-urlencoded", body).as_deref(),
            Some("challenge-token")
        );
    }

    #[test]
    fn test_extract_token_missing_or_unsupported() {
        assert_eq!(extract_token("application/json", br#"{}"#), None);
        assert_eq!(extract_token("application/json", b"not json"), None);
        assert_eq!(extract_token("text/plain", b"token=x"), None);
    }
}
