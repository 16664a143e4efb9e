//! Uniform JSON response envelope and failure taxonomy.
//!
//! Every gateway response, success or failure, is a JSON body of the
//! shape `{success, code, ...}` with the request's CORS headers
//! attached. Failures are classified by [`Denial`]; the grant's
//! `verbose_feedback` flag selects between generic and diagnostic
//! message text but never changes a status code.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::cors::CorsHeaders;

/// Wire body shared by every response.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r2_object: Option<Value>,
    #[serde(rename = "cfResponse", skip_serializing_if = "Option::is_none")]
    pub cf_response: Option<String>,
}

impl Envelope {
    pub fn failure(code: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            code: code.as_u16(),
            msg: Some(msg.into()),
            key: None,
            r2_object: None,
            cf_response: None,
        }
    }
}

/// Classified request failure.
///
/// Every failure is terminal at the point of detection; nothing here
/// is retried.
#[derive(Debug, Error)]
pub enum Denial {
    /// HTTP verb other than POST or OPTIONS.
    #[error("method not allowed")]
    VerbNotAllowed,

    /// Required form field absent (encrypted grant or file part).
    #[error("missing params or file")]
    MissingParams,

    /// Grant undecryptable, unparseable, or precondition mismatch.
    #[error("invalid params or file")]
    InvalidParams { detail: Option<String> },

    /// Grant past its expiry instant.
    #[error("params expired")]
    ParamsExpired,

    /// Payload larger than the grant's size limit.
    #[error("file size exceeds limit")]
    FileOversize,

    /// Grant names an operation the gateway does not implement.
    #[error("grant method {0} not allowed")]
    MethodNotAllowed(String),

    /// The grant's previous object was not in the store.
    #[error("previous object not found")]
    PreviousMissing,

    /// A storage operation failed mid-transaction.
    #[error("storage operation failed")]
    OperationFailed { detail: String },

    /// Anything the pipeline did not anticipate. Detail is always
    /// reported, regardless of verbosity.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Denial {
    /// HTTP status (and wire `code`) for this denial.
    pub fn status(&self) -> StatusCode {
        match self {
            Denial::VerbNotAllowed | Denial::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Denial::MissingParams
            | Denial::InvalidParams { .. }
            | Denial::ParamsExpired
            | Denial::FileOversize => StatusCode::BAD_REQUEST,
            Denial::PreviousMissing => StatusCode::NOT_FOUND,
            Denial::OperationFailed { .. } | Denial::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// User-facing message. Verbosity adds detail but never changes
    /// which denial this is.
    pub fn message(&self, verbose: bool) -> String {
        match self {
            Denial::VerbNotAllowed => "Method Not Allowed".to_string(),
            Denial::MissingParams => "Missing r2 params or file".to_string(),
            Denial::InvalidParams { detail } => match detail {
                Some(detail) if verbose => format!("Invalid r2 params or file: {detail}"),
                _ => "Invalid r2 params or file".to_string(),
            },
            Denial::ParamsExpired => "R2 params expired".to_string(),
            Denial::FileOversize => "File size exceeds limit".to_string(),
            // Names the refused method in both modes
            Denial::MethodNotAllowed(method) => format!("Method {method} not allowed"),
            Denial::PreviousMissing => {
                if verbose {
                    "Previous avatar not found".to_string()
                } else {
                    "R2 operation failed".to_string()
                }
            }
            Denial::OperationFailed { detail } => {
                if verbose {
                    detail.clone()
                } else {
                    "R2 operation failed".to_string()
                }
            }
            Denial::Unknown(detail) => format!("Unknown error: {detail}"),
        }
    }
}

/// Response builder bound to the CORS decision for one request.
pub struct Reply {
    cors: CorsHeaders,
}

impl Reply {
    pub fn new(cors: CorsHeaders) -> Self {
        Self { cors }
    }

    /// CORS preflight: 204, no body.
    pub fn preflight(&self) -> Response {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.cors.apply(response.headers_mut());
        response
    }

    /// Failure response for a classified denial.
    pub fn failure(&self, denial: &Denial, verbose: bool) -> Response {
        let envelope = Envelope::failure(denial.status(), denial.message(verbose));
        self.json(denial.status(), &envelope)
    }

    /// Gateway success: the re-encrypted key, plus the raw storage
    /// receipt when verbose.
    pub fn success(&self, key: String, r2_object: Option<Value>) -> Response {
        let envelope = Envelope {
            success: true,
            code: StatusCode::OK.as_u16(),
            msg: None,
            key: Some(key),
            r2_object,
            cf_response: None,
        };
        self.json(StatusCode::OK, &envelope)
    }

    /// Verification success: the sealed verifier payload.
    pub fn verified(&self, cf_response: String) -> Response {
        let envelope = Envelope {
            success: true,
            code: StatusCode::OK.as_u16(),
            msg: None,
            key: None,
            r2_object: None,
            cf_response: Some(cf_response),
        };
        self.json(StatusCode::OK, &envelope)
    }

    /// Serialize an envelope with CORS and content-type headers.
    pub fn json(&self, status: StatusCode, envelope: &Envelope) -> Response {
        // Envelope is plain data; serialization cannot fail in practice,
        // but fall back to a bare 500 rather than panic.
        let body = serde_json::to_vec(envelope).unwrap_or_else(|_| {
            br#"{"success":false,"code":500,"msg":"Unknown error"}"#.to_vec()
        });

        let mut response = Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.cors.apply(response.headers_mut());
        response
    }
}
