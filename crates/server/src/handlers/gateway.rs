//! Gateway authorization pipeline.
//!
//! Order matters and is fixed: resolve CORS, gate the HTTP verb,
//! require the encrypted grant, open it, check expiry, then dispatch
//! on the operation the grant names. Each step's failure is terminal
//! and produces the uniform failure envelope with the CORS headers
//! already attached.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::Method as HttpMethod;
use axum::response::Response;
use bytes::Bytes;
use time::OffsetDateTime;

use locker_core::envelope;
use locker_core::grant::{Grant, Method};

use crate::cors::CorsHeaders;
use crate::handlers::avatar;
use crate::reply::{Denial, Reply};
use crate::state::AppState;

/// Multipart form field carrying the encrypted grant.
const PARAMS_FIELD: &str = "r2_params";
/// Multipart form field carrying the payload.
const FILE_FIELD: &str = "file";

/// A decoded file part.
pub struct Upload {
    pub bytes: Bytes,
    /// Content type declared by the client for the part.
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// The gateway's multipart form, with both fields optional so the
/// pipeline can distinguish which one is missing.
pub struct GatewayForm {
    pub params: Option<String>,
    pub file: Option<Upload>,
}

/// Entry point for `/v1/gateway`, all verbs.
pub async fn gateway_entry(State(state): State<AppState>, req: Request) -> Response {
    let cors = CorsHeaders::resolve(req.headers(), &state.config.cors);
    let reply = Reply::new(cors);

    match *req.method() {
        HttpMethod::OPTIONS => reply.preflight(),
        HttpMethod::POST => handle_post(&state, &reply, req).await,
        _ => reply.failure(&Denial::VerbNotAllowed, false),
    }
}

async fn handle_post(state: &AppState, reply: &Reply, req: Request) -> Response {
    let form = match read_form(state, req).await {
        Ok(form) => form,
        Err(denial) => return reply.failure(&denial, false),
    };

    let Some(sealed) = form.params.as_deref() else {
        return reply.failure(&Denial::MissingParams, false);
    };

    // Anything undecryptable is one uniform rejection; the caller
    // never learns which step of opening failed.
    let Ok(grant) = envelope::open_grant(&state.secret, sealed) else {
        return reply.failure(&Denial::InvalidParams { detail: None }, false);
    };

    // Verbosity is a property of the grant, so it only applies from
    // this point on.
    let verbose = grant.verbose_feedback;

    let now = OffsetDateTime::now_utc().unix_timestamp();
    if grant.is_expired(now) {
        return reply.failure(&Denial::ParamsExpired, verbose);
    }

    tracing::debug!(method = %grant.method, key = %grant.key, "dispatching grant");

    let result = match grant.method {
        Method::Avatar => avatar::replace(state, reply, &grant, form.file).await,
        Method::Head => head_object(&grant),
        Method::Get => get_object(&grant),
        Method::Put => put_object(&grant),
        Method::Delete => delete_object(&grant),
        Method::List => list_objects(&grant),
    };

    result.unwrap_or_else(|denial| reply.failure(&denial, verbose))
}

/// Parse the multipart body into the two fields the gateway knows.
/// Unknown fields are drained and ignored.
async fn read_form(state: &AppState, req: Request) -> Result<GatewayForm, Denial> {
    let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
        Denial::InvalidParams {
            detail: Some(format!("body is not a multipart form: {e}")),
        }
    })?;

    let mut form = GatewayForm {
        params: None,
        file: None,
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(Denial::InvalidParams {
                    detail: Some(format!("malformed multipart body: {e}")),
                });
            }
        };

        match field.name() {
            Some(PARAMS_FIELD) => {
                let text = field.text().await.map_err(|e| Denial::InvalidParams {
                    detail: Some(format!("unreadable {PARAMS_FIELD} field: {e}")),
                })?;
                form.params = Some(text);
            }
            Some(FILE_FIELD) => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| Denial::InvalidParams {
                    detail: Some(format!("unreadable {FILE_FIELD} field: {e}")),
                })?;
                form.file = Some(Upload {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            _ => {
                let _ = field.bytes().await;
            }
        }
    }

    Ok(form)
}

fn refuse(method: Method) -> Denial {
    Denial::MethodNotAllowed(method.to_string())
}

// The issuer's grant schema reserves these operations, but the gateway
// does not implement them. Each is refused explicitly, before any
// storage interaction, naming the method it refuses.

fn head_object(_grant: &Grant) -> Result<Response, Denial> {
    Err(refuse(Method::Head))
}

fn get_object(_grant: &Grant) -> Result<Response, Denial> {
    Err(refuse(Method::Get))
}

fn put_object(_grant: &Grant) -> Result<Response, Denial> {
    Err(refuse(Method::Put))
}

fn delete_object(_grant: &Grant) -> Result<Response, Denial> {
    Err(refuse(Method::Delete))
}

fn list_objects(_grant: &Grant) -> Result<Response, Denial> {
    Err(refuse(Method::List))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(method: Method) -> Grant {
        Grant {
            method,
            expires: i64::MAX,
            key: "k".to_string(),
            max_size: None,
            mime_type: None,
            previous_key: None,
            verbose_feedback: false,
        }
    }

    #[test]
    fn test_reserved_operations_name_their_method() {
        let cases: [(_, fn(&Grant) -> Result<Response, Denial>); 5] = [
            (Method::Head, head_object),
            (Method::Get, get_object),
            (Method::Put, put_object),
            (Method::Delete, delete_object),
            (Method::List, list_objects),
        ];
        for (method, handler) in cases {
            let denial = handler(&grant(method))
                .err()
                .unwrap_or_else(|| panic!("expected a denial for {method}"));
            match denial {
                Denial::MethodNotAllowed(name) => assert_eq!(name, method.as_str()),
                other => panic!("expected MethodNotAllowed for {method}, got {other:?}"),
            }
        }
    }
}
