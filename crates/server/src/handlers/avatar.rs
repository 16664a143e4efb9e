//! Avatar replacement transaction.
//!
//! Preconditions first (file present, declared content type matches
//! the grant, size within limit), then the storage sequence: confirm
//! the previous object, evict it, write the new one. Sequential, no
//! retries, no rollback; the first failure stops everything.

use axum::response::Response;
use serde_json::Value;

use locker_core::envelope;
use locker_core::grant::Grant;
use locker_storage::{PutOptions, StorageClass};

use crate::handlers::gateway::Upload;
use crate::reply::{Denial, Reply};
use crate::state::AppState;

/// Execute an `avatar` grant: replace the previous object (if any)
/// with the uploaded file under the grant's key.
pub async fn replace(
    state: &AppState,
    reply: &Reply,
    grant: &Grant,
    upload: Option<Upload>,
) -> Result<Response, Denial> {
    let upload = upload.ok_or(Denial::MissingParams)?;

    // Write grants without a content type or a size limit are
    // defective, not permissive.
    let Some(mime_type) = grant.mime_type.as_deref() else {
        return Err(Denial::InvalidParams {
            detail: Some("grant carries no content type".to_string()),
        });
    };

    // The uploaded part must declare exactly the granted type.
    if upload.content_type.as_deref() != Some(mime_type) {
        return Err(Denial::InvalidParams {
            detail: Some(format!(
                "file content type {:?} does not match the granted type {mime_type:?}",
                upload.content_type
            )),
        });
    }

    let Some(max_size) = grant.max_size else {
        return Err(Denial::InvalidParams {
            detail: Some("grant carries no size limit".to_string()),
        });
    };

    if upload.bytes.len() as u64 > max_size {
        return Err(Denial::FileOversize);
    }

    // Evict the previous object before writing the new one. The new
    // file is never uploaded when the previous one cannot be confirmed.
    if let Some(previous_key) = grant.previous_key.as_deref() {
        let meta = state
            .storage
            .head(previous_key)
            .await
            .map_err(|e| Denial::OperationFailed {
                detail: format!("Failed to fetch previous avatar metadata: {e}"),
            })?;

        if meta.is_none() {
            return Err(Denial::PreviousMissing);
        }

        state
            .storage
            .delete(previous_key)
            .await
            .map_err(|e| Denial::OperationFailed {
                detail: format!("Failed to delete previous avatar: {e}"),
            })?;

        tracing::debug!(key = %previous_key, "previous avatar evicted");
    }

    let options = PutOptions {
        content_type: mime_type.to_string(),
        storage_class: StorageClass::Standard,
    };

    let receipt = state
        .storage
        .put(&grant.key, upload.bytes, options)
        .await
        .map_err(|e| Denial::OperationFailed {
            detail: format!("Failed to upload avatar: {e}"),
        })?;

    tracing::info!(
        key = %receipt.key,
        size = receipt.size,
        backend = state.storage.backend_name(),
        "avatar replaced"
    );

    // The key travels back sealed, same as it arrived.
    let sealed_key =
        envelope::seal_str(&state.secret, &receipt.key).map_err(|e| Denial::Unknown(e.to_string()))?;

    let r2_object: Option<Value> = if grant.verbose_feedback {
        Some(serde_json::to_value(&receipt).map_err(|e| Denial::Unknown(e.to_string()))?)
    } else {
        None
    };

    Ok(reply.success(sealed_key, r2_object))
}
