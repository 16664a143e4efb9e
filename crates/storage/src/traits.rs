//! Object storage trait and supporting types.

use crate::error::StorageResult;
use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use time::OffsetDateTime;

/// Object metadata returned by head operations.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if known.
    pub last_modified: Option<OffsetDateTime>,
    /// Content type, if known.
    pub content_type: Option<String>,
    /// Storage class, if the backend reports one.
    pub storage_class: Option<String>,
}

/// Storage class for newly written objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageClass {
    #[default]
    Standard,
    InfrequentAccess,
}

impl StorageClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageClass::Standard => "Standard",
            StorageClass::InfrequentAccess => "InfrequentAccess",
        }
    }
}

/// Options applied to a put operation.
#[derive(Debug, Clone)]
pub struct PutOptions {
    /// Content type recorded with the object.
    pub content_type: String,
    /// Storage class for the new object.
    pub storage_class: StorageClass,
}

impl Default for PutOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            storage_class: StorageClass::Standard,
        }
    }
}

/// The storage layer's record of a completed put.
///
/// Serialized verbatim into verbose success responses, so field names
/// are part of the gateway's wire format.
#[derive(Debug, Clone, Serialize)]
pub struct PutReceipt {
    /// Key the object was written under.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Backend etag, when the backend provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Upload completion time.
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded: OffsetDateTime,
}

/// Abstract object store.
///
/// The gateway needs exactly three operations; anything richer than
/// head/put/delete stays out of the trait so mock stores in tests can
/// account for every storage touch.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch object metadata. `Ok(None)` means the object does not
    /// exist; transport and backend failures are errors.
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMeta>>;

    /// Write an object, replacing any existing object under the key.
    async fn put(&self, key: &str, data: Bytes, options: PutOptions) -> StorageResult<PutReceipt>;

    /// Delete an object. Deleting an absent object is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Backend name for logging and diagnostics.
    fn backend_name(&self) -> &'static str;

    /// Startup health check.
    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
