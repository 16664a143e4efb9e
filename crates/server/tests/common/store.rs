//! Call-recording in-memory object store for ordering assertions.

use async_trait::async_trait;
use bytes::Bytes;
use locker_storage::{ObjectMeta, ObjectStore, PutOptions, PutReceipt, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use time::OffsetDateTime;

/// In-memory store that records every operation in call order.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    objects: Mutex<HashMap<String, Bytes>>,
    ops: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an object without recording an operation.
    pub fn seed(&self, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.into());
    }

    /// Every storage call made so far, as `op:key` strings in order.
    pub fn operations(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Make every subsequent call of `op` ("head", "put", "delete")
    /// fail with an I/O error. The failed call is still recorded.
    pub fn fail_on(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    fn record(&self, op: &str, key: &str) -> StorageResult<()> {
        self.ops.lock().unwrap().push(format!("{op}:{key}"));
        if self.failing.lock().unwrap().contains(op) {
            return Err(StorageError::Io(std::io::Error::other(
                "simulated backend failure",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn head(&self, key: &str) -> StorageResult<Option<ObjectMeta>> {
        self.record("head", key)?;
        Ok(self.objects.lock().unwrap().get(key).map(|data| ObjectMeta {
            size: data.len() as u64,
            last_modified: Some(OffsetDateTime::now_utc()),
            content_type: None,
            storage_class: None,
        }))
    }

    async fn put(&self, key: &str, data: Bytes, _options: PutOptions) -> StorageResult<PutReceipt> {
        self.record("put", key)?;
        let size = data.len() as u64;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(PutReceipt {
            key: key.to_string(),
            size,
            etag: None,
            uploaded: OffsetDateTime::now_utc(),
        })
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record("delete", key)?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}
