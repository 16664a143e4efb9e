//! Capability grants.
//!
//! A grant is the unit of authorization for the whole gateway: a
//! short-lived, issuer-sealed description of exactly one storage
//! operation. It names no subject. Whoever presents a decryptable,
//! unexpired grant may perform the operation it describes, once or
//! many times until it expires.

use serde::{Deserialize, Serialize};

/// The closed set of operations a grant can name.
///
/// Only `Avatar` is implemented today; the remaining variants are part
/// of the issuer's schema and are refused explicitly rather than
/// falling through as unknown methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Avatar,
    Head,
    Get,
    Put,
    Delete,
    List,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Avatar => "avatar",
            Method::Head => "head",
            Method::Get => "get",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::List => "list",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decrypted capability grant.
///
/// The wire format is JSON, field names fixed by the issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// Operation this grant authorizes.
    pub method: Method,

    /// Expiry as Unix epoch seconds. A grant is expired the moment
    /// `now >= expires`; there is no grace window.
    pub expires: i64,

    /// Target object key.
    pub key: String,

    /// Maximum payload size in bytes. Required for write operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,

    /// Exact content type the uploaded payload must declare.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Object to evict before the write, if any.
    #[serde(
        default,
        rename = "previous_avatar_key",
        skip_serializing_if = "Option::is_none"
    )]
    pub previous_key: Option<String>,

    /// When set, failure and success responses carry diagnostic detail.
    /// Never changes status codes, only message content.
    #[serde(default)]
    pub verbose_feedback: bool,
}

impl Grant {
    /// Whether the grant has expired at `now_unix` (epoch seconds).
    pub fn is_expired(&self, now_unix: i64) -> bool {
        now_unix >= self.expires
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Method::Avatar).unwrap(), "\"avatar\"");
        assert_eq!(serde_json::to_string(&Method::List).unwrap(), "\"list\"");
        let parsed: Method = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(parsed, Method::Delete);
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(serde_json::from_str::<Method>("\"teleport\"").is_err());
    }

    #[test]
    fn test_grant_parses_issuer_field_names() {
        let json = r#"{
            "method": "avatar",
            "expires": 1893456000,
            "key": "avatars/new.webp",
            "max_size": 5242880,
            "mime_type": "image/webp",
            "previous_avatar_key": "avatars/old.webp",
            "verbose_feedback": true
        }"#;
        let grant: Grant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.method, Method::Avatar);
        assert_eq!(grant.max_size, Some(5 * 1024 * 1024));
        assert_eq!(grant.previous_key.as_deref(), Some("avatars/old.webp"));
        assert!(grant.verbose_feedback);
    }

    #[test]
    fn test_optional_fields_default() {
        let json = r#"{"method": "head", "expires": 0, "key": "k"}"#;
        let grant: Grant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.max_size, None);
        assert_eq!(grant.mime_type, None);
        assert_eq!(grant.previous_key, None);
        assert!(!grant.verbose_feedback);
    }

    #[test]
    fn test_expiry_boundary() {
        let grant = Grant {
            method: Method::Avatar,
            expires: 1000,
            key: "k".to_string(),
            max_size: None,
            mime_type: None,
            previous_key: None,
            verbose_feedback: false,
        };
        assert!(!grant.is_expired(999));
        // Exactly at the deadline counts as expired
        assert!(grant.is_expired(1000));
        assert!(grant.is_expired(1001));
    }

    #[test]
    fn test_serialized_grant_uses_wire_rename() {
        let grant = Grant {
            method: Method::Avatar,
            expires: 1,
            key: "k".to_string(),
            max_size: None,
            mime_type: None,
            previous_key: Some("old".to_string()),
            verbose_feedback: false,
        };
        let json = serde_json::to_string(&grant).unwrap();
        assert!(json.contains("previous_avatar_key"));
        assert!(!json.contains("previous_key"));
    }
}
