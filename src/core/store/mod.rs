use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failures from the server-side value store. `NotFound` is distinguishable
/// from a legitimately empty stored value (`Value::Null` round-trips).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no value stored under key '{0}'")]
    NotFound(String),
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => AppError::new(
                ErrorCategory::NotFoundError,
                format!("server-side value missing or evicted for key '{}'", key),
            )
            .with_code("CBK-STORE-001"),
            StoreError::Backend(message) => {
                AppError::new(ErrorCategory::InternalError, message).with_code("CBK-STORE-002")
            }
        }
    }
}

/// Opaque reference standing in for a server-side value at the transport
/// boundary. Serializes to a single-field object so input wrappers can detect
/// the shape structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheToken {
    #[serde(rename = "__serverside_ref__")]
    pub key: String,
}

impl CacheToken {
    pub fn new<T: Into<String>>(key: T) -> Self {
        CacheToken { key: key.into() }
    }

    /// Content/identity key for one output slot: stable for a given
    /// `(session, blueprint, slot)` triple, disjoint across sessions.
    pub fn derive(session_id: &str, blueprint_id: &str, slot: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(session_id.as_bytes());
        hasher.update(b":");
        hasher.update(blueprint_id.as_bytes());
        hasher.update(b":");
        hasher.update(slot.to_string().as_bytes());
        CacheToken::new(hex::encode(hasher.finalize()))
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "__serverside_ref__": self.key })
    }

    /// Detect the token shape in a transported value.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        let key = map.get("__serverside_ref__")?.as_str()?;
        Some(CacheToken::new(key))
    }
}

/// Key/value collaborator holding server-side output values. Backends may
/// evict; a read of an evicted key must surface `NotFound`, never a token or
/// garbage. Writers to distinct keys must not interfere.
#[async_trait]
pub trait ValueStore: Send + Sync {
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Value, StoreError>;
}

/// Reference in-memory store over a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ValueStore for MemoryStore {
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Value, StoreError> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}
