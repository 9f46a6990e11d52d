//! Durable key/value storage contracts for workspace records.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Object-safe boxed future used by [`PrefsStore`] async methods.
pub type PrefsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Failures reported by [`PrefsStore`] implementations and the typed helpers.
pub enum StoreError {
    /// The backing store does not exist on this target (for example, no `window`).
    #[error("storage backend unavailable")]
    Unavailable,
    /// The backing store rejected a read or write.
    #[error("storage backend failure: {0}")]
    Backend(String),
    /// A value could not be encoded as JSON.
    #[error("failed to encode `{key}`: {reason}")]
    Encode {
        /// Key being written.
        key: String,
        /// Serializer message.
        reason: String,
    },
    /// A stored value exists but does not decode into the requested type.
    #[error("stored value for `{key}` is unreadable: {reason}")]
    Decode {
        /// Key being read.
        key: String,
        /// Deserializer message.
        reason: String,
    },
}

impl StoreError {
    /// Returns `true` when the failure comes from unreadable stored data rather than the backend.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Host service for durable values stored as JSON text per key.
pub trait PrefsStore {
    /// Loads the raw JSON string stored under `key`.
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, StoreError>>;

    /// Replaces the raw JSON string stored under `key`.
    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), StoreError>>;

    /// Deletes `key`. Deleting a missing key succeeds.
    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), StoreError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that remembers nothing, for targets without durable storage.
pub struct NoopPrefsStore;

impl PrefsStore for NoopPrefsStore {
    fn load_pref<'a>(
        &'a self,
        _key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, StoreError>> {
        Box::pin(async { Ok(None) })
    }

    fn save_pref<'a>(
        &'a self,
        _key: &'a str,
        _raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_pref<'a>(&'a self, _key: &'a str) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store keyed by string. Clones share the same backing map.
pub struct MemoryPrefsStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryPrefsStore {
    /// Returns the raw text stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Stores raw text under `key` without any JSON validation.
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        self.inner.borrow_mut().insert(key.into(), raw.into());
    }

    /// Lists the keys currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }
}

impl PrefsStore for MemoryPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, StoreError>> {
        Box::pin(async move { Ok(self.raw(key)) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.insert_raw(key, raw_json);
            Ok(())
        })
    }

    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }
}

/// Loads and deserializes a typed value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns the store error unchanged, or [`StoreError::Decode`] when the stored JSON does not
/// match `T`.
pub async fn load_pref_with<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.load_pref(key).await? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Some(value))
}

/// Serializes and saves a typed value through a [`PrefsStore`] implementation.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] when `value` cannot be serialized, or the store error.
pub async fn save_pref_with<S: PrefsStore + ?Sized, T: Serialize + ?Sized>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value).map_err(|e| StoreError::Encode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    store.save_pref(key, &raw).await
}
