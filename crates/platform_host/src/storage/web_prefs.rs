//! `localStorage`-backed store.
//!
//! The browser API is synchronous, so every future returned here is ready on first poll.

use super::prefs::{PrefsStore, PrefsStoreFuture, StoreError};

#[derive(Debug, Clone, Copy, Default)]
/// Browser store backed by `window.localStorage`.
pub struct WebPrefsStore;

impl WebPrefsStore {
    /// Reads the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] outside a browser and [`StoreError::Backend`] when the
    /// read throws.
    pub fn load_json(self, key: &str) -> Result<Option<String>, StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .get_item(key)
                .map_err(|e| StoreError::Backend(format!("localStorage get_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Err(StoreError::Unavailable)
        }
    }

    /// Replaces the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] outside a browser and [`StoreError::Backend`] when the
    /// write throws (quota exceeded, private mode).
    pub fn save_json(self, key: &str, raw_json: &str) -> Result<(), StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .set_item(key, raw_json)
                .map_err(|e| StoreError::Backend(format!("localStorage set_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Err(StoreError::Unavailable)
        }
    }

    /// Removes `key` from localStorage.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] outside a browser and [`StoreError::Backend`] when the
    /// removal throws.
    pub fn delete_json(self, key: &str) -> Result<(), StoreError> {
        #[cfg(target_arch = "wasm32")]
        {
            local_storage()?
                .remove_item(key)
                .map_err(|e| StoreError::Backend(format!("localStorage remove_item failed: {e:?}")))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            Err(StoreError::Unavailable)
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn local_storage() -> Result<web_sys::Storage, StoreError> {
    web_sys::window()
        .and_then(|w| w.local_storage().ok().flatten())
        .ok_or(StoreError::Unavailable)
}

impl PrefsStore for WebPrefsStore {
    fn load_pref<'a>(
        &'a self,
        key: &'a str,
    ) -> PrefsStoreFuture<'a, Result<Option<String>, StoreError>> {
        let store = *self;
        Box::pin(async move { store.load_json(key) })
    }

    fn save_pref<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        let store = *self;
        Box::pin(async move { store.save_json(key, raw_json) })
    }

    fn delete_pref<'a>(&'a self, key: &'a str) -> PrefsStoreFuture<'a, Result<(), StoreError>> {
        let store = *self;
        Box::pin(async move { store.delete_json(key) })
    }
}
