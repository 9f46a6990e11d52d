//! Persistence adapter for the items and windows records.
//!
//! Each record is a plain JSON array stored under its own key. Apps carry their `component_key`,
//! never a render handle, so records rehydrate against whatever component registry the rendering
//! layer supplies. Unreadable records are deleted and replaced by an empty store; nothing here is
//! fatal.

use leptos::logging;
use platform_host::{load_pref_with, save_pref_with, PrefsStore, StoreError};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    config::{StorageConfig, WorkspaceConfig},
    model::{DesktopSnapshot, DesktopState, Item, WindowRecord},
    reducer::RuntimeEffect,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    #[error("record `{key}` is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of reading one record at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordLoad<T> {
    Missing,
    Loaded(T),
    /// The record was unreadable and has been discarded.
    Discarded,
}

impl<T: Default> RecordLoad<T> {
    pub fn into_value(self) -> T {
        match self {
            Self::Loaded(value) => value,
            Self::Missing | Self::Discarded => T::default(),
        }
    }
}

/// Boot-time records plus whether this is the first session on this store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootLoad {
    pub snapshot: DesktopSnapshot,
    /// No items record existed, so the configured catalog should be seeded.
    pub first_boot: bool,
}

/// Loads both records, recovering each one independently.
pub async fn load_boot_snapshot<S: PrefsStore + ?Sized>(
    store: &S,
    config: &WorkspaceConfig,
) -> BootLoad {
    let items = recover_record::<_, Vec<Item>>(store, &config.storage.items_key).await;
    let first_boot = matches!(items, RecordLoad::Missing);

    let windows = if config.session.restore_windows_on_boot {
        recover_record::<_, Vec<WindowRecord>>(store, &config.storage.windows_key)
            .await
            .into_value()
    } else {
        Vec::new()
    };

    BootLoad {
        snapshot: DesktopSnapshot {
            items: items.into_value(),
            windows,
        },
        first_boot,
    }
}

/// Reads one record, deleting it when it does not decode.
pub async fn recover_record<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> RecordLoad<T> {
    match load_record(store, key).await {
        Ok(Some(value)) => RecordLoad::Loaded(value),
        Ok(None) => RecordLoad::Missing,
        Err(err @ PersistenceError::Corrupt { .. }) => {
            logging::warn!("discarding persisted record: {err}");
            if let Err(err) = store.delete_pref(key).await {
                logging::warn!("delete corrupt record `{key}` failed: {err}");
            }
            RecordLoad::Discarded
        }
        Err(err) => {
            logging::warn!("load record `{key}` failed: {err}");
            RecordLoad::Missing
        }
    }
}

/// # Errors
///
/// Returns [`PersistenceError::Corrupt`] when the stored JSON does not decode, or the store
/// error.
pub async fn load_record<S: PrefsStore + ?Sized, T: DeserializeOwned>(
    store: &S,
    key: &str,
) -> Result<Option<T>, PersistenceError> {
    load_pref_with(store, key).await.map_err(|err| match err {
        StoreError::Decode { key, reason } => PersistenceError::Corrupt { key, reason },
        other => PersistenceError::Store(other),
    })
}

/// # Errors
///
/// Returns the store error when the write fails.
pub async fn persist_items<S: PrefsStore + ?Sized>(
    store: &S,
    storage: &StorageConfig,
    items: &[Item],
) -> Result<(), PersistenceError> {
    save_pref_with(store, &storage.items_key, items).await?;
    Ok(())
}

/// # Errors
///
/// Returns the store error when the write fails.
pub async fn persist_windows<S: PrefsStore + ?Sized>(
    store: &S,
    storage: &StorageConfig,
    windows: &[WindowRecord],
) -> Result<(), PersistenceError> {
    save_pref_with(store, &storage.windows_key, windows).await?;
    Ok(())
}

/// Records captured at commit time for the persistence effects of one transition.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PendingWrites {
    pub items: Option<Vec<Item>>,
    pub windows: Option<Vec<WindowRecord>>,
}

impl PendingWrites {
    pub fn capture(state: &DesktopState, effects: &[RuntimeEffect]) -> Self {
        let mut writes = Self::default();
        for effect in effects {
            match effect {
                RuntimeEffect::PersistItems if writes.items.is_none() => {
                    writes.items = Some(state.items.items().to_vec());
                }
                RuntimeEffect::PersistWindows if writes.windows.is_none() => {
                    writes.windows = Some(state.windows.windows().to_vec());
                }
                _ => {}
            }
        }
        writes
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_none() && self.windows.is_none()
    }
}

/// Writes every captured record. Both writes are attempted even if the first fails.
///
/// Returns one error per record that could not be written, in write order.
pub async fn flush_pending_writes<S: PrefsStore + ?Sized>(
    store: &S,
    storage: &StorageConfig,
    writes: PendingWrites,
) -> Vec<PersistenceError> {
    let mut failures = Vec::new();
    if let Some(items) = writes.items {
        if let Err(err) = persist_items(store, storage, &items).await {
            failures.push(err);
        }
    }
    if let Some(windows) = writes.windows {
        if let Err(err) = persist_windows(store, storage, &windows).await {
            failures.push(err);
        }
    }
    failures
}
