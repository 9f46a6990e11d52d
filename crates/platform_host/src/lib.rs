//! Typed host-domain storage contracts shared by the desktop workspace runtime.
//!
//! The runtime never talks to `localStorage` directly. It persists its item and window records
//! through the [`PrefsStore`] trait, which this crate implements for the browser
//! ([`WebPrefsStore`]), for tests and headless sessions ([`MemoryPrefsStore`]), and for targets
//! without durable storage ([`NoopPrefsStore`]).

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod storage;

pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore, PrefsStoreFuture,
    StoreError,
};
pub use storage::web_prefs::WebPrefsStore;
