//! Key/value storage contracts and adapters.

pub mod prefs;
pub mod web_prefs;
