//! Desktop workspace core: the item registry, the window stack, and their persistence.
//!
//! [`WorkspaceSession`] drives the workspace headlessly; [`provide_desktop_runtime`] exposes the
//! same reducer to Leptos components.

pub mod component_registry;
pub mod config;
pub mod model;
pub mod persistence;
pub mod reducer;
pub mod registry;
pub mod runtime_context;
pub mod session;
pub mod taskbar;
pub mod window_manager;
pub mod window_resources;

pub use component_registry::{
    resolve_window_component, resolve_window_content, ComponentRegistry, ComponentResolver,
    WindowContent,
};
pub use config::{ConfigError, SessionConfig, StorageConfig, WorkspaceConfig};
pub use model::*;
pub use persistence::{
    load_boot_snapshot, persist_items, persist_windows, BootLoad, PersistenceError,
};
pub use reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect};
pub use registry::{ErrorClass, RegistryError};
pub use runtime_context::{provide_desktop_runtime, use_desktop_runtime, DesktopRuntimeContext};
pub use session::WorkspaceSession;
pub use taskbar::{taskbar_entries, TaskbarEntry};
pub use window_manager::TaskbarToggle;
pub use window_resources::{TimerHandle, WindowResourceTable};
