//! Durable client-side storage for the clinic client.
//!
//! Holds the [`ClientStorage`] seam and its backends, the persisted
//! [`SessionRecord`], and the [`ClientConfig`] read from `client.toml`.

pub mod config;
pub mod record;
pub mod storage;

mod memory;
pub use memory::MemoryStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file_store;
#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStorage;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
mod local_storage;
#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub use local_storage::LocalStorage;

pub use config::ClientConfig;
pub use record::{SessionRecord, SESSION_KEY};
pub use storage::{ClientStorage, StorageError};
