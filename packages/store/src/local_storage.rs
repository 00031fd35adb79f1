//! # Browser `localStorage` — web-side persistence
//!
//! [`LocalStorage`] is the [`ClientStorage`] implementation used on the **web
//! platform**. Values are written to `window.localStorage`, which is
//! synchronous and survives reloads of the same origin.
//!
//! ## Error handling
//!
//! A missing `window` or a disabled storage area (private mode, sandboxed
//! iframe) surfaces as [`StorageError::Unavailable`]. Callers that only read
//! the session treat that the same as "nothing stored".

use wasm_bindgen::JsValue;
use web_sys::Storage;

use crate::storage::{ClientStorage, StorageError};

/// `window.localStorage`-backed ClientStorage for the web platform.
#[derive(Clone, Debug, Default)]
pub struct LocalStorage;

impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn area(&self) -> Result<Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))
    }
}

fn js_error(err: JsValue) -> StorageError {
    StorageError::Unavailable(format!("{err:?}"))
}

impl ClientStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.area()?.get_item(key).map_err(js_error)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.area()?.set_item(key, value).map_err(js_error)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.area()?.remove_item(key).map_err(js_error)
    }
}
