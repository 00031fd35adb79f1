//! # Filesystem-backed client storage
//!
//! [`FileStorage`] is a [`ClientStorage`] implementation that persists each key
//! as a small file. It is used on desktop and mobile platforms so a signed-in
//! session survives app restarts.
//!
//! ## Layout
//!
//! ```text
//! <base_dir>/
//! └── <key>.json         # raw stored value
//! ```
//!
//! ## Platform data directories
//!
//! [`FileStorage::default_location`] resolves a platform-appropriate base via
//! [`dirs::data_dir()`]:
//!
//! | Platform | Path |
//! |----------|------|
//! | macOS / iOS | `~/Library/Application Support/clinic-client/` |
//! | Linux | `~/.local/share/clinic-client/` |
//! | Windows | `C:\Users\<user>\AppData\Roaming\clinic-client\` |

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::storage::{ClientStorage, StorageError};

const APP_DIR: &str = "clinic-client";

/// Filesystem-backed ClientStorage for desktop and mobile persistence.
#[derive(Clone, Debug)]
pub struct FileStorage {
    base: PathBuf,
}

impl FileStorage {
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    /// Storage rooted in the platform data directory, or `./clinic-client`
    /// when the platform has none.
    pub fn default_location() -> Self {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);
        Self::new(base)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ClientStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.key_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.base)?;
        std::fs::write(self.key_path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
