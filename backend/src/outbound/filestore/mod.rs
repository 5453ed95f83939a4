//! File-backed storage adapters.
//!
//! One of the two interchangeable backends behind the domain ports: accounts
//! live in a single JSON document rewritten atomically on every mutation,
//! the record log is an append-only JSON-lines file with a write-behind
//! buffer flushed every N appends and on explicit flush.
//!
//! All filesystem access goes through a `cap_std::fs::Dir` handle opened once
//! at startup, so the adapters can only touch the configured data directory.

mod record_store;
mod user_store;

pub use record_store::FileRecordStore;
pub use user_store::FileUserStore;

use std::io;
use std::path::{Path, PathBuf};

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use uuid::Uuid;

/// Errors raised while opening a file-backed store.
#[derive(Debug, thiserror::Error)]
pub enum FileStoreOpenError {
    /// The data directory could not be created or opened.
    #[error("failed to open data directory {path}: {source}")]
    DataDir {
        /// Directory that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An existing store file could not be read.
    #[error("failed to read {file}: {source}")]
    Read {
        /// File that failed to read.
        file: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An existing store file does not parse; writes must not proceed.
    ///
    /// Recovery is an explicit operator action: fix or move the named file.
    #[error("{file} is corrupt ({detail}); move the file aside or restore a backup before retrying")]
    Corrupt {
        /// File that failed to parse.
        file: String,
        /// Parser detail.
        detail: String,
    },
}

/// Create (if needed) and open the data directory.
pub(crate) fn open_data_dir(path: &Path) -> Result<Dir, FileStoreOpenError> {
    Dir::create_ambient_dir_all(path, ambient_authority()).map_err(|source| {
        FileStoreOpenError::DataDir {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Dir::open_ambient_dir(path, ambient_authority()).map_err(|source| {
        FileStoreOpenError::DataDir {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Replace `file` with `bytes` via a staged temp file and rename, so readers
/// never observe a half-written document.
pub(crate) fn replace_file_atomically(dir: &Dir, file: &str, bytes: &[u8]) -> io::Result<()> {
    let staging = format!(".tmp-{}-{}", file, Uuid::new_v4().simple());
    dir.write(&staging, bytes)?;
    match dir.rename(&staging, dir, file) {
        Ok(()) => Ok(()),
        Err(error) => {
            // Best-effort cleanup; the original file is untouched.
            let _ = dir.remove_file(&staging);
            Err(error)
        }
    }
}
