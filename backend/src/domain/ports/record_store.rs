//! Port abstraction for the append-only record log.

use async_trait::async_trait;

use crate::domain::record::{RecordEntry, RecordQuery};
use crate::domain::scan::{ScanCode, ScreenContext};

/// Errors raised by record store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordStoreError {
    /// Backend connection could not be established or timed out.
    #[error("record store connection failed: {message}")]
    Connection {
        /// Backend-supplied detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("record store query failed: {message}")]
    Query {
        /// Backend-supplied detail.
        message: String,
    },
    /// The persisted data cannot be brought to the expected shape. Writes
    /// must halt; the operator is directed to an explicit recovery action.
    #[error("record store is corrupt: {message}")]
    Corrupt {
        /// What failed to load or migrate.
        message: String,
    },
}

impl RecordStoreError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a corrupt-store error with the given message.
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// Append-only record log port.
///
/// Adapters serialize concurrent appends so `exists` never observes a
/// partial write; an entry successfully appended is visible to subsequent
/// `exists` calls from the same logical session.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Duplicate-detection lookup on the `(context, transport, order)` triple.
    async fn exists(
        &self,
        context: ScreenContext,
        transport: &ScanCode,
        order: &ScanCode,
    ) -> Result<bool, RecordStoreError>;

    /// Persist one immutable entry.
    ///
    /// Never silently drops a write: on failure the caller keeps the
    /// in-progress attempt and the operator may retry.
    async fn append(&self, entry: &RecordEntry) -> Result<(), RecordStoreError>;

    /// Entries matching the filter, ascending by timestamp.
    async fn query(&self, query: &RecordQuery) -> Result<Vec<RecordEntry>, RecordStoreError>;

    /// Force buffered appends to durability.
    ///
    /// Backends that are durable per append implement this as a no-op.
    async fn flush(&self) -> Result<(), RecordStoreError>;
}
