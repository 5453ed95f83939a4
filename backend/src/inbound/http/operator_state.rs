//! In-process registry of per-session operator state.
//!
//! Each logged-in session owns an [`OperatorSession`] (override gate plus
//! batch list) addressed by the state key in its cookie. The registry is
//! process-local by design: a restart loses gates and batch views but never
//! recorded entries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::domain::scan_service::OperatorSession;

/// Shared handle to one session's mutable state.
pub type SharedOperatorSession = Arc<AsyncMutex<OperatorSession>>;

/// Registry mapping state keys to operator sessions.
///
/// The outer lock is held only to look up or drop an entry; per-session
/// work happens under the entry's own async mutex, so one operator's slow
/// override never blocks another's scans.
#[derive(Default)]
pub struct OperatorStates {
    inner: Mutex<HashMap<Uuid, SharedOperatorSession>>,
}

impl OperatorStates {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the state for a key, creating a fresh idle one when absent
    /// (first request after login, or after a process restart).
    pub fn get_or_create(&self, key: Uuid) -> SharedOperatorSession {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| {
            // A poisoned registry only means a panic elsewhere; the map
            // itself is still usable.
            poisoned.into_inner()
        });
        inner
            .entry(key)
            .or_insert_with(|| Arc::new(AsyncMutex::new(OperatorSession::new())))
            .clone()
    }

    /// Drop the state for a key on logout.
    pub fn remove(&self, key: Uuid) {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _ = inner.remove(&key);
    }

    /// Number of live sessions; used by tests and diagnostics.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Whether no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[tokio::test]
    async fn get_or_create_returns_the_same_state_for_a_key() {
        let registry = OperatorStates::new();
        let key = Uuid::new_v4();

        let first = registry.get_or_create(key);
        first.lock().await.batch.add(
            crate::domain::ScanCode::sanitize("VOL1"),
            crate::domain::ScanCode::sanitize("VOL1"),
            false,
        );

        let second = registry.get_or_create(key);
        assert_eq!(second.lock().await.batch.len(), 1);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn distinct_keys_have_private_state() {
        let registry = OperatorStates::new();
        let first = registry.get_or_create(Uuid::new_v4());
        let second = registry.get_or_create(Uuid::new_v4());

        first.lock().await.batch.add(
            crate::domain::ScanCode::sanitize("VOL1"),
            crate::domain::ScanCode::sanitize("VOL1"),
            false,
        );
        assert!(second.lock().await.batch.is_empty());
    }

    #[test]
    fn remove_drops_the_entry() {
        let registry = OperatorStates::new();
        let key = Uuid::new_v4();
        let _ = registry.get_or_create(key);
        registry.remove(key);
        assert!(registry.is_empty());
    }
}
