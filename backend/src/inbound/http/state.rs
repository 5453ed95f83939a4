//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and ports and remain testable without real
//! storage.

use std::sync::Arc;

use crate::domain::ports::RecordStore;
use crate::domain::{AccountService, ScanService};

use super::operator_state::OperatorStates;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Account management use-cases.
    pub accounts: AccountService,
    /// Scan and override use-cases.
    pub scans: ScanService,
    /// Record log port, for export and flush.
    pub records: Arc<dyn RecordStore>,
    /// Per-session operator state registry.
    pub operator_states: Arc<OperatorStates>,
}

impl HttpState {
    /// Bundle the services and the record port for handler injection.
    pub fn new(
        accounts: AccountService,
        scans: ScanService,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            accounts,
            scans,
            records,
            operator_states: Arc::new(OperatorStates::new()),
        }
    }
}
