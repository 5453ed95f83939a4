//! Scan evaluation and override resolution use-cases.
//!
//! The service is stateless; per-operator state (the override gate and the
//! batch list) is threaded in explicitly as an [`OperatorSession`], so no
//! ambient globals are involved and two operators never share a gate.

use std::sync::Arc;

use mockable::Clock;
use serde_json::json;

use crate::domain::Error;
use crate::domain::auth::LoginCredentials;
use crate::domain::batch::BatchTracker;
use crate::domain::override_gate::{OverrideGate, PendingDivergence};
use crate::domain::policy::{self, DivergenceReason, Verdict};
use crate::domain::ports::{RecordStore, RecordStoreError, UserStore, UserStoreError};
use crate::domain::record::RecordEntry;
use crate::domain::scan::{ScanCode, ScreenContext};

/// Per-operator mutable state: the override gate and the current batch.
///
/// Owned by the operator's session; discarded on logout. Losing it never
/// loses recorded entries.
#[derive(Debug, Default)]
pub struct OperatorSession {
    /// Divergence gate for this operator.
    pub gate: OverrideGate,
    /// Running batch list for the several-volumes flow.
    pub batch: BatchTracker,
}

impl OperatorSession {
    /// Fresh session with an idle gate and an empty batch.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of a scan or an override resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The attempt was persisted.
    Recorded {
        /// The appended log entry.
        entry: RecordEntry,
        /// Batch sequence number when the scan came from the batch flow.
        sequence: Option<u64>,
    },
    /// The pair was flagged; the gate now awaits authorization.
    OverrideRequired {
        /// Why the pair was flagged.
        reason: DivergenceReason,
        /// Sanitized first code, echoed for the override form.
        transport: ScanCode,
        /// Sanitized second code, echoed for the override form.
        order: ScanCode,
    },
}

fn map_record_error(error: RecordStoreError) -> Error {
    match error {
        RecordStoreError::Connection { message } | RecordStoreError::Corrupt { message } => {
            Error::service_unavailable(message)
        }
        RecordStoreError::Query { message } => Error::internal(message),
    }
}

fn map_user_error(error: UserStoreError) -> Error {
    match error {
        UserStoreError::Connection { message } => Error::service_unavailable(message),
        other => Error::internal(other.to_string()),
    }
}

/// Scan evaluation service.
#[derive(Clone)]
pub struct ScanService {
    records: Arc<dyn RecordStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl ScanService {
    /// Create a service over the given stores and clock.
    pub fn new(
        records: Arc<dyn RecordStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records,
            users,
            clock,
        }
    }

    /// Evaluate a scanned pair and either record it or flag it.
    ///
    /// Raw inputs are re-sanitized here; the core validates its own contract
    /// rather than trusting the UI's sanitization.
    pub async fn submit_scan(
        &self,
        session: &mut OperatorSession,
        operator: &str,
        transport_raw: &str,
        order_raw: &str,
        context: ScreenContext,
    ) -> Result<ScanOutcome, Error> {
        if session.gate.is_awaiting() {
            return Err(Error::conflict(
                "a divergence is awaiting authorization; validate or cancel it first",
            )
            .with_details(json!({ "code": "override_pending" })));
        }

        let transport = ScanCode::sanitize(transport_raw);
        let order = ScanCode::sanitize(order_raw);

        let duplicate = self
            .records
            .exists(context, &transport, &order)
            .await
            .map_err(map_record_error)?;

        match policy::evaluate(&transport, &order, context, duplicate) {
            Verdict::Incomplete => Err(Error::invalid_request(
                "both codes are required; scan transport and order again",
            )
            .with_details(json!({ "code": "incomplete_pair" }))),
            Verdict::Accept => {
                let entry = RecordEntry::accepted(
                    self.clock.utc(),
                    operator,
                    context,
                    transport,
                    order,
                )
                .map_err(|err| Error::internal(err.to_string()))?;
                self.records.append(&entry).await.map_err(map_record_error)?;
                let sequence = self.track_in_batch(session, &entry);
                Ok(ScanOutcome::Recorded { entry, sequence })
            }
            Verdict::RequireOverride(reason) => {
                session
                    .gate
                    .flag(PendingDivergence {
                        context,
                        transport: transport.clone(),
                        order: order.clone(),
                        reason,
                    })
                    .map_err(|err| Error::conflict(err.to_string()))?;
                Ok(ScanOutcome::OverrideRequired {
                    reason,
                    transport,
                    order,
                })
            }
        }
    }

    /// Resolve the pending divergence with supervisor/admin credentials.
    ///
    /// Failures leave the gate awaiting so the operator may retry or cancel;
    /// nothing is persisted until every check passes.
    pub async fn submit_override(
        &self,
        session: &mut OperatorSession,
        operator: &str,
        credentials: &LoginCredentials,
        reason: &str,
    ) -> Result<ScanOutcome, Error> {
        let Some(pending) = session.gate.pending().cloned() else {
            return Err(Error::conflict("no divergence is awaiting authorization")
                .with_details(json!({ "code": "nothing_pending" })));
        };

        let authorizer = self
            .users
            .authenticate(credentials)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| {
                Error::unauthorized("invalid supervisor credentials")
                    .with_details(json!({ "code": "invalid_credentials" }))
            })?;

        if !authorizer.role.can_authorize_divergence() {
            return Err(Error::forbidden(
                "only a supervisor or admin may authorize a divergence",
            )
            .with_details(json!({ "code": "insufficient_role" })));
        }

        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::invalid_request("a reason for the divergence is required")
                .with_details(json!({ "code": "missing_reason" })));
        }

        let entry = RecordEntry::divergent(
            self.clock.utc(),
            operator,
            pending.context,
            pending.transport,
            pending.order,
            authorizer.login.as_ref(),
            reason,
        )
        .map_err(|err| Error::internal(err.to_string()))?;

        // Persist before touching the gate: a failed append keeps the attempt
        // pending so the operator retries instead of re-scanning.
        self.records.append(&entry).await.map_err(map_record_error)?;
        let _ = session
            .gate
            .resolve()
            .map_err(|err| Error::internal(err.to_string()))?;

        let sequence = self.track_in_batch(session, &entry);
        Ok(ScanOutcome::Recorded { entry, sequence })
    }

    /// Discard the pending divergence without recording anything.
    pub fn cancel_override(&self, session: &mut OperatorSession) -> Result<(), Error> {
        session
            .gate
            .cancel()
            .map(|_| ())
            .map_err(|err| Error::conflict(err.to_string()))
    }

    fn track_in_batch(&self, session: &mut OperatorSession, entry: &RecordEntry) -> Option<u64> {
        match entry.context {
            ScreenContext::Batch => Some(session.batch.add(
                entry.transport.clone(),
                entry.order.clone(),
                entry.divergent,
            )),
            ScreenContext::Single => None,
        }
    }
}
