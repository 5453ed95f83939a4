//! Scan endpoints: verdicts, the override dialog, the batch list, and the
//! explicit "save now" flush.
//!
//! ```text
//! POST /api/v1/scans                  {"transport":"...","order":"...","context":"LEITURA"}
//! POST /api/v1/scans/override         {"login":"chief","password":"...","reason":"..."}
//! POST /api/v1/scans/override/cancel
//! GET  /api/v1/batch?limit=50
//! POST /api/v1/batch/reset
//! POST /api/v1/records/flush
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::auth::LoginCredentials;
use crate::domain::batch::BatchItem;
use crate::domain::policy::DivergenceReason;
use crate::domain::record::RecordEntry;
use crate::domain::scan::ScreenContext;
use crate::domain::scan_service::ScanOutcome;
use crate::domain::Error;

use super::ApiResult;
use super::session::{SessionContext, SessionIdentity};
use super::state::HttpState;

/// How many batch items the listing returns when the caller does not say.
const DEFAULT_BATCH_LIMIT: usize = 200;

/// Body for `POST /api/v1/scans`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Raw first code as read by the scanner.
    pub transport: String,
    /// Raw second code as read by the scanner.
    pub order: String,
    /// Screen the scan came from.
    pub context: ScreenContext,
}

/// Outcome payload for scans and override resolutions.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanResponse {
    /// The attempt was persisted.
    Recorded {
        /// The appended log entry.
        entry: RecordEntry,
        /// Batch sequence number, present for the batch flow.
        #[serde(skip_serializing_if = "Option::is_none")]
        sequence: Option<u64>,
    },
    /// The pair was flagged; the UI renders the override form.
    OverrideRequired {
        /// Why the pair was flagged.
        reason: DivergenceReason,
        /// Sanitized first code.
        transport: String,
        /// Sanitized second code.
        order: String,
    },
}

impl From<ScanOutcome> for ScanResponse {
    fn from(outcome: ScanOutcome) -> Self {
        match outcome {
            ScanOutcome::Recorded { entry, sequence } => Self::Recorded { entry, sequence },
            ScanOutcome::OverrideRequired {
                reason,
                transport,
                order,
            } => Self::OverrideRequired {
                reason,
                transport: transport.as_ref().to_owned(),
                order: order.as_ref().to_owned(),
            },
        }
    }
}

async fn require_operator(
    state: &HttpState,
    session: &SessionContext,
) -> Result<(SessionIdentity, Uuid), Error> {
    let identity = session.require_identity()?;
    // Re-checked on every scan: deleting the last admin re-arms the gate.
    state.accounts.ensure_ready().await?;
    let key = session
        .state_key()?
        .ok_or_else(|| Error::unauthorized("login required"))?;
    Ok((identity, key))
}

/// Evaluate a scanned pair.
#[utoipa::path(
    post,
    path = "/api/v1/scans",
    request_body = ScanRequest,
    responses(
        (status = 200, description = "Verdict", body = ScanResponse),
        (status = 400, description = "Incomplete pair", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 409, description = "A divergence is already pending", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["scans"],
    operation_id = "submitScan"
)]
#[post("/scans")]
pub async fn submit_scan(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ScanRequest>,
) -> ApiResult<web::Json<ScanResponse>> {
    let (identity, key) = require_operator(&state, &session).await?;
    let shared = state.operator_states.get_or_create(key);
    let mut operator = shared.lock().await;

    let body = payload.into_inner();
    let outcome = state
        .scans
        .submit_scan(
            &mut operator,
            &identity.login,
            &body.transport,
            &body.order,
            body.context,
        )
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Body for `POST /api/v1/scans/override`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRequest {
    /// Supervisor or admin login.
    pub login: String,
    /// Supervisor or admin password.
    pub password: String,
    /// Free-text reason for the divergence.
    pub reason: String,
}

/// Authorize the pending divergence.
#[utoipa::path(
    post,
    path = "/api/v1/scans/override",
    request_body = OverrideRequest,
    responses(
        (status = 200, description = "Divergence recorded", body = ScanResponse),
        (status = 400, description = "Missing reason", body = Error),
        (status = 401, description = "Invalid supervisor credentials", body = Error),
        (status = 403, description = "Insufficient role", body = Error),
        (status = 409, description = "Nothing pending", body = Error),
        (status = 503, description = "Storage unavailable; attempt preserved", body = Error)
    ),
    tags = ["scans"],
    operation_id = "submitOverride"
)]
#[post("/scans/override")]
pub async fn submit_override(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OverrideRequest>,
) -> ApiResult<web::Json<ScanResponse>> {
    let (identity, key) = require_operator(&state, &session).await?;
    let shared = state.operator_states.get_or_create(key);
    let mut operator = shared.lock().await;

    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.login, &body.password)
        .map_err(|_| Error::unauthorized("invalid supervisor credentials"))?;
    let outcome = state
        .scans
        .submit_override(&mut operator, &identity.login, &credentials, &body.reason)
        .await?;
    Ok(web::Json(outcome.into()))
}

/// Cancel the pending divergence without recording anything.
#[utoipa::path(
    post,
    path = "/api/v1/scans/override/cancel",
    responses(
        (status = 204, description = "Divergence discarded"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 409, description = "Nothing pending", body = Error)
    ),
    tags = ["scans"],
    operation_id = "cancelOverride"
)]
#[post("/scans/override/cancel")]
pub async fn cancel_override(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let (_, key) = require_operator(&state, &session).await?;
    let shared = state.operator_states.get_or_create(key);
    let mut operator = shared.lock().await;

    state.scans.cancel_override(&mut operator)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Query string for the batch listing.
#[derive(Debug, Deserialize)]
pub struct BatchListParams {
    /// Most recent N items; defaults to 200.
    pub limit: Option<usize>,
}

/// Response for `GET /api/v1/batch`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// The most recent items, oldest first.
    pub items: Vec<BatchItem>,
    /// Total items in the current batch.
    pub total: usize,
}

/// The current batch list.
#[utoipa::path(
    get,
    path = "/api/v1/batch",
    params(("limit" = Option<usize>, Query, description = "Most recent N items")),
    responses(
        (status = 200, description = "Current batch", body = BatchResponse),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["scans"],
    operation_id = "listBatch"
)]
#[get("/batch")]
pub async fn list_batch(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<BatchListParams>,
) -> ApiResult<web::Json<BatchResponse>> {
    let _ = session.require_identity()?;
    let key = session
        .state_key()?
        .ok_or_else(|| Error::unauthorized("login required"))?;
    let shared = state.operator_states.get_or_create(key);
    let operator = shared.lock().await;

    let limit = query.limit.unwrap_or(DEFAULT_BATCH_LIMIT);
    Ok(web::Json(BatchResponse {
        items: operator.batch.items(limit).to_vec(),
        total: operator.batch.len(),
    }))
}

/// Clear the batch list and its sequence counter.
#[utoipa::path(
    post,
    path = "/api/v1/batch/reset",
    responses(
        (status = 204, description = "Batch cleared"),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["scans"],
    operation_id = "resetBatch"
)]
#[post("/batch/reset")]
pub async fn reset_batch(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let _ = session.require_identity()?;
    let key = session
        .state_key()?
        .ok_or_else(|| Error::unauthorized("login required"))?;
    let shared = state.operator_states.get_or_create(key);
    let mut operator = shared.lock().await;

    operator.batch.reset();
    Ok(HttpResponse::NoContent().finish())
}

/// Force buffered record appends to durability ("save now").
#[utoipa::path(
    post,
    path = "/api/v1/records/flush",
    responses(
        (status = 204, description = "Log flushed"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 503, description = "Flush failed", body = Error)
    ),
    tags = ["records"],
    operation_id = "flushRecords"
)]
#[post("/records/flush")]
pub async fn flush_records(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let _ = session.require_identity()?;
    state
        .records
        .flush()
        .await
        .map_err(|err| Error::service_unavailable(err.to_string()))?;
    Ok(HttpResponse::NoContent().finish())
}
