//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for the
//! REST API: every endpoint of the inbound layer, the shared schemas, and the
//! session cookie security scheme. Swagger UI serves the document in debug
//! builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::account::{Role, UserAccount};
use crate::domain::batch::BatchItem;
use crate::domain::policy::DivergenceReason;
use crate::domain::record::RecordEntry;
use crate::domain::scan::ScreenContext;
use crate::domain::{Error, ErrorCode};
use crate::inbound::http::export::{ExportParams, ExportPreview};
use crate::inbound::http::scans::{BatchResponse, OverrideRequest, ScanRequest, ScanResponse};
use crate::inbound::http::session::SessionIdentity;
use crate::inbound::http::users::{
    BootstrapRequest, BootstrapStatus, CreateUserRequest, LoginRequest, ResetPasswordRequest,
    UpdateUserRequest,
};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Label validation backend API",
        description = "HTTP interface for scan verdicts, divergence overrides, \
                       account management, and record export."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::bootstrap_status,
        crate::inbound::http::users::bootstrap_admin,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_session,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::reset_user_password,
        crate::inbound::http::users::remove_user,
        crate::inbound::http::scans::submit_scan,
        crate::inbound::http::scans::submit_override,
        crate::inbound::http::scans::cancel_override,
        crate::inbound::http::scans::list_batch,
        crate::inbound::http::scans::reset_batch,
        crate::inbound::http::scans::flush_records,
        crate::inbound::http::export::export_records,
        crate::inbound::http::export::preview_export,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        UserAccount,
        Role,
        ScreenContext,
        RecordEntry,
        BatchItem,
        DivergenceReason,
        SessionIdentity,
        LoginRequest,
        BootstrapRequest,
        BootstrapStatus,
        CreateUserRequest,
        UpdateUserRequest,
        ResetPasswordRequest,
        ScanRequest,
        ScanResponse,
        OverrideRequest,
        BatchResponse,
        ExportParams,
        ExportPreview,
    )),
    tags(
        (name = "accounts", description = "Bootstrap, sessions, and account management"),
        (name = "scans", description = "Scan verdicts and the override gate"),
        (name = "records", description = "Record log export and flushing"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
