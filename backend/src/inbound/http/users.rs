//! Account endpoints: first-run bootstrap, login/logout, and the admin CRUD.
//!
//! ```text
//! GET  /api/v1/bootstrap
//! POST /api/v1/bootstrap        {"login":"chief","password":"..."}
//! POST /api/v1/login            {"login":"maria.s","password":"..."}
//! POST /api/v1/logout
//! GET  /api/v1/session
//! GET  /api/v1/users?search=
//! POST /api/v1/users
//! PUT  /api/v1/users/{id}
//! POST /api/v1/users/{id}/password
//! DELETE /api/v1/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::account::{Role, UserAccount};
use crate::domain::auth::{CredentialsValidationError, LoginCredentials};
use crate::domain::Error;

use super::ApiResult;
use super::session::{SessionContext, SessionIdentity};
use super::state::HttpState;

/// Body for `POST /api/v1/login` and the bootstrap form.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account login.
    pub login: String,
    /// Plaintext password; hashed before it ever reaches storage.
    pub password: String,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = CredentialsValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.login, &value.password)
    }
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::EmptyLogin => Error::invalid_request("login must not be empty")
            .with_details(json!({ "field": "login", "code": "empty_login" })),
        CredentialsValidationError::EmptyPassword => {
            Error::invalid_request("password must not be empty")
                .with_details(json!({ "field": "password", "code": "empty_password" }))
        }
    }
}

/// Body for `POST /api/v1/bootstrap`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    /// Login of the first administrator.
    pub login: String,
    /// Optional display name.
    #[serde(default)]
    pub name: String,
    /// Plaintext password.
    pub password: String,
}

/// Response for `GET /api/v1/bootstrap`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapStatus {
    /// True while the first administrator is still missing.
    pub required: bool,
}

/// Whether the first administrator still needs to be created.
#[utoipa::path(
    get,
    path = "/api/v1/bootstrap",
    responses((status = 200, description = "Bootstrap status", body = BootstrapStatus)),
    tags = ["accounts"],
    operation_id = "bootstrapStatus",
    security([])
)]
#[get("/bootstrap")]
pub async fn bootstrap_status(state: web::Data<HttpState>) -> ApiResult<web::Json<BootstrapStatus>> {
    let required = state.accounts.bootstrap_required().await?;
    Ok(web::Json(BootstrapStatus { required }))
}

/// Create the first administrator. Refused once one exists.
#[utoipa::path(
    post,
    path = "/api/v1/bootstrap",
    request_body = BootstrapRequest,
    responses(
        (status = 201, description = "Administrator created", body = UserAccount),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "An administrator already exists", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "bootstrapAdmin",
    security([])
)]
#[post("/bootstrap")]
pub async fn bootstrap_admin(
    state: web::Data<HttpState>,
    payload: web::Json<BootstrapRequest>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let account = state
        .accounts
        .bootstrap_admin(&body.login, &body.name, &body.password)
        .await?;
    info!(login = %account.login, "first administrator created");
    Ok(HttpResponse::Created().json(account))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserAccount,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 409, description = "Bootstrap required", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<UserAccount>> {
    let credentials =
        LoginCredentials::try_from(&payload.into_inner()).map_err(map_credentials_error)?;
    let account = state.accounts.authenticate(&credentials).await?;
    let _ = session.sign_in(&account)?;
    info!(login = %account.login, role = %account.role, "operator signed in");
    Ok(web::Json(account))
}

/// End the session: flush the record log, drop the operator state, clear the
/// cookie.
///
/// A failed flush keeps the session alive so the operator can retry rather
/// than losing buffered entries silently.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Signed out"),
        (status = 503, description = "Flush failed; still signed in", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(state: web::Data<HttpState>, session: SessionContext) -> ApiResult<HttpResponse> {
    let identity = session.require_identity()?;
    state
        .records
        .flush()
        .await
        .map_err(|err| Error::service_unavailable(err.to_string()))?;
    if let Some(key) = session.state_key()? {
        state.operator_states.remove(key);
    }
    session.sign_out();
    info!(login = %identity.login, "operator signed out");
    Ok(HttpResponse::NoContent().finish())
}

/// Current session identity.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current identity", body = SessionIdentity),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(session: SessionContext) -> ApiResult<web::Json<SessionIdentity>> {
    Ok(web::Json(session.require_identity()?))
}

/// Query string for the admin listing.
#[derive(Debug, Deserialize)]
pub struct UserSearch {
    /// Substring matched against login and name.
    pub search: Option<String>,
}

/// List accounts (admin only).
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(("search" = Option<String>, Query, description = "Filter by login or name")),
    responses(
        (status = 200, description = "Accounts", body = [UserAccount]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Not an administrator", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<UserSearch>,
) -> ApiResult<web::Json<Vec<UserAccount>>> {
    let _ = session.require_admin()?;
    let accounts = state.accounts.list_accounts(query.search.as_deref()).await?;
    Ok(web::Json(accounts))
}

/// Body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Unique login.
    pub login: String,
    /// Optional display name.
    #[serde(default)]
    pub name: String,
    /// Access level.
    pub role: Role,
    /// Plaintext password.
    pub password: String,
    /// Whether the account starts active.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Enroll a new account (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created", body = UserAccount),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 409, description = "Login already exists", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let body = payload.into_inner();
    let account = state
        .accounts
        .create_account(&body.login, &body.name, body.role, &body.password, body.active)
        .await?;
    info!(login = %account.login, role = %account.role, by = %admin.login, "account created");
    Ok(HttpResponse::Created().json(account))
}

/// Body for `PUT /api/v1/users/{id}`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    /// New display name.
    #[serde(default)]
    pub name: String,
    /// New access level.
    pub role: Role,
    /// New active flag.
    pub active: bool,
}

/// Update account metadata (admin only).
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    request_body = UpdateUserRequest,
    responses(
        (status = 204, description = "Account updated"),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateUser"
)]
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    let _ = session.require_admin()?;
    let body = payload.into_inner();
    state
        .accounts
        .update_account(path.into_inner(), &body.name, body.role, body.active)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Body for `POST /api/v1/users/{id}/password`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    /// New plaintext password.
    pub password: String,
}

/// Reset an account's password (admin only).
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "resetUserPassword"
)]
#[post("/users/{id}/password")]
pub async fn reset_user_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
    payload: web::Json<ResetPasswordRequest>,
) -> ApiResult<HttpResponse> {
    let _ = session.require_admin()?;
    state
        .accounts
        .reset_password(path.into_inner(), &payload.password)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Hard delete an account (admin only).
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    responses(
        (status = 204, description = "Account removed"),
        (status = 403, description = "Not an administrator", body = Error),
        (status = 404, description = "No such account", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "removeUser"
)]
#[delete("/users/{id}")]
pub async fn remove_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let admin = session.require_admin()?;
    let id = path.into_inner();
    state.accounts.remove_account(id).await?;
    info!(%id, by = %admin.login, "account removed");
    Ok(HttpResponse::NoContent().finish())
}
