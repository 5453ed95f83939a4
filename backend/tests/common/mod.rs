//! Shared harness for HTTP integration tests.
//!
//! Builds the real handler graph over the file backend in a temporary data
//! directory, with an ephemeral cookie-session key. Tests drive the service
//! exactly the way a browser would: bootstrap, login, then cookie-carried
//! requests.

use std::sync::Arc;

use actix_http::Request;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::json;
use tempfile::TempDir;

use backend::domain::{AccountService, ScanService};
use backend::inbound::http::export::{export_records, preview_export};
use backend::inbound::http::scans::{
    cancel_override, flush_records, list_batch, reset_batch, submit_override, submit_scan,
};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::users::{
    bootstrap_admin, bootstrap_status, create_user, current_session, list_users, login, logout,
    remove_user, reset_user_password, update_user,
};
use backend::outbound::filestore::{FileRecordStore, FileUserStore};

/// Build the API app over a file backend rooted at `dir`.
///
/// The record log flushes on every append so reopen-based assertions see
/// everything without an explicit flush.
pub fn test_app(
    dir: &TempDir,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let users = Arc::new(FileUserStore::open(dir.path()).expect("open user store"));
    let records = Arc::new(
        FileRecordStore::open_with_flush_every(dir.path(), 1).expect("open record store"),
    );
    let clock = Arc::new(DefaultClock);
    let accounts = AccountService::new(users.clone(), clock.clone());
    let scans = ScanService::new(records.clone(), users, clock);
    let state = web::Data::new(HttpState::new(accounts, scans, records));

    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".into())
        .cookie_secure(false)
        .build();

    App::new().app_data(state).service(
        web::scope("/api/v1")
            .wrap(session)
            .service(bootstrap_status)
            .service(bootstrap_admin)
            .service(login)
            .service(logout)
            .service(current_session)
            .service(list_users)
            .service(create_user)
            .service(update_user)
            .service(reset_user_password)
            .service(remove_user)
            .service(submit_scan)
            .service(submit_override)
            .service(cancel_override)
            .service(list_batch)
            .service(reset_batch)
            .service(flush_records)
            .service(export_records)
            .service(preview_export),
    )
}

/// POST a JSON body, optionally carrying the session cookie.
pub async fn post_json<S>(
    app: &S,
    uri: &str,
    body: serde_json::Value,
    cookie: Option<&Cookie<'static>>,
) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::post().uri(uri).set_json(body);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    test::call_service(app, request.to_request()).await
}

/// GET a path, optionally carrying the session cookie.
pub async fn get<S>(app: &S, uri: &str, cookie: Option<&Cookie<'static>>) -> ServiceResponse
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::get().uri(uri);
    if let Some(cookie) = cookie {
        request = request.cookie(cookie.clone());
    }
    test::call_service(app, request.to_request()).await
}

/// Extract the session cookie from a response.
pub fn session_cookie(response: &ServiceResponse) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie present")
        .into_owned()
}

/// Create the first admin (`chief` / `root-pw`).
pub async fn bootstrap<S>(app: &S)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = post_json(
        app,
        "/api/v1/bootstrap",
        json!({ "login": "chief", "name": "Chief", "password": "root-pw" }),
        None,
    )
    .await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
}

/// Sign in and return the session cookie.
pub async fn sign_in<S>(app: &S, login_name: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = post_json(
        app,
        "/api/v1/login",
        json!({ "login": login_name, "password": password }),
        None,
    )
    .await;
    assert!(
        response.status().is_success(),
        "login should succeed for {login_name}"
    );
    session_cookie(&response)
}

/// Bootstrap, then sign the admin in.
pub async fn bootstrap_and_sign_in<S>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    bootstrap(app).await;
    sign_in(app, "chief", "root-pw").await
}
