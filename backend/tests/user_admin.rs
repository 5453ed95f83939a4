//! Account management over the HTTP surface: authorization boundaries and
//! the admin CRUD.

mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};
use tempfile::TempDir;
use uuid::Uuid;

use common::{bootstrap_and_sign_in, get, post_json, sign_in};

async fn read_json(response: actix_web::dev::ServiceResponse) -> Value {
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

#[actix_web::test]
async fn admin_creates_and_lists_accounts() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let created = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "name": "Maria Silva", "role": "user", "password": "pw" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = read_json(created).await;
    assert_eq!(body["login"], "maria.s");
    assert_eq!(body["role"], "user");
    assert_eq!(body["active"], true);
    assert!(body.get("password").is_none(), "no credential material leaks");

    let listing = get(&app, "/api/v1/users", Some(&cookie)).await;
    let accounts = read_json(listing).await;
    assert_eq!(accounts.as_array().expect("array").len(), 2);

    let filtered = get(&app, "/api/v1/users?search=silva", Some(&cookie)).await;
    let accounts = read_json(filtered).await;
    assert_eq!(accounts.as_array().expect("array").len(), 1);
    assert_eq!(accounts[0]["login"], "maria.s");
}

#[actix_web::test]
async fn duplicate_logins_are_conflicts() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let first = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "user", "password": "pw" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "supervisor", "password": "pw2" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let listing = get(&app, "/api/v1/users?search=maria.s", Some(&cookie)).await;
    assert_eq!(
        read_json(listing).await.as_array().expect("array").len(),
        1,
        "exactly one account with that login"
    );
}

#[actix_web::test]
async fn non_admins_cannot_manage_accounts() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let admin_cookie = bootstrap_and_sign_in(&app).await;

    let created = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "user", "password": "pw" }),
        Some(&admin_cookie),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let operator_cookie = sign_in(&app, "maria.s", "pw").await;

    let listing = get(&app, "/api/v1/users", Some(&operator_cookie)).await;
    assert_eq!(listing.status(), StatusCode::FORBIDDEN);

    let attempt = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "other", "role": "admin", "password": "pw" }),
        Some(&operator_cookie),
    )
    .await;
    assert_eq!(attempt.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn deactivation_blocks_login_and_update_restores_it() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let created = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "user", "password": "pw" }),
        Some(&cookie),
    )
    .await;
    let id = read_json(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let request = test::TestRequest::put()
        .uri(&format!("/api/v1/users/{id}"))
        .set_json(json!({ "name": "Maria", "role": "user", "active": false }))
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let login_attempt = post_json(
        &app,
        "/api/v1/login",
        json!({ "login": "maria.s", "password": "pw" }),
        None,
    )
    .await;
    assert_eq!(login_attempt.status(), StatusCode::UNAUTHORIZED);

    let request = test::TestRequest::put()
        .uri(&format!("/api/v1/users/{id}"))
        .set_json(json!({ "name": "Maria", "role": "supervisor", "active": true }))
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let reactivated = sign_in(&app, "maria.s", "pw").await;
    let session = get(&app, "/api/v1/session", Some(&reactivated)).await;
    let identity = read_json(session).await;
    assert_eq!(identity["role"], "supervisor");
}

#[actix_web::test]
async fn password_reset_swaps_the_working_password() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let created = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "user", "password": "old-pw" }),
        Some(&cookie),
    )
    .await;
    let id = read_json(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let reset = post_json(
        &app,
        &format!("/api/v1/users/{id}/password"),
        json!({ "password": "new-pw" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(reset.status(), StatusCode::NO_CONTENT);

    let old_attempt = post_json(
        &app,
        "/api/v1/login",
        json!({ "login": "maria.s", "password": "old-pw" }),
        None,
    )
    .await;
    assert_eq!(old_attempt.status(), StatusCode::UNAUTHORIZED);

    let _ = sign_in(&app, "maria.s", "new-pw").await;
}

#[actix_web::test]
async fn removal_is_a_hard_delete() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let created = post_json(
        &app,
        "/api/v1/users",
        json!({ "login": "maria.s", "role": "user", "password": "pw" }),
        Some(&cookie),
    )
    .await;
    let id = read_json(created).await["id"]
        .as_str()
        .expect("id")
        .to_owned();

    let request = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{id}"))
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let login_attempt = post_json(
        &app,
        "/api/v1/login",
        json!({ "login": "maria.s", "password": "pw" }),
        None,
    )
    .await;
    assert_eq!(login_attempt.status(), StatusCode::UNAUTHORIZED);

    let request = test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{id}"))
        .cookie(cookie.clone())
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_account_ids_are_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let app = test::init_service(common::test_app(&dir)).await;
    let cookie = bootstrap_and_sign_in(&app).await;

    let id = Uuid::new_v4();
    let reset = post_json(
        &app,
        &format!("/api/v1/users/{id}/password"),
        json!({ "password": "pw" }),
        Some(&cookie),
    )
    .await;
    assert_eq!(reset.status(), StatusCode::NOT_FOUND);
}
