//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! A thin wrapper around Actix cookie sessions so handlers only deal with
//! domain-friendly operations: persisting the authenticated identity,
//! requiring it (or an admin), and finding the key for the operator's
//! in-memory state.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::account::{Role, UserAccount};
use crate::domain::Error;

pub(crate) const IDENTITY_KEY: &str = "identity";
pub(crate) const STATE_KEY: &str = "state_key";

/// Identity payload held in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct SessionIdentity {
    /// Account identifier.
    pub id: Uuid,
    /// Login used for record attribution.
    pub login: String,
    /// Role, for admin-only endpoints.
    pub role: Role,
}

/// Newtype wrapper exposing higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated identity and mint a fresh state key.
    ///
    /// The state key addresses the operator's in-memory gate and batch; a
    /// new key on every login keeps stale state from a previous session out
    /// of reach.
    pub fn sign_in(&self, account: &UserAccount) -> Result<Uuid, Error> {
        let identity = SessionIdentity {
            id: account.id,
            login: account.login.as_ref().to_owned(),
            role: account.role,
        };
        self.0
            .insert(IDENTITY_KEY, &identity)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        let state_key = Uuid::new_v4();
        self.0
            .insert(STATE_KEY, state_key)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))?;
        Ok(state_key)
    }

    /// Fetch the current identity from the session, if present.
    pub fn identity(&self) -> Result<Option<SessionIdentity>, Error> {
        self.0
            .get::<SessionIdentity>(IDENTITY_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Require an authenticated identity or return `401 Unauthorized`.
    pub fn require_identity(&self) -> Result<SessionIdentity, Error> {
        self.identity()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require an authenticated admin or return `403 Forbidden`.
    pub fn require_admin(&self) -> Result<SessionIdentity, Error> {
        let identity = self.require_identity()?;
        if identity.role != Role::Admin {
            return Err(Error::forbidden("administrator access required"));
        }
        Ok(identity)
    }

    /// Key addressing this session's in-memory operator state.
    pub fn state_key(&self) -> Result<Option<Uuid>, Error> {
        self.0
            .get::<Uuid>(STATE_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// Drop every session value and invalidate the cookie.
    pub fn sign_out(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use chrono::Utc;

    use crate::domain::account::Login;
    use crate::inbound::http::test_utils::test_session_middleware;

    use super::*;

    fn account(role: Role) -> UserAccount {
        UserAccount::enroll(
            Login::new("maria.s").expect("valid login"),
            "Maria",
            role,
            true,
            Utc::now(),
        )
    }

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().wrap(test_session_middleware())
    }

    #[actix_web::test]
    async fn round_trips_the_identity() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let _ = session.sign_in(&account(Role::User))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        let identity = session.require_identity()?;
                        Ok::<_, Error>(HttpResponse::Ok().body(identity.login))
                    }),
                ),
        )
        .await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = set_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        let body = test::read_body(get_res).await;
        assert_eq!(body, "maria.s");
    }

    #[actix_web::test]
    async fn missing_identity_is_unauthorised() {
        let app = test::init_service(session_test_app().route(
            "/require",
            web::get().to(|session: SessionContext| async move {
                let _ = session.require_identity()?;
                Ok::<_, Error>(HttpResponse::Ok())
            }),
        ))
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn non_admins_are_forbidden_from_admin_routes() {
        let app = test::init_service(
            session_test_app()
                .route(
                    "/login-user",
                    web::get().to(|session: SessionContext| async move {
                        let _ = session.sign_in(&account(Role::User))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route(
                    "/admin-only",
                    web::get().to(|session: SessionContext| async move {
                        let _ = session.require_admin()?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                ),
        )
        .await;

        let login_res =
            test::call_service(&app, test::TestRequest::get().uri("/login-user").to_request())
                .await;
        let cookie = login_res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie set");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/admin-only")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
