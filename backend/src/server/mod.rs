//! Server construction: storage selection, middleware, and route wiring.

pub mod config;

pub use config::{AppSettings, ConfigError, StorageBackend};

use std::sync::Arc;

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;

#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::{RecordStore, UserStore};
use crate::domain::{AccountService, ScanService};
use crate::inbound::http::export::{export_records, preview_export};
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::scans::{
    cancel_override, flush_records, list_batch, reset_batch, submit_override, submit_scan,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{
    bootstrap_admin, bootstrap_status, create_user, current_session, list_users, login, logout,
    remove_user, reset_user_password, update_user,
};
use crate::middleware::Trace;
use crate::outbound::filestore::{FileRecordStore, FileStoreOpenError, FileUserStore};
use crate::outbound::persistence::{
    DbPool, PgRecordStore, PgUserStore, PoolConfig, PoolError, SchemaSetupError, ensure_schema,
};

/// Errors raised while wiring the selected storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageSetupError {
    /// Configuration did not resolve.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The file backend refused to open.
    #[error(transparent)]
    File(#[from] FileStoreOpenError),
    /// The PostgreSQL pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// The PostgreSQL schema could not be prepared.
    #[error(transparent)]
    Schema(#[from] SchemaSetupError),
}

/// Storage handles behind the domain ports.
#[derive(Clone)]
pub struct Storage {
    /// Credential store port.
    pub users: Arc<dyn UserStore>,
    /// Record log port.
    pub records: Arc<dyn RecordStore>,
}

/// Build the storage backend selected by configuration.
pub async fn build_storage(settings: &AppSettings) -> Result<Storage, StorageSetupError> {
    match settings.storage_backend()? {
        StorageBackend::File => {
            let data_dir = settings.data_dir();
            info!(data_dir = %data_dir.display(), "using file storage backend");
            let users = FileUserStore::open(&data_dir)?;
            let records =
                FileRecordStore::open_with_flush_every(&data_dir, settings.flush_every())?;
            Ok(Storage {
                users: Arc::new(users),
                records: Arc::new(records),
            })
        }
        StorageBackend::Postgres => {
            let url = settings.require_database_url()?;
            info!("using PostgreSQL storage backend");
            let pool = DbPool::new(PoolConfig::new(url)).await?;
            ensure_schema(&pool).await?;
            Ok(Storage {
                users: Arc::new(PgUserStore::new(pool.clone())),
                records: Arc::new(PgRecordStore::new(pool)),
            })
        }
    }
}

/// Build the HTTP state bundle over the selected storage.
pub fn build_http_state(storage: &Storage) -> web::Data<HttpState> {
    let clock = Arc::new(DefaultClock);
    let accounts = AccountService::new(storage.users.clone(), clock.clone());
    let scans = ScanService::new(storage.records.clone(), storage.users.clone(), clock);
    web::Data::new(HttpState::new(accounts, scans, storage.records.clone()))
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: std::net::SocketAddr,
}

impl ServerConfig {
    /// Construct a server configuration using application preferences.
    #[must_use]
    pub fn new(
        key: Key,
        cookie_secure: bool,
        same_site: SameSite,
        bind_addr: std::net::SocketAddr,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
        }
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        key,
        cookie_secure,
        same_site,
    } = deps;

    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default().session_ttl(actix_web::cookie::time::Duration::hours(2)),
        )
        .build();

    let api = web::scope("/api/v1")
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
        .service(preview_export);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(api)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server over the prepared state.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
    http_state: web::Data<HttpState>,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
