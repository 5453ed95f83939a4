//! Backend entry-point: configuration, storage selection, and server start.

use std::env;

use actix_web::cookie::{Key, SameSite};
use actix_web::web;
use color_eyre::eyre::{Result, eyre};
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::server::{AppSettings, ServerConfig, build_http_state, build_storage, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|e| eyre!("failed to load configuration: {e}"))?;

    let key = load_session_key(&settings)?;
    let bind_addr = settings.bind_addr()?;
    let cookie_secure = settings.cookie_secure();

    let storage = build_storage(&settings).await?;
    let records = storage.records.clone();
    let http_state = build_http_state(&storage);

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(
        health_state,
        ServerConfig::new(key, cookie_secure, SameSite::Lax, bind_addr),
        http_state,
    )?;
    server.await?;

    // Final flush so a clean shutdown never leaves buffered entries behind.
    records
        .flush()
        .await
        .map_err(|e| eyre!("final record flush failed: {e}"))?;
    Ok(())
}

/// Read the session key from the configured file, falling back to an
/// ephemeral key in development.
fn load_session_key(settings: &AppSettings) -> Result<Key> {
    let key_path = settings
        .session_key_file
        .clone()
        .unwrap_or_else(|| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path.display(), error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(eyre!(
                    "failed to read session key at {}: {e}",
                    key_path.display()
                ))
            }
        }
    }
}
