//! Idempotent schema setup and migration for the PostgreSQL backend.
//!
//! Runs once at startup: creates the two tables when absent, then adds any
//! column a newer release introduced with a safe default, so the service can
//! be pointed at data written by an older schema without losing rows. A
//! database that cannot be brought to the expected shape fails startup
//! before any write is attempted.

use diesel_async::RunQueryDsl;
use tracing::info;

use super::pool::DbPool;

/// Errors raised while preparing the schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaSetupError {
    /// No connection could be established.
    #[error("schema setup could not connect: {message}")]
    Connection {
        /// Pool-supplied detail.
        message: String,
    },
    /// A setup statement was rejected.
    #[error("schema setup statement failed: {message}")]
    Statement {
        /// Database-supplied detail.
        message: String,
    },
}

const SETUP_STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        login VARCHAR NOT NULL,
        name VARCHAR NOT NULL DEFAULT '',
        role VARCHAR NOT NULL CHECK (role IN ('user', 'supervisor', 'admin')),
        salt_hex VARCHAR NOT NULL,
        hash_hex VARCHAR NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )",
    "CREATE TABLE IF NOT EXISTS records (
        id BIGSERIAL PRIMARY KEY,
        recorded_at TIMESTAMPTZ NOT NULL,
        operator VARCHAR NOT NULL,
        context VARCHAR NOT NULL,
        transport VARCHAR NOT NULL,
        order_code VARCHAR NOT NULL,
        divergent BOOLEAN NOT NULL DEFAULT FALSE,
        authorized_by VARCHAR NOT NULL DEFAULT '',
        reason VARCHAR NOT NULL DEFAULT ''
    )",
    // Columns introduced after the first release; older databases gain them
    // here with defaults that preserve existing rows.
    "ALTER TABLE users ADD COLUMN IF NOT EXISTS name VARCHAR NOT NULL DEFAULT ''",
    "ALTER TABLE users ADD COLUMN IF NOT EXISTS active BOOLEAN NOT NULL DEFAULT TRUE",
    "ALTER TABLE records ADD COLUMN IF NOT EXISTS divergent BOOLEAN NOT NULL DEFAULT FALSE",
    "ALTER TABLE records ADD COLUMN IF NOT EXISTS authorized_by VARCHAR NOT NULL DEFAULT ''",
    "ALTER TABLE records ADD COLUMN IF NOT EXISTS reason VARCHAR NOT NULL DEFAULT ''",
    "CREATE UNIQUE INDEX IF NOT EXISTS users_login_key ON users (login)",
    "CREATE INDEX IF NOT EXISTS records_triple_idx ON records (context, transport, order_code)",
];

/// Bring the database to the expected shape.
pub async fn ensure_schema(pool: &DbPool) -> Result<(), SchemaSetupError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|err| SchemaSetupError::Connection {
            message: err.to_string(),
        })?;

    for statement in SETUP_STATEMENTS {
        diesel::sql_query(*statement)
            .execute(&mut conn)
            .await
            .map_err(|err| SchemaSetupError::Statement {
                message: err.to_string(),
            })?;
    }

    info!("database schema is up to date");
    Ok(())
}
