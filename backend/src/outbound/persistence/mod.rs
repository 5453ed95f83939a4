//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain storage ports backed by PostgreSQL
//! via `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel rows and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are implementation details, never exposed to
//!   the domain layer.
//! - **Runtime schema setup**: `schema_setup` brings an older database to
//!   the expected shape at startup instead of failing on the first write.
//! - **Strongly typed errors**: all database errors are mapped to the ports'
//!   error types.

mod error_mapping;
mod models;
mod pg_record_store;
mod pg_user_store;
mod pool;
mod schema;
mod schema_setup;

pub use pg_record_store::PgRecordStore;
pub use pg_user_store::PgUserStore;
pub use pool::{DbPool, PoolConfig, PoolError};
pub use schema_setup::{SchemaSetupError, ensure_schema};
