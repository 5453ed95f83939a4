//! Internal Diesel row structs for database operations.
//!
//! Implementation details of the persistence layer; never exposed to the
//! domain. They exist solely to satisfy Diesel's type requirements for
//! queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{records, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub role: String,
    pub salt_hex: String,
    pub hash_hex: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for enrolling an account.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub login: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub salt_hex: &'a str,
    pub hash_hex: &'a str,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Changeset for metadata updates; credentials are untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserMetadataUpdate<'a> {
    pub name: &'a str,
    pub role: &'a str,
    pub active: bool,
}

/// Changeset for password resets.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct CredentialUpdate<'a> {
    pub salt_hex: &'a str,
    pub hash_hex: &'a str,
}

/// Row struct for reading from the records table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = records)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecordRow {
    #[expect(dead_code, reason = "surrogate key; ordering uses recorded_at")]
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    pub operator: String,
    pub context: String,
    pub transport: String,
    pub order_code: String,
    pub divergent: bool,
    pub authorized_by: String,
    pub reason: String,
}

/// Insertable struct for appending a log entry.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = records)]
pub(crate) struct NewRecordRow<'a> {
    pub recorded_at: DateTime<Utc>,
    pub operator: &'a str,
    pub context: &'a str,
    pub transport: &'a str,
    pub order_code: &'a str,
    pub divergent: bool,
    pub authorized_by: &'a str,
    pub reason: &'a str,
}
