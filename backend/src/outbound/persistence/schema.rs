//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match what `schema_setup` creates at startup. They
//! are used by Diesel for compile-time query validation and type-safe SQL
//! generation.

diesel::table! {
    /// User accounts with credential material.
    ///
    /// `login` carries a unique index; duplicate enrolments are rejected by
    /// the database, not by application-level checks.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Unique operator login.
        login -> Varchar,
        /// Display name; empty means "use the login".
        name -> Varchar,
        /// One of `user`, `supervisor`, `admin`.
        role -> Varchar,
        /// Hex-encoded random salt.
        salt_hex -> Varchar,
        /// Hex-encoded SHA-256 of salt‖password.
        hash_hex -> Varchar,
        /// Inactive accounts fail authentication.
        active -> Bool,
        /// Enrolment timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only record log.
    ///
    /// `(context, transport, order_code)` carries a lookup index for
    /// duplicate detection. `authorized_by` and `reason` are empty strings
    /// on non-divergent rows.
    records (id) {
        /// Surrogate key; insertion order only.
        id -> Int8,
        /// When the attempt was resolved.
        recorded_at -> Timestamptz,
        /// Login of the scanning operator.
        operator -> Varchar,
        /// Screen context tag (`LEITURA` or `VARIOS`).
        context -> Varchar,
        /// First scanned code.
        transport -> Varchar,
        /// Second scanned code. `order` is reserved in SQL, hence the name.
        order_code -> Varchar,
        /// Whether the row went through the override path.
        divergent -> Bool,
        /// Authorizing login, empty when not divergent.
        authorized_by -> Varchar,
        /// Divergence reason, empty when not divergent.
        reason -> Varchar,
    }
}
