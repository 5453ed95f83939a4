//! Port abstraction for the credential store.
//!
//! In hexagonal terms this is a *driven* port: the account service and the
//! override path talk to it without knowing which backend was selected at
//! startup. Login uniqueness is a storage-layer guarantee — adapters must
//! reject a duplicate atomically, not rely on the caller checking first.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::account::{Role, UserAccount};
use crate::domain::auth::LoginCredentials;
use crate::domain::password::PasswordCredential;

/// Errors raised by credential store adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserStoreError {
    /// The login is already taken; no partial record is left behind.
    #[error("login already exists")]
    DuplicateLogin,
    /// No account with the given identifier.
    #[error("no such account")]
    NotFound,
    /// Backend connection could not be established or timed out.
    #[error("user store connection failed: {message}")]
    Connection {
        /// Backend-supplied detail.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user store query failed: {message}")]
    Query {
        /// Backend-supplied detail.
        message: String,
    },
}

impl UserStoreError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Credential store port.
///
/// `authenticate` is deliberately coarse: callers receive the identity or
/// `None`, with no distinction between unknown login, wrong password, and an
/// inactive account.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// True iff no active admin exists yet.
    async fn bootstrap_required(&self) -> Result<bool, UserStoreError>;

    /// Persist a new account with its credential material.
    ///
    /// Fails with [`UserStoreError::DuplicateLogin`] when the login is taken.
    async fn create(
        &self,
        account: &UserAccount,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError>;

    /// Mutate account metadata; credentials are untouched.
    async fn update(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        active: bool,
    ) -> Result<(), UserStoreError>;

    /// Replace the salt and digest for an account.
    async fn reset_password(
        &self,
        id: Uuid,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError>;

    /// Hard delete.
    async fn remove(&self, id: Uuid) -> Result<(), UserStoreError>;

    /// Verify credentials and return the identity on success.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserAccount>, UserStoreError>;

    /// List accounts, optionally filtered by a login/name substring.
    async fn list(&self, search: Option<&str>) -> Result<Vec<UserAccount>, UserStoreError>;
}
