//! Account management use-cases over the credential store port.
//!
//! Enforces the bootstrap invariant: until an active admin exists the only
//! permitted operation is creating that first admin, and every other caller
//! is turned away with a plain-language conflict.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::account::{Login, Role, UserAccount};
use crate::domain::auth::LoginCredentials;
use crate::domain::password::PasswordCredential;
use crate::domain::ports::{UserStore, UserStoreError};
use crate::domain::Error;
use uuid::Uuid;

/// Map credential store failures to domain errors.
fn map_store_error(error: UserStoreError) -> Error {
    match error {
        UserStoreError::DuplicateLogin => Error::conflict("login already exists"),
        UserStoreError::NotFound => Error::not_found("no such account"),
        UserStoreError::Connection { message } => Error::service_unavailable(message),
        UserStoreError::Query { message } => Error::internal(message),
    }
}

/// Account management service.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a service over the given store and clock.
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Whether the first-run admin still needs to be created.
    pub async fn bootstrap_required(&self) -> Result<bool, Error> {
        self.store.bootstrap_required().await.map_err(map_store_error)
    }

    /// Refuse the call while the first admin is missing.
    pub async fn ensure_ready(&self) -> Result<(), Error> {
        if self.bootstrap_required().await? {
            return Err(Error::conflict(
                "create the first administrator before using the system",
            ));
        }
        Ok(())
    }

    /// Create the first administrator. Refused once any active admin exists.
    pub async fn bootstrap_admin(
        &self,
        login: &str,
        name: &str,
        password: &str,
    ) -> Result<UserAccount, Error> {
        if !self.bootstrap_required().await? {
            return Err(Error::conflict("an administrator already exists"));
        }
        self.enroll(login, name, Role::Admin, password, true).await
    }

    /// Enroll a new account (admin-only; the caller checks the session role).
    pub async fn create_account(
        &self,
        login: &str,
        name: &str,
        role: Role,
        password: &str,
        active: bool,
    ) -> Result<UserAccount, Error> {
        self.ensure_ready().await?;
        self.enroll(login, name, role, password, active).await
    }

    async fn enroll(
        &self,
        login: &str,
        name: &str,
        role: Role,
        password: &str,
        active: bool,
    ) -> Result<UserAccount, Error> {
        let login = Login::new(login).map_err(|err| Error::invalid_request(err.to_string()))?;
        if password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let account = UserAccount::enroll(login, name, role, active, self.clock.utc());
        let credential = PasswordCredential::derive(password);
        self.store
            .create(&account, &credential)
            .await
            .map_err(map_store_error)?;
        Ok(account)
    }

    /// Mutate account metadata; credentials are untouched.
    pub async fn update_account(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        active: bool,
    ) -> Result<(), Error> {
        self.store
            .update(id, name.trim(), role, active)
            .await
            .map_err(map_store_error)
    }

    /// Regenerate the salt and digest for an account.
    ///
    /// The old password stops working as soon as this returns.
    pub async fn reset_password(&self, id: Uuid, new_password: &str) -> Result<(), Error> {
        if new_password.is_empty() {
            return Err(Error::invalid_request("password must not be empty"));
        }
        let credential = PasswordCredential::derive(new_password);
        self.store
            .reset_password(id, &credential)
            .await
            .map_err(map_store_error)
    }

    /// Hard delete an account.
    pub async fn remove_account(&self, id: Uuid) -> Result<(), Error> {
        self.store.remove(id).await.map_err(map_store_error)
    }

    /// Verify credentials and return the identity.
    ///
    /// The caller cannot distinguish unknown login, wrong password, or an
    /// inactive account: all three surface as the same unauthorized error.
    pub async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserAccount, Error> {
        self.ensure_ready().await?;
        let identity = self
            .store
            .authenticate(credentials)
            .await
            .map_err(map_store_error)?;
        identity.ok_or_else(|| Error::unauthorized("invalid login or password, or inactive account"))
    }

    /// List accounts for the admin screen, filtered by the search box.
    pub async fn list_accounts(&self, search: Option<&str>) -> Result<Vec<UserAccount>, Error> {
        self.store.list(search).await.map_err(map_store_error)
    }
}
