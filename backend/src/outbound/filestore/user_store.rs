//! File-backed `UserStore` adapter.
//!
//! Accounts are held in memory and mirrored to `users.json`. Every mutation
//! rewrites the document through a staged rename, so a failed write leaves
//! the previous document intact and no partial account behind.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use cap_std::fs::Dir;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::account::{Login, Role, UserAccount};
use crate::domain::auth::LoginCredentials;
use crate::domain::password::PasswordCredential;
use crate::domain::ports::{UserStore, UserStoreError};

use super::{FileStoreOpenError, replace_file_atomically};

const USERS_FILE: &str = "users.json";

fn default_active() -> bool {
    true
}

/// On-disk account row. Older documents may miss `name` or `active`; serde
/// defaults keep them loadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    id: Uuid,
    login: Login,
    #[serde(default)]
    name: String,
    role: Role,
    salt_hex: String,
    hash_hex: String,
    #[serde(default = "default_active")]
    active: bool,
    created_at: DateTime<Utc>,
}

impl StoredUser {
    fn identity(&self) -> UserAccount {
        UserAccount {
            id: self.id,
            login: self.login.clone(),
            name: if self.name.is_empty() {
                self.login.as_ref().to_owned()
            } else {
                self.name.clone()
            },
            role: self.role,
            active: self.active,
            created_at: self.created_at,
        }
    }

    fn credential(&self) -> PasswordCredential {
        PasswordCredential::from_stored(&self.salt_hex, &self.hash_hex)
    }
}

/// File-backed credential store.
#[derive(Debug)]
pub struct FileUserStore {
    dir: Dir,
    users: Mutex<Vec<StoredUser>>,
}

impl FileUserStore {
    /// Open (or initialise) the store inside `data_dir`.
    ///
    /// A corrupt `users.json` refuses to open rather than risking silent
    /// account loss.
    pub fn open(data_dir: &Path) -> Result<Self, FileStoreOpenError> {
        let dir = super::open_data_dir(data_dir)?;
        let users = if dir.exists(USERS_FILE) {
            let payload =
                dir.read_to_string(USERS_FILE)
                    .map_err(|source| FileStoreOpenError::Read {
                        file: USERS_FILE.to_owned(),
                        source,
                    })?;
            serde_json::from_str(&payload).map_err(|error| FileStoreOpenError::Corrupt {
                file: USERS_FILE.to_owned(),
                detail: error.to_string(),
            })?
        } else {
            Vec::new()
        };
        debug!(accounts = users.len(), "file user store opened");
        Ok(Self {
            dir,
            users: Mutex::new(users),
        })
    }

    fn persist(&self, users: &[StoredUser]) -> Result<(), UserStoreError> {
        let payload = serde_json::to_vec_pretty(users)
            .map_err(|error| UserStoreError::query(error.to_string()))?;
        replace_file_atomically(&self.dir, USERS_FILE, &payload)
            .map_err(|error| UserStoreError::connection(error.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredUser>>, UserStoreError> {
        self.users
            .lock()
            .map_err(|_| UserStoreError::query("user store lock poisoned"))
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn bootstrap_required(&self) -> Result<bool, UserStoreError> {
        let users = self.lock()?;
        Ok(!users
            .iter()
            .any(|user| user.role == Role::Admin && user.active))
    }

    async fn create(
        &self,
        account: &UserAccount,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError> {
        let mut users = self.lock()?;
        if users.iter().any(|user| user.login == account.login) {
            return Err(UserStoreError::DuplicateLogin);
        }
        users.push(StoredUser {
            id: account.id,
            login: account.login.clone(),
            name: account.name.clone(),
            role: account.role,
            salt_hex: credential.salt_hex().to_owned(),
            hash_hex: credential.hash_hex().to_owned(),
            active: account.active,
            created_at: account.created_at,
        });
        if let Err(error) = self.persist(&users) {
            // No partial record: drop the in-memory row on a failed write.
            let _ = users.pop();
            return Err(error);
        }
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        active: bool,
    ) -> Result<(), UserStoreError> {
        let mut users = self.lock()?;
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(UserStoreError::NotFound)?;
        user.name = name.to_owned();
        user.role = role;
        user.active = active;
        self.persist(&users)
    }

    async fn reset_password(
        &self,
        id: Uuid,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError> {
        let mut users = self.lock()?;
        let user = users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(UserStoreError::NotFound)?;
        user.salt_hex = credential.salt_hex().to_owned();
        user.hash_hex = credential.hash_hex().to_owned();
        self.persist(&users)
    }

    async fn remove(&self, id: Uuid) -> Result<(), UserStoreError> {
        let mut users = self.lock()?;
        let before = users.len();
        users.retain(|user| user.id != id);
        if users.len() == before {
            return Err(UserStoreError::NotFound);
        }
        self.persist(&users)
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserAccount>, UserStoreError> {
        let users = self.lock()?;
        Ok(users
            .iter()
            .find(|user| user.login.as_ref() == credentials.login())
            .filter(|user| user.active)
            .filter(|user| user.credential().verify(credentials.password()))
            .map(StoredUser::identity))
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<UserAccount>, UserStoreError> {
        let users = self.lock()?;
        Ok(users
            .iter()
            .map(StoredUser::identity)
            .filter(|account| search.is_none_or(|needle| account.matches_search(needle)))
            .collect())
    }
}
