//! PostgreSQL-backed `UserStore` adapter using Diesel ORM.
//!
//! A thin adapter: translates between Diesel rows and domain types and maps
//! database failures onto the port's error set. Login uniqueness rides on
//! the database's unique index; a duplicate enrolment surfaces as
//! `DuplicateLogin` with no partial row behind.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;
use uuid::Uuid;

use crate::domain::account::{Login, Role, UserAccount};
use crate::domain::auth::LoginCredentials;
use crate::domain::password::PasswordCredential;
use crate::domain::ports::{UserStore, UserStoreError};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{CredentialUpdate, NewUserRow, UserMetadataUpdate, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// PostgreSQL credential store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: DbPool,
}

impl PgUserStore {
    /// Create a new store over the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> Result<
        diesel_async::pooled_connection::bb8::PooledConnection<
            '_,
            diesel_async::AsyncPgConnection,
        >,
        UserStoreError,
    > {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserStoreError::connection))
    }
}

fn map_query_error(error: diesel::result::Error) -> UserStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    if let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) = &error {
        return UserStoreError::DuplicateLogin;
    }
    map_diesel_error(error, UserStoreError::query, UserStoreError::connection)
}

fn parse_role(raw: &str, login: &str) -> Role {
    raw.parse().unwrap_or_else(|_| {
        warn!(value = raw, login, "unrecognised role value, defaulting to user");
        Role::User
    })
}

/// Convert a database row to a domain identity; `None` when the stored login
/// no longer satisfies the domain's constraints.
fn row_to_identity(row: UserRow) -> Option<UserAccount> {
    let role = parse_role(&row.role, &row.login);
    let Ok(login) = Login::new(&row.login) else {
        warn!(login = row.login, "stored login fails validation; row skipped");
        return None;
    };
    let name = if row.name.trim().is_empty() {
        login.as_ref().to_owned()
    } else {
        row.name
    };
    Some(UserAccount {
        id: row.id,
        login,
        name,
        role,
        active: row.active,
        created_at: row.created_at,
    })
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn bootstrap_required(&self) -> Result<bool, UserStoreError> {
        let mut conn = self.conn().await?;
        let admins: i64 = users::table
            .filter(users::role.eq(Role::Admin.as_str()).and(users::active.eq(true)))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(admins == 0)
    }

    async fn create(
        &self,
        account: &UserAccount,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn().await?;
        let row = NewUserRow {
            id: account.id,
            login: account.login.as_ref(),
            name: &account.name,
            role: account.role.as_str(),
            salt_hex: credential.salt_hex(),
            hash_hex: credential.hash_hex(),
            active: account.active,
            created_at: account.created_at,
        };
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        Ok(())
    }

    async fn update(
        &self,
        id: Uuid,
        name: &str,
        role: Role,
        active: bool,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn().await?;
        let changed = diesel::update(users::table.find(id))
            .set(&UserMetadataUpdate {
                name,
                role: role.as_str(),
                active,
            })
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        if changed == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }

    async fn reset_password(
        &self,
        id: Uuid,
        credential: &PasswordCredential,
    ) -> Result<(), UserStoreError> {
        let mut conn = self.conn().await?;
        let changed = diesel::update(users::table.find(id))
            .set(&CredentialUpdate {
                salt_hex: credential.salt_hex(),
                hash_hex: credential.hash_hex(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        if changed == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<(), UserStoreError> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(users::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_query_error)?;
        if deleted == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Option<UserAccount>, UserStoreError> {
        let mut conn = self.conn().await?;
        let row: Option<UserRow> = users::table
            .filter(users::login.eq(credentials.login()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_query_error)?;

        Ok(row
            .filter(|row| row.active)
            .filter(|row| {
                PasswordCredential::from_stored(&row.salt_hex, &row.hash_hex)
                    .verify(credentials.password())
            })
            .and_then(row_to_identity))
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<UserAccount>, UserStoreError> {
        let mut conn = self.conn().await?;
        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .order(users::login.asc())
            .load(&mut conn)
            .await
            .map_err(map_query_error)?;
        // The search box filters a small account list; matching in one place
        // (the domain helper) keeps both backends consistent.
        Ok(rows
            .into_iter()
            .filter_map(row_to_identity)
            .filter(|account| search.is_none_or(|needle| account.matches_search(needle)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    //! Unit coverage for the pure row/error mapping; query execution is
    //! exercised against a live database by deployments.
    use chrono::Utc;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    use super::*;

    fn row(role: &str, login: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            login: login.to_owned(),
            name: String::new(),
            role: role.to_owned(),
            salt_hex: "00".to_owned(),
            hash_hex: "11".to_owned(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn unique_violations_map_to_duplicate_login() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(map_query_error(error), UserStoreError::DuplicateLogin);
    }

    #[test]
    fn unknown_roles_default_to_least_privilege() {
        let identity = row_to_identity(row("superuser", "maria.s")).expect("identity");
        assert_eq!(identity.role, Role::User);
    }

    #[test]
    fn blank_names_fall_back_to_the_login() {
        let identity = row_to_identity(row("supervisor", "chief")).expect("identity");
        assert_eq!(identity.name, "chief");
        assert_eq!(identity.role, Role::Supervisor);
    }

    #[test]
    fn invalid_stored_logins_are_skipped() {
        assert!(row_to_identity(row("user", "not a login!")).is_none());
    }
}
