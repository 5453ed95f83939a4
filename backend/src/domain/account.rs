//! User account model: logins, roles, and the identity record.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Validation errors returned by account constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Login was blank after trimming.
    #[error("login must not be empty")]
    EmptyLogin,
    /// Login exceeded the storage cap.
    #[error("login must be at most {max} characters")]
    LoginTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// Login contained characters outside the accepted set.
    #[error("login may only contain letters, numbers, dots, dashes, or underscores")]
    LoginInvalidCharacters,
    /// Role string did not name a known role.
    #[error("unknown role: {value}")]
    UnknownRole {
        /// The rejected input.
        value: String,
    },
}

/// Access level attached to every account.
///
/// The set is closed: storage backends reject anything outside these three
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular operator; may scan but never authorize divergences.
    User,
    /// May authorize divergences.
    Supervisor,
    /// May authorize divergences and manage accounts.
    Admin,
}

impl Role {
    /// Canonical lowercase tag used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Supervisor => "supervisor",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may approve a flagged divergence.
    pub fn can_authorize_divergence(self) -> bool {
        matches!(self, Self::Supervisor | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = AccountValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "supervisor" => Ok(Self::Supervisor),
            "admin" => Ok(Self::Admin),
            other => Err(AccountValidationError::UnknownRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Maximum accepted login length.
pub const LOGIN_MAX: usize = 32;

static LOGIN_RE: OnceLock<Regex> = OnceLock::new();

fn login_regex() -> &'static Regex {
    LOGIN_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        let pattern = "^[A-Za-z0-9._-]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("login regex failed to compile: {error}"))
    })
}

/// Unique operator login.
///
/// ## Invariants
/// - Trimmed, non-empty, at most [`LOGIN_MAX`] characters.
/// - Restricted to letters, digits, dots, dashes, and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Login(String);

impl Login {
    /// Validate and construct a [`Login`] from borrowed input.
    pub fn new(login: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        Self::from_owned(login.as_ref().trim().to_owned())
    }

    fn from_owned(login: String) -> Result<Self, AccountValidationError> {
        if login.is_empty() {
            return Err(AccountValidationError::EmptyLogin);
        }
        if login.chars().count() > LOGIN_MAX {
            return Err(AccountValidationError::LoginTooLong { max: LOGIN_MAX });
        }
        if !login_regex().is_match(&login) {
            return Err(AccountValidationError::LoginInvalidCharacters);
        }
        Ok(Self(login))
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Login> for String {
    fn from(value: Login) -> Self {
        value.0
    }
}

impl TryFrom<String> for Login {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value.trim().to_owned())
    }
}

/// Application user identity.
///
/// Credential material (salt and digest) is not part of this type; it stays
/// behind the `UserStore` port and never reaches adapters that render users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Stable account identifier.
    pub id: Uuid,
    /// Unique login.
    #[schema(value_type = String, example = "maria.s")]
    pub login: Login,
    /// Display name shown on screens; defaults to the login at enrolment.
    pub name: String,
    /// Access level.
    pub role: Role,
    /// Inactive accounts fail authentication without revealing why.
    pub active: bool,
    /// Enrolment timestamp.
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Build a new account record with a fresh identifier.
    ///
    /// A blank `name` falls back to the login, matching the enrolment form's
    /// behaviour.
    pub fn enroll(
        login: Login,
        name: &str,
        role: Role,
        active: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            login.as_ref().to_owned()
        } else {
            trimmed.to_owned()
        };
        Self {
            id: Uuid::new_v4(),
            login,
            name,
            role,
            active,
            created_at,
        }
    }

    /// Case-insensitive match against login or display name, used by the
    /// admin listing's search box.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.login.as_ref().to_lowercase().contains(&needle)
            || self.name.to_lowercase().contains(&needle)
    }
}
