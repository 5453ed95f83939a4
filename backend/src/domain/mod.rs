//! Domain primitives, aggregates, services, and ports.
//!
//! Purpose: define the strongly typed core of the label-validation system —
//! accounts and credentials, sanitized scan codes, the divergence policy, the
//! override gate, the record log types, and the use-case services that
//! orchestrate them. Types are immutable where possible; invariants and
//! serialisation contracts live in each type's Rustdoc.

pub mod account;
pub mod account_service;
pub mod auth;
pub mod batch;
pub mod error;
pub mod override_gate;
pub mod password;
pub mod policy;
pub mod ports;
pub mod record;
pub mod scan;
pub mod scan_service;
pub mod trace_id;

pub use self::account::{AccountValidationError, Login, Role, UserAccount};
pub use self::account_service::AccountService;
pub use self::auth::{CredentialsValidationError, LoginCredentials};
pub use self::batch::{BatchItem, BatchTracker};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::override_gate::{OverrideGate, OverrideGateError, PendingDivergence};
pub use self::password::PasswordCredential;
pub use self::policy::{DivergenceReason, Verdict, evaluate};
pub use self::record::{RecordEntry, RecordQuery, RecordValidationError};
pub use self::scan::{CODE_MAX_LEN, ScanCode, ScreenContext};
pub use self::scan_service::{OperatorSession, ScanOutcome, ScanService};
pub use self::trace_id::TraceId;

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
