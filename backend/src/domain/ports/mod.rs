//! Domain ports for the hexagonal boundary.
//!
//! Two driven ports cover all storage: the credential store and the
//! append-only record log. Inbound adapters depend on these traits only;
//! the backend (file or PostgreSQL) is chosen once at startup.

mod record_store;
mod user_store;

pub use record_store::{RecordStore, RecordStoreError};
pub use user_store::{UserStore, UserStoreError};
