//! Label-validation backend library.
//!
//! Layout follows a hexagonal shape: `domain` holds the core (accounts,
//! policy, override gate, record types, services, ports), `inbound` the HTTP
//! adapter, `outbound` the storage adapters, `server` the wiring.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
