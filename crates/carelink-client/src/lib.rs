//! # carelink-client
//!
//! Network-facing data layer of the CareLink practice client.
//!
//! - [`executor::RequestExecutor`] - authenticated requests and error
//!   classification
//! - [`collection::SyncCollection`] - paginated, filterable record lists
//! - [`dashboard::DashboardAggregator`] - the summary screen's aggregate
//! - [`auth::AuthService`] - sign-in, sign-out and biometric re-entry
//! - [`client::ClientFactory`] - wires all of the above from a [`ClientConfig`]

pub mod auth;
pub mod client;
pub mod collection;
pub mod config;
pub mod dashboard;
pub mod executor;
pub mod observability;
pub mod resources;
pub mod transport;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::AuthService;
pub use client::{ClientError, ClientFactory};
pub use collection::{CollectionEndpoint, LoadOutcome, PageCursor, Resource, SyncCollection};
pub use config::{ClientConfig, ConfigError};
pub use dashboard::DashboardAggregator;
pub use executor::RequestExecutor;
pub use observability::{apply_logging_level, init_tracing};
pub use transport::ReqwestTransport;
pub use upload::FileUpload;
