//! # carelink-core
//!
//! I/O-free building blocks of the CareLink practice client.
//!
//! - [`error`] - the closed [`ApiError`] taxonomy and its status mapping
//! - [`envelope`] - the `{ data, success, message, error }` response wrapper
//! - [`transport`] - the [`Transport`] seam and raw request/response types
//! - [`record`] - the [`Record`] contract every list-backed record satisfies
//! - [`criteria`] / [`projection`] - search, filter and sort of a collection
//! - [`models`] - patients, inquiries, evaluations, appointments, dashboard

pub mod criteria;
pub mod envelope;
pub mod error;
pub mod models;
pub mod projection;
pub mod record;
pub mod transport;

pub use criteria::Criteria;
pub use envelope::{Envelope, Page, Pagination, error_message_from_body};
pub use error::{ApiError, ApiErrorKind, ApiResult, ErrorPresentation};
pub use projection::project;
pub use record::{Record, SortDirection};
pub use transport::{HttpRequest, HttpResponse, Method, RequestBody, Transport, TransportError};
