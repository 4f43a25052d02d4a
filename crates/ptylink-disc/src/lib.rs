//! Discovery API support.
//!
//! Maps discovery errors onto HTTP responses and serves the optional
//! metrics endpoint.

pub mod api;
pub mod error;
pub mod metrics;

pub use api::{ApiError, HttpMessage, translate};
pub use error::{DiscError, EntryValidationError, ErrorKind};
pub use metrics::{MetricsError, MetricsSource, router, serve_http_metrics};
