//! Tower middleware for the courier client.
//!
//! Two layers ship with the crate; both are attached automatically by
//! `ApiBuilder::build`, and both can be composed onto a hand-built
//! [`crate::HyperClient`] via [`crate::HyperClientBuilder::layer`]:
//!
//! - [`InterceptLayer`] - applies an interceptor chain (request
//!   interceptors, status-based rejection, fulfilled/rejected folding)
//! - [`LoggingLayer`] - logs requests/responses using `tracing`
//!
//! Layers added through the client builder wrap each other in order: the
//! last layer added is the outermost one (processes requests first).

mod interceptor;
mod logging;

pub use interceptor::{Intercept, InterceptLayer};
pub use logging::{Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
