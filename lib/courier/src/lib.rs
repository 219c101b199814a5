//! Fluent HTTP request builder with a process-wide interceptor registry.
//!
//! Register interceptors once at startup, then describe each request with a
//! chain of builder calls. `build()` snapshots the registry onto a fresh
//! client instance; `call()` runs the request through the interceptor chain
//! and resolves to a typed response envelope.
//!
//! # Example
//!
//! ```ignore
//! use courier::{ApiBuilder, InterceptorRegistry};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! // Once, at startup
//! InterceptorRegistry::global().add_request_interceptor(|mut request| {
//!     request.headers_mut().insert("X-Api-Key".into(), "secret".into());
//!     Ok(request)
//! });
//!
//! // Per request
//! let users = ApiBuilder::get("/users")
//!     .base_url("https://api.example.com")
//!     .query("page", "1")
//!     .build()?
//!     .call::<Vec<User>>()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod executor;
pub mod middleware;
pub mod prelude;
mod registry;

// Builder / executor surface
pub use builder::ApiBuilder;
pub use executor::RequestExecutor;

// Interceptor surface
pub use registry::{
    FulfilledHandler, InterceptorChain, InterceptorRegistry, RecoveryFuture, RejectedHandler,
    RequestInterceptor, ResponseInterceptor,
};

// Underlying client
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ClientConfig, ClientConfigBuilder};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use courier_core::{
    Error, HttpClient, Method, Request, RequestBuilder, Response, Result, WithCredentials,
    from_json, to_json, to_query_string,
};

// Re-export http types for status codes and headers
pub use courier_core::{StatusCode, header};

// Re-export url for request inspection
pub use url;
