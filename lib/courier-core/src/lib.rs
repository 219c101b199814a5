//! Core types for the courier fluent HTTP client.
//!
//! This crate provides the foundational types used by courier:
//! - [`Method`] - HTTP method enum (the five verbs the builder exposes)
//! - [`Request`] and [`RequestBuilder`] - wire-level request types
//! - [`Response`] - response envelope (raw bytes or typed payload)
//! - [`Error`] and [`Result`] - error handling
//! - [`HttpClient`] - the opaque underlying-client trait
//! - [`WithCredentials`] - credentials pass-through extension marker
//! - [`StatusCode`] and [`header`] - re-exported from the `http` crate

mod body;
mod client;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;

pub use body::{from_json, to_json, to_query_string};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder, WithCredentials};
pub use response::Response;

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
