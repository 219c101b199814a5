//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    ApiBuilder, ClientConfig, Error, HttpClient, HyperClient, InterceptorRegistry, Method, Request,
    RequestBuilder, RequestExecutor, Response, Result, StatusCode, WithCredentials, from_json,
    header, to_json,
};
pub use serde::{Deserialize, Serialize};
