//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use courier_core::prelude::*;
//! ```

pub use crate::{
    Error, HttpClient, Method, Request, RequestBuilder, Response, Result, WithCredentials,
    from_json, to_json, to_query_string,
};
