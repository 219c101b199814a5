//! The underlying-client seam.
//!
//! Everything above this trait treats the HTTP client as an opaque
//! dependency: the builder produces a [`crate::Request`], an implementation
//! of [`HttpClient`] turns it into a [`crate::Response`], and nothing else
//! is assumed. Implement it directly for custom transports or mocks.

use std::future::Future;

use bytes::Bytes;

use crate::{Request, Response, Result};

/// An HTTP client able to execute a single buffered request.
///
/// # Example
///
/// ```ignore
/// use courier_core::{HttpClient, Request, Response, Result};
/// use bytes::Bytes;
///
/// #[derive(Clone)]
/// struct StaticClient;
///
/// impl HttpClient for StaticClient {
///     async fn execute(&self, _request: Request<Bytes>) -> Result<Response<Bytes>> {
///         Ok(Response::new(204, Default::default(), Bytes::new()))
///     }
/// }
/// ```
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Invalid response
    fn execute(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Bytes>>> + Send;
}
