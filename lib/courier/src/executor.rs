//! Request execution.
//!
//! A [`RequestExecutor`] is what [`crate::ApiBuilder::build`] produces: a
//! frozen request, a fresh client instance carrying the interceptor chain
//! snapshotted at build time, and a handle to that chain for
//! executor-local additions.

use std::future::Future;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use courier_core::{Error, HttpClient, Request, Response, Result, from_json};

use crate::client::HyperClient;
use crate::registry::InterceptorChain;

/// Executes one configured request through its own client instance.
///
/// Global interceptors present in the registry at build time always run
/// before interceptors added here; neither set is shared with any other
/// executor.
pub struct RequestExecutor {
    request: Request<Bytes>,
    client: HyperClient,
    chain: InterceptorChain,
}

impl RequestExecutor {
    pub(crate) fn new(request: Request<Bytes>, client: HyperClient, chain: InterceptorChain) -> Self {
        Self {
            request,
            client,
            chain,
        }
    }

    /// Read-only view of the frozen request this executor will send.
    #[must_use]
    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    /// Registers a request interceptor on this executor's client only.
    ///
    /// The global registry and other executors are unaffected.
    pub fn set_request_interceptor<F>(&self, interceptor: F)
    where
        F: Fn(Request<Bytes>) -> Result<Request<Bytes>> + Send + Sync + 'static,
    {
        self.chain.push_request(interceptor);
    }

    /// Registers a fulfilled/rejected response-handler pair on this
    /// executor's client only.
    pub fn set_response_interceptor<F, R, Fut>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: Fn(Response<Bytes>) -> Result<Response<Bytes>> + Send + Sync + 'static,
        R: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        self.chain.push_response(on_fulfilled, on_rejected);
    }

    /// Issues the request and decodes the body as JSON into a typed
    /// envelope.
    ///
    /// # Errors
    ///
    /// Fails with whatever the client or an interceptor raised: transport
    /// errors, a non-2xx status not recovered by a rejected-handler, or a
    /// deserialization failure of the settled body.
    pub async fn call<T: DeserializeOwned>(&self) -> Result<Response<T>> {
        let response = self.dispatch().await?;
        let (status, headers, body) = response.into_parts();
        let data = from_json(&body)?;
        Ok(Response::new(status, headers, data))
    }

    /// Issues the request, leaving the settled body as raw bytes.
    ///
    /// # Errors
    ///
    /// Fails with whatever the client or an interceptor raised.
    pub async fn dispatch(&self) -> Result<Response<Bytes>> {
        self.client.execute(self.request.clone()).await
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("request", &self.request)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::ApiBuilder;
    use crate::registry::InterceptorRegistry;

    #[test]
    fn local_interceptors_append_to_the_snapshot() {
        let registry = InterceptorRegistry::new();
        registry.add_request_interceptor(Ok);

        let executor = ApiBuilder::get("/users")
            .base_url("https://api.example.com")
            .registry(&registry)
            .build()
            .expect("build");

        executor.set_request_interceptor(Ok);
        executor.set_response_interceptor(Ok, |error| async move { Err(error) });

        let (request, response) = executor.chain.snapshot();
        assert_eq!(request.len(), 2);
        assert_eq!(response.len(), 1);
    }

    #[test]
    fn executors_do_not_share_chains() {
        let registry = InterceptorRegistry::new();

        let first = ApiBuilder::get("/a")
            .base_url("https://api.example.com")
            .registry(&registry)
            .build()
            .expect("build");
        let second = ApiBuilder::get("/b")
            .base_url("https://api.example.com")
            .registry(&registry)
            .build()
            .expect("build");

        first.set_request_interceptor(Ok);

        assert_eq!(first.chain.snapshot().0.len(), 1);
        assert!(second.chain.snapshot().0.is_empty());
    }
}
