//! Interceptor chain middleware.
//!
//! [`InterceptLayer`] attaches an [`InterceptorChain`] to a client. On every
//! call the service takes a point-in-time snapshot of the chain and runs the
//! promise-chain protocol:
//!
//! 1. request interceptors, in registration order, each receiving and
//!    returning a (possibly modified) request; an `Err` skips dispatch;
//! 2. dispatch through the inner service, with a non-2xx response converted
//!    into [`Error::Http`] (the rejection convention callers expect);
//! 3. response handlers, in registration order, folded over the settled
//!    outcome: `on_fulfilled` transforms an `Ok`, `on_rejected` may recover
//!    an `Err` into an `Ok` or re-signal it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tower::{Layer, Service};

use courier_core::{Error, Request, Response, Result, StatusCode};

use crate::registry::{InterceptorChain, RequestInterceptor, ResponseInterceptor};

/// Layer that applies an interceptor chain around the wrapped client.
#[derive(Debug, Clone, Default)]
pub struct InterceptLayer {
    chain: InterceptorChain,
}

impl InterceptLayer {
    /// Creates a layer applying the given chain.
    #[must_use]
    pub fn new(chain: InterceptorChain) -> Self {
        Self { chain }
    }
}

impl<S> Layer<S> for InterceptLayer {
    type Service = Intercept<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Intercept {
            inner,
            chain: self.chain.clone(),
        }
    }
}

/// Service that runs the interceptor chain around each request.
#[derive(Debug, Clone)]
pub struct Intercept<S> {
    inner: S,
    chain: InterceptorChain,
}

impl<S> Service<Request<Bytes>> for Intercept<S>
where
    S: Service<Request<Bytes>, Response = Response<Bytes>, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Bytes>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Bytes>) -> Self::Future {
        let (request_interceptors, response_interceptors) = self.chain.snapshot();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut outcome = match apply_request(request, &request_interceptors) {
                Ok(request) => match inner.call(request).await {
                    Ok(response) => reject_on_status(response),
                    Err(error) => Err(error),
                },
                Err(error) => Err(error),
            };

            for interceptor in &response_interceptors {
                outcome = settle(outcome, interceptor).await;
            }

            outcome
        })
    }
}

fn apply_request(
    mut request: Request<Bytes>,
    interceptors: &[RequestInterceptor],
) -> Result<Request<Bytes>> {
    for interceptor in interceptors {
        request = interceptor(request)?;
    }
    Ok(request)
}

async fn settle(
    outcome: Result<Response<Bytes>>,
    interceptor: &ResponseInterceptor,
) -> Result<Response<Bytes>> {
    match outcome {
        Ok(response) => (interceptor.on_fulfilled)(response),
        Err(error) => (interceptor.on_rejected)(error).await,
    }
}

/// Non-2xx statuses settle as [`Error::Http`] so rejected-handlers see them.
fn reject_on_status(response: Response<Bytes>) -> Result<Response<Bytes>> {
    if response.is_success() {
        return Ok(response);
    }

    let status = response.status();
    let message = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("HTTP error");
    let (_, _, body) = response.into_parts();

    Err(Error::http_with_body(status, message, body))
}
