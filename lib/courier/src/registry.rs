//! Interceptor registration.
//!
//! [`InterceptorRegistry`] is the process-wide holder of interceptors that
//! every executor picks up at build time. [`InterceptorChain`] is the
//! per-executor copy those interceptors are snapshotted into; an executor
//! and its client's [`crate::middleware::InterceptLayer`] share one chain,
//! and no two executors ever share one.
//!
//! # Example
//!
//! ```ignore
//! use courier::InterceptorRegistry;
//!
//! let registry = InterceptorRegistry::global();
//! registry.add_request_interceptor(|mut request| {
//!     request.headers_mut().insert("X-Api-Key".into(), "secret".into());
//!     Ok(request)
//! });
//! registry.add_response_interceptor(Ok, |error| async move { Err(error) });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use bytes::Bytes;
use courier_core::{Error, Request, Response, Result};

/// Future returned by a rejected-handler: the recovered response, or the
/// error to keep propagating.
pub type RecoveryFuture = Pin<Box<dyn Future<Output = Result<Response<Bytes>>> + Send>>;

/// A request interceptor: receives the outgoing request and returns it,
/// possibly modified. Returning `Err` skips dispatch and enters the
/// rejection path.
pub type RequestInterceptor = Arc<dyn Fn(Request<Bytes>) -> Result<Request<Bytes>> + Send + Sync>;

/// Fulfilled half of a response interceptor: transforms a settled response.
pub type FulfilledHandler = Arc<dyn Fn(Response<Bytes>) -> Result<Response<Bytes>> + Send + Sync>;

/// Rejected half of a response interceptor: observes an error and may
/// recover asynchronously (token refresh, substitute response) or re-signal.
pub type RejectedHandler = Arc<dyn Fn(Error) -> RecoveryFuture + Send + Sync>;

/// A fulfilled/rejected handler pair, applied to the settled outcome of a
/// call in registration order.
#[derive(Clone)]
pub struct ResponseInterceptor {
    pub(crate) on_fulfilled: FulfilledHandler,
    pub(crate) on_rejected: RejectedHandler,
}

impl std::fmt::Debug for ResponseInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseInterceptor").finish_non_exhaustive()
    }
}

fn wrap_rejected<R, Fut>(on_rejected: R) -> RejectedHandler
where
    R: Fn(Error) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
{
    Arc::new(move |error| -> RecoveryFuture { Box::pin(on_rejected(error)) })
}

// ============================================================================
// Registry
// ============================================================================

static GLOBAL: OnceLock<InterceptorRegistry> = OnceLock::new();

/// Ordered lists of globally applied interceptors.
///
/// The registry is a cheap-clone handle: clones share the same mutex-guarded
/// lists, so a clone of [`InterceptorRegistry::global`] still registers
/// globally. Use [`InterceptorRegistry::new`] for an independent instance to
/// inject into a builder, which keeps the snapshot-at-build dependency
/// visible in tests.
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    request: Arc<Mutex<Vec<RequestInterceptor>>>,
    response: Arc<Mutex<Vec<ResponseInterceptor>>>,
}

impl InterceptorRegistry {
    /// Creates an empty, independent registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first access.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Appends a request interceptor.
    ///
    /// Duplicates are permitted and the interceptor's behavior is not
    /// inspected; registration order is the execution order.
    pub fn add_request_interceptor<F>(&self, interceptor: F)
    where
        F: Fn(Request<Bytes>) -> Result<Request<Bytes>> + Send + Sync + 'static,
    {
        self.lock_request().push(Arc::new(interceptor));
    }

    /// Appends a fulfilled/rejected response-handler pair.
    ///
    /// `on_rejected` either recovers (returns `Ok` with a substitute
    /// response) or re-signals by returning the error; the registry does not
    /// inspect which.
    pub fn add_response_interceptor<F, R, Fut>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: Fn(Response<Bytes>) -> Result<Response<Bytes>> + Send + Sync + 'static,
        R: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        self.lock_response().push(ResponseInterceptor {
            on_fulfilled: Arc::new(on_fulfilled),
            on_rejected: wrap_rejected(on_rejected),
        });
    }

    /// The registered request interceptors, in registration order.
    ///
    /// Returns a defensive copy; mutating the returned list does not touch
    /// the registry.
    #[must_use]
    pub fn request_interceptors(&self) -> Vec<RequestInterceptor> {
        self.lock_request().clone()
    }

    /// The registered response-handler pairs, in registration order.
    ///
    /// Returns a defensive copy; mutating the returned list does not touch
    /// the registry.
    #[must_use]
    pub fn response_interceptors(&self) -> Vec<ResponseInterceptor> {
        self.lock_response().clone()
    }

    /// Empties both lists. The registry instance survives, and executors
    /// built earlier keep their own snapshots.
    pub fn clear(&self) {
        self.lock_request().clear();
        self.lock_response().clear();
    }

    /// A fresh [`InterceptorChain`] seeded with the current contents, in
    /// registration order. Later registry mutations are invisible to it.
    #[must_use]
    pub fn snapshot(&self) -> InterceptorChain {
        InterceptorChain::seeded(self.request_interceptors(), self.response_interceptors())
    }

    fn lock_request(&self) -> MutexGuard<'_, Vec<RequestInterceptor>> {
        self.request
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_response(&self) -> MutexGuard<'_, Vec<ResponseInterceptor>> {
        self.response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorRegistry")
            .field("request_interceptors", &self.lock_request().len())
            .field("response_interceptors", &self.lock_response().len())
            .finish()
    }
}

// ============================================================================
// Chain
// ============================================================================

/// The interceptor chain attached to one executor's client instance.
///
/// Clones are handles onto the same chain: the executor keeps one to accept
/// post-build additions via `set_request_interceptor` /
/// `set_response_interceptor`, while the client's
/// [`crate::middleware::InterceptLayer`] keeps another to apply the chain on
/// every call.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    inner: Arc<Mutex<ChainInner>>,
}

#[derive(Default)]
struct ChainInner {
    request: Vec<RequestInterceptor>,
    response: Vec<ResponseInterceptor>,
}

impl InterceptorChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seeded(
        request: Vec<RequestInterceptor>,
        response: Vec<ResponseInterceptor>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChainInner { request, response })),
        }
    }

    /// Appends a request interceptor to this chain only.
    pub fn push_request<F>(&self, interceptor: F)
    where
        F: Fn(Request<Bytes>) -> Result<Request<Bytes>> + Send + Sync + 'static,
    {
        self.lock().request.push(Arc::new(interceptor));
    }

    /// Appends a fulfilled/rejected response-handler pair to this chain only.
    pub fn push_response<F, R, Fut>(&self, on_fulfilled: F, on_rejected: R)
    where
        F: Fn(Response<Bytes>) -> Result<Response<Bytes>> + Send + Sync + 'static,
        R: Fn(Error) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<Bytes>>> + Send + 'static,
    {
        self.lock().response.push(ResponseInterceptor {
            on_fulfilled: Arc::new(on_fulfilled),
            on_rejected: wrap_rejected(on_rejected),
        });
    }

    /// Point-in-time copy of both lists, used once per call.
    pub(crate) fn snapshot(&self) -> (Vec<RequestInterceptor>, Vec<ResponseInterceptor>) {
        let inner = self.lock();
        (inner.request.clone(), inner.response.clone())
    }

    fn lock(&self) -> MutexGuard<'_, ChainInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("InterceptorChain")
            .field("request_interceptors", &inner.request.len())
            .field("response_interceptors", &inner.response.len())
            .finish()
    }
}
