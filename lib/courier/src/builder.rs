//! Fluent request construction.
//!
//! [`ApiBuilder`] accumulates a request description through chained calls
//! and finalizes it with [`ApiBuilder::build`] into a
//! [`RequestExecutor`]. Building consumes the builder, so the description
//! is frozen from that point on.
//!
//! # Example
//!
//! ```ignore
//! use courier::ApiBuilder;
//!
//! let executor = ApiBuilder::get("/users")
//!     .base_url("https://api.example.com")
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build()?;
//!
//! let users: courier::Response<Vec<User>> = executor.call().await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use courier_core::{Error, Method, Request, Result, WithCredentials, to_json, to_query_string};

use crate::client::HyperClient;
use crate::executor::RequestExecutor;
use crate::middleware::InterceptLayer;
use crate::registry::InterceptorRegistry;

/// Chainable builder for one HTTP request.
///
/// Entry points set the method and target URL; `put` and `post` also take
/// the JSON body. Every chain method returns the builder for further
/// chaining, and scalar setters keep the last value when called repeatedly.
#[derive(Debug)]
pub struct ApiBuilder {
    method: Method,
    url: String,
    headers: HashMap<String, String>,
    params: Vec<(String, String)>,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    with_credentials: Option<bool>,
    base_url: Option<String>,
    registry: InterceptorRegistry,
    // First error hit while chaining (body serialization); surfaced by build()
    deferred: Option<Error>,
}

impl ApiBuilder {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            params: Vec::new(),
            body: None,
            timeout: None,
            with_credentials: None,
            base_url: None,
            registry: InterceptorRegistry::global().clone(),
            deferred: None,
        }
    }

    /// Starts a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Starts a POST request carrying `data` as a JSON body.
    #[must_use]
    pub fn post<T: serde::Serialize>(url: impl Into<String>, data: &T) -> Self {
        Self::new(Method::Post, url).json(data)
    }

    /// Starts a PUT request carrying `data` as a JSON body.
    #[must_use]
    pub fn put<T: serde::Serialize>(url: impl Into<String>, data: &T) -> Self {
        Self::new(Method::Put, url).json(data)
    }

    /// Starts a PATCH request.
    #[must_use]
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::Patch, url)
    }

    /// Starts a DELETE request.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url)
    }

    /// Sets a single header; overwrites an existing value for the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Merges headers into the set accumulated so far.
    ///
    /// New names are added and existing names overwritten; the headers
    /// configured by earlier calls are never dropped wholesale.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Appends one query parameter.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Appends multiple query parameters.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.params.extend(params);
        self
    }

    /// Appends query parameters serialized from `params`.
    ///
    /// `Vec<T>` fields become repeated parameters (`tags=a&tags=b`).
    #[must_use]
    pub fn params_from<T: serde::Serialize>(mut self, params: &T) -> Self {
        match to_query_string(params) {
            Ok(query) => {
                self.params
                    .extend(url::form_urlencoded::parse(query.as_bytes()).into_owned());
            }
            Err(err) => {
                self.deferred.get_or_insert(err);
            }
        }
        self
    }

    /// Replaces the body with `data` serialized as JSON, setting the
    /// matching `Content-Type` header.
    #[must_use]
    pub fn json<T: serde::Serialize>(mut self, data: &T) -> Self {
        match to_json(data) {
            Ok(body) => {
                self.body = Some(body);
                self.headers
                    .insert("Content-Type".to_string(), "application/json".to_string());
            }
            Err(err) => {
                self.deferred.get_or_insert(err);
            }
        }
        self
    }

    /// Sets the request timeout, passed through to the underlying client.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the credentials flag, carried on the request extensions.
    #[must_use]
    pub fn with_credentials(mut self, value: bool) -> Self {
        self.with_credentials = Some(value);
        self
    }

    /// Sets the base URL that a relative target URL is resolved against.
    #[must_use]
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = Some(value.into());
        self
    }

    /// Uses `registry` instead of the process-wide one.
    ///
    /// The builder keeps a handle; the snapshot still happens at
    /// [`ApiBuilder::build`] time.
    #[must_use]
    pub fn registry(mut self, registry: &InterceptorRegistry) -> Self {
        self.registry = registry.clone();
        self
    }

    /// Finalizes the description into a [`RequestExecutor`].
    ///
    /// Consuming the builder freezes the description. The registry's
    /// current interceptors are snapshotted onto a fresh client instance
    /// here; interceptors registered afterwards are invisible to the
    /// returned executor.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be resolved (a relative target
    /// without a base URL, or an unparsable URL) or if a body failed to
    /// serialize earlier in the chain.
    pub fn build(self) -> Result<RequestExecutor> {
        if let Some(err) = self.deferred {
            return Err(err);
        }

        let url = resolve_url(&self.url, self.base_url.as_deref())?;

        let mut wire = Request::<Bytes>::builder(self.method, url)
            .headers(self.headers)
            .query_pairs(self.params);
        if let Some(flag) = self.with_credentials {
            wire = wire.extension(WithCredentials(flag));
        }
        if let Some(body) = self.body {
            wire = wire.body(body);
        }
        let request = wire.build();

        let chain = self.registry.snapshot();

        let mut client_builder = HyperClient::builder();
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }
        // Logging sits between the chain and the transport, so it observes
        // the request the interceptors actually produced.
        let client = client_builder
            .with_logging()
            .layer(InterceptLayer::new(chain.clone()))
            .build();

        Ok(RequestExecutor::new(request, client, chain))
    }
}

/// An absolute target URL wins; a relative one requires a base to join.
fn resolve_url(target: &str, base: Option<&str>) -> Result<Url> {
    if let Ok(absolute) = Url::parse(target) {
        return Ok(absolute);
    }

    let Some(base) = base else {
        return Err(Error::invalid_request(format!(
            "relative URL `{target}` requires a base URL"
        )));
    };

    let base = Url::parse(base)?;
    Ok(base.join(target)?)
}

#[cfg(test)]
mod tests {
    use assert2::let_assert;
    use courier_core::Error;

    use super::*;

    #[test]
    fn headers_merge_and_overwrite() {
        let builder = ApiBuilder::get("/users")
            .headers([("a".to_string(), "1".to_string())])
            .headers([("b".to_string(), "2".to_string())]);
        assert_eq!(builder.headers.get("a").map(String::as_str), Some("1"));
        assert_eq!(builder.headers.get("b").map(String::as_str), Some("2"));

        let builder = ApiBuilder::get("/users")
            .headers([("a".to_string(), "1".to_string())])
            .headers([("a".to_string(), "2".to_string())]);
        assert_eq!(builder.headers.get("a").map(String::as_str), Some("2"));
        assert_eq!(builder.headers.len(), 1);
    }

    #[test]
    fn scalar_setters_keep_last_value() {
        let builder = ApiBuilder::get("/users")
            .timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .with_credentials(true)
            .with_credentials(false)
            .base_url("https://first.example.com")
            .base_url("https://second.example.com");

        assert_eq!(builder.timeout, Some(Duration::from_secs(10)));
        assert_eq!(builder.with_credentials, Some(false));
        assert_eq!(
            builder.base_url.as_deref(),
            Some("https://second.example.com")
        );
    }

    #[test]
    fn post_assigns_body_and_content_type() {
        #[derive(serde::Serialize)]
        struct NewUser {
            name: String,
        }

        let builder = ApiBuilder::post(
            "/users",
            &NewUser {
                name: "alice".to_string(),
            },
        );

        assert_eq!(builder.method, Method::Post);
        assert_eq!(
            builder.body.as_deref(),
            Some(br#"{"name":"alice"}"#.as_slice())
        );
        assert_eq!(
            builder.headers.get("Content-Type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn build_resolves_base_url_and_query() {
        let executor = ApiBuilder::get("/users")
            .base_url("https://api.example.com")
            .query("page", "1")
            .registry(&InterceptorRegistry::new())
            .build()
            .expect("build");

        let request = executor.request();
        assert_eq!(request.method(), Method::Get);
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/users?page=1"
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn absolute_url_ignores_base() {
        let executor = ApiBuilder::get("https://other.example.com/health")
            .base_url("https://api.example.com")
            .registry(&InterceptorRegistry::new())
            .build()
            .expect("build");

        assert_eq!(
            executor.request().url().as_str(),
            "https://other.example.com/health"
        );
    }

    #[test]
    fn relative_url_without_base_fails() {
        let_assert!(Err(Error::InvalidRequest(msg)) = ApiBuilder::get("/users").build());
        assert!(msg.contains("requires a base URL"));
    }

    #[test]
    fn unparsable_base_url_fails() {
        let_assert!(
            Err(Error::InvalidUrl(_)) = ApiBuilder::get("/users").base_url("not a url").build()
        );
    }

    #[test]
    fn credentials_flag_lands_on_request_extensions() {
        let executor = ApiBuilder::delete("/sessions/current")
            .base_url("https://api.example.com")
            .with_credentials(true)
            .registry(&InterceptorRegistry::new())
            .build()
            .expect("build");

        assert_eq!(
            executor.request().extensions().get::<WithCredentials>(),
            Some(&WithCredentials(true))
        );
    }

    #[test]
    fn body_serialization_failure_surfaces_at_build() {
        struct Broken;

        impl serde::Serialize for Broken {
            fn serialize<S: serde::Serializer>(
                &self,
                _serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("broken payload"))
            }
        }

        let result = ApiBuilder::put("/users/1", &Broken)
            .base_url("https://api.example.com")
            .build();

        let_assert!(Err(Error::JsonSerialization(err)) = result);
        assert!(err.to_string().contains("broken payload"));
    }

    #[test]
    fn params_from_serializes_repeated_values() {
        #[derive(serde::Serialize)]
        struct Filter {
            tags: Vec<String>,
        }

        let builder = ApiBuilder::get("/search").params_from(&Filter {
            tags: vec!["a".to_string(), "b".to_string()],
        });

        assert_eq!(
            builder.params,
            vec![
                ("tags".to_string(), "a".to_string()),
                ("tags".to_string(), "b".to_string()),
            ]
        );
    }
}
