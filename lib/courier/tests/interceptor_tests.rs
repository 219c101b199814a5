//! Integration tests for the interceptor pipeline using wiremock.

use std::collections::HashMap;

use assert2::let_assert;
use bytes::Bytes;
use courier::{ApiBuilder, Error, InterceptorRegistry, Response};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, header_exists, method, path},
};

/// Request interceptors run in registration order: the second sees what the
/// first wrote.
#[tokio::test]
async fn test_request_interceptors_run_in_registration_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ordered"))
        .and(header("X-Order", "first-second"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_request_interceptor(|mut request| {
        request
            .headers_mut()
            .insert("X-Order".to_string(), "first".to_string());
        Ok(request)
    });
    registry.add_request_interceptor(|mut request| {
        let seen = request.header("X-Order").unwrap_or_default().to_string();
        request
            .headers_mut()
            .insert("X-Order".to_string(), format!("{seen}-second"));
        Ok(request)
    });

    let executor = ApiBuilder::get("/ordered")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    let response = executor.dispatch().await.expect("response");
    assert_eq!(response.status(), 200);
}

/// Fulfilled-handlers transform the settled response.
#[tokio::test]
async fn test_fulfilled_handler_transforms_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_string("raw"))
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_response_interceptor(
        |response| Ok(response.map_body(|_| Bytes::from("transformed"))),
        |error| async move { Err(error) },
    );

    let executor = ApiBuilder::get("/raw")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    let response = executor.dispatch().await.expect("response");
    assert_eq!(response.into_body(), Bytes::from("transformed"));
}

/// A rejected-handler that recognizes a 401 substitutes its own outcome for
/// the rejection.
#[tokio::test]
async fn test_rejected_handler_recovers_401() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/protected"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_response_interceptor(Ok, |error| async move {
        if error.status() == Some(401) {
            // Stand-in for a token refresh followed by a re-issued request
            Ok(Response::new(200, HashMap::new(), Bytes::from("recovered")))
        } else {
            Err(error)
        }
    });

    let executor = ApiBuilder::get("/protected")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    let response = executor.dispatch().await.expect("recovered response");
    assert_eq!(response.status(), 200);
    assert_eq!(response.into_body(), Bytes::from("recovered"));
}

/// Errors the rejected-handler does not recognize keep propagating.
#[tokio::test]
async fn test_rejected_handler_resignals_other_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_response_interceptor(Ok, |error| async move {
        if error.status() == Some(401) {
            Ok(Response::new(200, HashMap::new(), Bytes::new()))
        } else {
            Err(error)
        }
    });

    let executor = ApiBuilder::get("/broken")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    let_assert!(Err(err) = executor.dispatch().await);
    assert_eq!(err.status(), Some(500));
}

/// Interceptors are snapshotted at build time: clearing the registry between
/// two builds leaves the first executor's chain intact and the second's
/// empty, and later registrations are invisible to both.
#[tokio::test]
async fn test_snapshot_at_build_time() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/snapshot"))
        .and(header("X-Auth", "token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("with"))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_string("without"))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_request_interceptor(|mut request| {
        request
            .headers_mut()
            .insert("X-Auth".to_string(), "token".to_string());
        Ok(request)
    });

    let first = ApiBuilder::get("/snapshot")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    registry.clear();

    let second = ApiBuilder::get("/snapshot")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    // Registered after both builds: applies to neither executor.
    registry.add_request_interceptor(|mut request| {
        request
            .headers_mut()
            .insert("X-Late".to_string(), "yes".to_string());
        Ok(request)
    });

    let response = first.dispatch().await.expect("response");
    assert_eq!(response.into_body(), Bytes::from("with"));

    let response = second.dispatch().await.expect("response");
    assert_eq!(response.into_body(), Bytes::from("without"));
}

/// Executor-local interceptors run after the globals copied in at build.
#[tokio::test]
async fn test_local_interceptors_run_after_global() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/layered"))
        .and(header("X-Order", "global-local"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_request_interceptor(|mut request| {
        request
            .headers_mut()
            .insert("X-Order".to_string(), "global".to_string());
        Ok(request)
    });

    let executor = ApiBuilder::get("/layered")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    executor.set_request_interceptor(|mut request| {
        let seen = request.header("X-Order").unwrap_or_default().to_string();
        request
            .headers_mut()
            .insert("X-Order".to_string(), format!("{seen}-local"));
        Ok(request)
    });

    let response = executor.dispatch().await.expect("response");
    assert_eq!(response.status(), 200);
}

/// A local interceptor on one executor never leaks onto another.
#[tokio::test]
async fn test_local_interceptors_stay_local() {
    let mock_server = MockServer::start().await;

    // A tagged request would hit this mock and fail the assertion below.
    Mock::given(method("GET"))
        .and(path("/isolated"))
        .and(header_exists("X-Local"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/isolated"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();

    let tagged = ApiBuilder::get("/isolated")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");
    let untagged = ApiBuilder::get("/isolated")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    tagged.set_request_interceptor(|mut request| {
        request
            .headers_mut()
            .insert("X-Local".to_string(), "yes".to_string());
        Ok(request)
    });

    let_assert!(Err(err) = tagged.dispatch().await);
    assert_eq!(err.status(), Some(500));

    let response = untagged.dispatch().await.expect("response");
    assert_eq!(response.status(), 200);
}

/// A failing request interceptor skips dispatch entirely; a rejected-handler
/// can still turn the failure into an outcome.
#[tokio::test]
async fn test_request_interceptor_error_skips_dispatch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/never"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let registry = InterceptorRegistry::new();
    registry.add_request_interceptor(|_| Err(Error::invalid_request("blocked")));
    registry.add_response_interceptor(Ok, |error| async move {
        match error {
            Error::InvalidRequest(_) => {
                Ok(Response::new(200, HashMap::new(), Bytes::from("fallback")))
            }
            other => Err(other),
        }
    });

    let executor = ApiBuilder::get("/never")
        .base_url(mock_server.uri())
        .registry(&registry)
        .build()
        .expect("build");

    let response = executor.dispatch().await.expect("fallback response");
    assert_eq!(response.into_body(), Bytes::from("fallback"));
}

/// The process-wide registry is one instance: clones share its lists.
/// The only test that touches global state, and it cleans up after itself.
#[tokio::test]
async fn test_global_registry_is_shared() {
    let global = InterceptorRegistry::global();
    let before = global.request_interceptors().len();

    let handle = global.clone();
    handle.add_request_interceptor(Ok);

    assert_eq!(global.request_interceptors().len(), before + 1);

    global.clear();
    assert!(global.request_interceptors().is_empty());
    assert!(global.response_interceptors().is_empty());
}
