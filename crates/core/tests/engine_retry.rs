//! Retry and error-classification behaviour of the request engine
//!
//! Runs on paused tokio time: sleeps advance the clock instantly and the
//! scripted transport records when each attempt was sent.

mod support;

use std::sync::Arc;
use std::time::Duration;

use njuns_core::{
    ErrorCategory, RequestError, RequestOptions, ResponseBody, RetryPolicy, Route,
    TransportErrorKind,
};
use serde_json::json;
use support::{engine, engine_with_policy, ScriptedTransport, BASE_URL};

fn secs(values: &[u64]) -> Vec<Duration> {
    values.iter().map(|s| Duration::from_secs(*s)).collect()
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test(start_paused = true)]
async fn rate_limited_twice_then_success() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(429, "slow down")
            .respond(429, "slow down")
            .respond_json(200, json!([{"id": "1"}])),
    );
    let engine = engine(&transport);

    let body = engine.execute(&Route::get("/entities/e"), RequestOptions::default()).await.unwrap();

    assert_eq!(body, ResponseBody::Json(json!([{"id": "1"}])));
    assert_eq!(transport.request_count(), 3);
    assert_eq!(transport.gaps(), secs(&[3, 3]));
}

#[tokio::test(start_paused = true)]
async fn five_bad_gateways_exhaust_budget() {
    let transport = Arc::new(ScriptedTransport::new().repeat(5, 502, "<html>Bad Gateway</html>"));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/userInfo"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, RequestError::Server(_)));
    assert_eq!(err.status(), Some(502));
    assert_eq!(transport.request_count(), 5);
    assert_eq!(transport.gaps(), secs(&[1, 3, 5, 7]));
}

#[tokio::test(start_paused = true)]
async fn no_sleep_after_final_attempt() {
    let transport = Arc::new(ScriptedTransport::new().repeat(5, 504, ""));
    let engine = engine(&transport);
    let started = tokio::time::Instant::now();

    let _ = engine.execute(&Route::get("/userInfo"), RequestOptions::default()).await;

    assert_eq!(started.elapsed(), Duration::from_secs(1 + 3 + 5 + 7));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_exhaustion_is_generic() {
    let transport = Arc::new(ScriptedTransport::new().repeat(5, 429, ""));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/userInfo"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, RequestError::Http(_)));
    assert_eq!(err.status(), Some(429));
    assert_eq!(transport.gaps(), secs(&[3, 3, 3, 3]));
}

#[tokio::test(start_paused = true)]
async fn retries_share_one_budget() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(429, "")
            .respond(500, "")
            .fail(TransportErrorKind::ConnectionReset)
            .respond(200, "done"),
    );
    let engine = engine(&transport);

    let body = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap();

    assert_eq!(body, ResponseBody::Text("done".to_string()));
    // 429 waits 3 units, then the backoff index is the overall attempt number.
    assert_eq!(transport.gaps(), secs(&[3, 3, 5]));
}

#[tokio::test(start_paused = true)]
async fn custom_unit_scales_delays() {
    let transport = Arc::new(ScriptedTransport::new().respond(500, "").respond(200, "ok"));
    let policy = RetryPolicy::default().with_unit(Duration::from_millis(10));
    let engine = engine_with_policy(&transport, policy);

    engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap();

    assert_eq!(transport.gaps(), vec![Duration::from_millis(10)]);
}

// ============================================================================
// Terminal statuses
// ============================================================================

#[tokio::test(start_paused = true)]
async fn forbidden_is_not_retried() {
    let transport = Arc::new(ScriptedTransport::new().respond(403, "denied").respond(200, ""));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/entities/e"), RequestOptions::default()).await.unwrap_err();

    match &err {
        RequestError::Forbidden(failure) => {
            assert_eq!(failure.status, Some(403));
            assert_eq!(failure.body.as_deref(), Some("denied"));
            assert_eq!(failure.route.url, format!("{BASE_URL}/entities/e"));
        }
        other => panic!("expected Forbidden, got {other:?}"),
    }
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn not_found_and_generic_statuses() {
    let transport = Arc::new(ScriptedTransport::new().respond(404, "").respond(409, "conflict"));
    let engine = engine(&transport);

    let first = engine.execute(&Route::get("/a"), RequestOptions::default()).await.unwrap_err();
    let second = engine.execute(&Route::get("/b"), RequestOptions::default()).await.unwrap_err();

    assert_eq!(first.category(), ErrorCategory::NotFound);
    assert_eq!(second.category(), ErrorCategory::Client);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn json_error_document_fails_without_retry() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond_json(500, json!({"error": "Server error", "details": "NPE"})),
    );
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, RequestError::Server(_)));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unlisted_server_status_fails_immediately() {
    let transport = Arc::new(ScriptedTransport::new().respond(503, "maintenance"));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, RequestError::Server(_)));
    assert_eq!(transport.request_count(), 1);
}

// ============================================================================
// Transport failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn connection_reset_is_retried() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .fail(TransportErrorKind::ConnectionReset)
            .fail(TransportErrorKind::ConnectionRefused)
            .respond(200, "ok"),
    );
    let engine = engine(&transport);

    engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap();

    assert_eq!(transport.gaps(), secs(&[1, 3]));
}

#[tokio::test(start_paused = true)]
async fn timeout_surfaces_as_transport_error() {
    let transport = Arc::new(ScriptedTransport::new().fail(TransportErrorKind::Timeout));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(
        &err,
        RequestError::Transport { source, .. } if source.kind == TransportErrorKind::Timeout
    ));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn persistent_resets_exhaust_budget() {
    let mut script = ScriptedTransport::new();
    for _ in 0..5 {
        script = script.fail(TransportErrorKind::ConnectionAborted);
    }
    let transport = Arc::new(script);
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(err.is_retryable());
    assert_eq!(transport.request_count(), 5);
}

// ============================================================================
// Bodies and headers
// ============================================================================

#[tokio::test]
async fn invalid_json_success_body_is_decode_error() {
    let transport = Arc::new(ScriptedTransport::new().push_raw(200, "{not json", "application/json"));
    let engine = engine(&transport);

    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Decode);
}

#[tokio::test]
async fn typed_helper_reports_shape_mismatch() {
    let transport = Arc::new(ScriptedTransport::new().respond_json(200, json!({"a": 1})));
    let engine = engine(&transport);

    let result: Result<Vec<String>, _> =
        engine.execute_json(&Route::get("/x"), RequestOptions::default()).await;

    assert!(matches!(result, Err(RequestError::Decode { .. })));
}

#[tokio::test]
async fn unauthenticated_request_has_no_bearer() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, ""));
    let engine = engine(&transport);

    engine
        .execute(&Route::post("/entities/e"), RequestOptions::json(json!({"name": "x"})))
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert!(request.header("Authorization").is_none());
    assert_eq!(request.header("User-Agent"), Some("njuns-tests"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.body.as_deref(), Some(r#"{"name":"x"}"#));
}

#[tokio::test]
async fn closed_engine_rejects_calls_without_io() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, ""));
    let engine = engine(&transport);

    engine.close().await;
    let err = engine.execute(&Route::get("/x"), RequestOptions::default()).await.unwrap_err();

    assert!(matches!(err, RequestError::SessionClosed));
    assert_eq!(transport.request_count(), 0);
    assert_eq!(transport.close_count(), 1);
}
