//! Shared test helpers for `njuns-core` integration tests.
//!
//! `ScriptedTransport` replays canned responses in order and records every
//! request with the (virtual) instant it was sent, so retry schedules can be
//! asserted on paused tokio time.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use njuns_core::{
    HttpRequest, HttpResponse, HttpTransport, RequestEngine, RetryPolicy, TransportError,
    TransportErrorKind,
};
use serde_json::{json, Value};
use tokio::time::Instant;

pub const BASE_URL: &str = "https://njuns.test/app/rest/v2";

type Reply = Result<HttpResponse, TransportError>;
type Handler = Box<dyn Fn(&HttpRequest) -> Reply + Send + Sync>;

/// A request as seen by the transport.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub at: Instant,
    pub request: HttpRequest,
}

/// In-memory transport replaying a fixed script.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    handler: Option<Handler>,
    log: Mutex<Vec<Recorded>>,
    closes: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request through `handler` instead of a queue.
    pub fn with_handler(handler: impl Fn(&HttpRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self { handler: Some(Box::new(handler)), ..Self::default() }
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body)))
    }

    pub fn respond_json(self, status: u16, body: Value) -> Self {
        self.push(Ok(HttpResponse::json(status, &body)))
    }

    pub fn push_raw(self, status: u16, body: &str, content_type: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body).with_header("Content-Type", content_type)))
    }

    pub fn fail(self, kind: TransportErrorKind) -> Self {
        self.push(Err(TransportError::new(kind, "scripted failure")))
    }

    pub fn repeat(mut self, times: usize, status: u16, body: &str) -> Self {
        for _ in 0..times {
            self = self.respond(status, body);
        }
        self
    }

    fn push(self, reply: Reply) -> Self {
        self.script.lock().unwrap().push_back(reply);
        self
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.recorded().into_iter().map(|r| r.request).collect()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Time between consecutive requests.
    pub fn gaps(&self) -> Vec<Duration> {
        self.recorded().windows(2).map(|pair| pair[1].at - pair[0].at).collect()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.log.lock().unwrap().push(Recorded { at: Instant::now(), request: request.clone() });

        if let Some(handler) = &self.handler {
            return handler(&request);
        }
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(TransportError::new(TransportErrorKind::Other, "script exhausted"))
        })
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Engine on the default policy (one-second unit) over `transport`.
pub fn engine(transport: &Arc<ScriptedTransport>) -> RequestEngine {
    engine_with_policy(transport, RetryPolicy::default())
}

pub fn engine_with_policy(transport: &Arc<ScriptedTransport>, policy: RetryPolicy) -> RequestEngine {
    RequestEngine::builder()
        .transport(transport.clone())
        .base_url(BASE_URL)
        .user_agent("njuns-tests")
        .retry_policy(policy)
        .build()
        .unwrap()
}

pub fn token_json(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "refresh_token": refresh,
        "expires_in": expires_in,
        "scope": "rest-api"
    })
}

pub fn user_json(login: &str) -> Value {
    json!({
        "id": "60885987-1b61-4247-94c7-dff348347f93",
        "login": login,
        "name": "Jane Doe",
        "firstName": "Jane",
        "lastName": "Doe",
        "email": "jdoe@example.com",
        "locale": "en",
        "_instanceName": "Jane Doe [jdoe]"
    })
}
