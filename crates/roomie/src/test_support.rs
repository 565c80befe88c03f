// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: token builders and a scripted mock backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::token::epoch_secs;

/// Build an unsigned JWT around a raw payload string.
pub fn jwt(payload: &str) -> String {
    format!(
        "{}.{}.c2ln",
        URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#),
        URL_SAFE_NO_PAD.encode(payload),
    )
}

/// JWT whose `exp` is `secs` from now (negative for the past).
pub fn jwt_expiring_in(secs: i64) -> String {
    jwt(&serde_json::json!({ "sub": "user-1", "exp": epoch_secs() + secs }).to_string())
}

/// In-memory sink for log output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route every log event on this thread into a buffer until the guard drops.
///
/// Only covers the current thread, so use it from `#[tokio::test]`'s
/// single-threaded runtime.
pub fn capture_logs() -> (tracing::subscriber::DefaultGuard, LogBuffer) {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("roomie=trace")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    (tracing::subscriber::set_default(subscriber), logs)
}

/// A request the mock backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct Script {
    responses: Vec<(u16, String)>,
    delay: Option<Duration>,
    calls: usize,
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<String, Script>,
    requests: HashMap<String, Vec<Recorded>>,
}

/// In-process HTTP backend on `127.0.0.1:0`.
///
/// Routes are keyed `"METHOD /path"`. Each call returns the next scripted
/// response; the last one repeats. Unscripted routes return 404.
pub struct MockServer {
    pub base_url: String,
    state: Arc<Mutex<MockState>>,
}

impl MockServer {
    pub async fn start() -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(MockState::default()));
        let app = Router::new().fallback(handle).with_state(Arc::clone(&state));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        Ok(Self { base_url: format!("http://{addr}"), state })
    }

    /// Append a scripted response for `route`.
    pub fn respond(&self, route: &str, status: u16, body: impl Into<String>) -> &Self {
        let mut state = self.state.lock();
        state.scripts.entry(route.to_owned()).or_default().responses.push((status, body.into()));
        self
    }

    /// Delay every response on `route`.
    pub fn delay(&self, route: &str, delay: Duration) -> &Self {
        self.state.lock().scripts.entry(route.to_owned()).or_default().delay = Some(delay);
        self
    }

    pub fn calls(&self, route: &str) -> usize {
        self.state.lock().requests.get(route).map(Vec::len).unwrap_or(0)
    }

    pub fn requests(&self, route: &str) -> Vec<Recorded> {
        self.state.lock().requests.get(route).cloned().unwrap_or_default()
    }
}

async fn handle(
    State(state): State<Arc<Mutex<MockState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    let route = format!("{method} {}", uri.path());
    let authorization =
        headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned);

    let (reply, delay) = {
        let mut state = state.lock();
        state.requests.entry(route.clone()).or_default().push(Recorded { authorization, body });
        match state.scripts.get_mut(&route) {
            Some(script) if !script.responses.is_empty() => {
                let idx = script.calls.min(script.responses.len() - 1);
                script.calls += 1;
                (script.responses[idx].clone(), script.delay)
            }
            _ => ((404, "{}".to_owned()), None),
        }
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let status = StatusCode::from_u16(reply.0).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], reply.1)
}
