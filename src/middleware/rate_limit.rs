use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, StatusCode, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::warn;

// Expired windows are swept once the table grows past this many clients
const SWEEP_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of one rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

/// Fixed-window request counter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub async fn check(&self, client: &str) -> RateLimitResult {
        let mut windows = self.windows.write().await;

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| w.started.elapsed() < window);
        }

        let entry = windows.entry(client.to_string()).or_insert(Window {
            count: 0,
            started: Instant::now(),
        });

        if entry.started.elapsed() >= self.window {
            entry.count = 0;
            entry.started = Instant::now();
        }

        if entry.count >= self.max_requests {
            let retry_after = self.window.saturating_sub(entry.started.elapsed());
            return RateLimitResult::Limited {
                retry_after_secs: retry_after.as_secs().max(1),
            };
        }

        entry.count += 1;
        RateLimitResult::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }
}

/// Rejects clients over their budget with 429 and a `Retry-After` header.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request<Body>, next: Next) -> Response {
    let client = client_key(&request);

    match limiter.check(&client).await {
        RateLimitResult::Allowed { .. } => next.run(request).await,
        RateLimitResult::Limited { retry_after_secs } => {
            warn!("Rate limit exceeded for {} on {}", client, request.uri().path());
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "Too many requests, please try again later" })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}

// Peer address when the server was started with connect info, otherwise one shared bucket
fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
