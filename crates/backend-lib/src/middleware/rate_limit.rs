//! Fixed-window, per-client request limiting.
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use metrics::counter;
use tokio::task::JoinHandle;

use crate::{error::AppError, metrics as keys, AppState};

/// Header the reverse proxy sets to the client address
pub const CLIENT_IP_HEADER: &str = "x-real-ip";

/// Rate limit entry for a client
#[derive(Debug)]
struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

/// Per-client fixed-window counter
#[derive(Debug)]
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    window: Duration,
    max_requests: u32,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            entries: DashMap::new(),
            window,
            max_requests,
        }
    }

    /// Count one request for `client`; `false` once the window's budget is spent
    pub fn check(&self, client: &str) -> bool {
        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: Instant::now(),
            });

        if entry.window_start.elapsed() > self.window {
            entry.requests = 0;
            entry.window_start = Instant::now();
        }

        if entry.requests >= self.max_requests {
            return false;
        }
        entry.requests += 1;
        true
    }

    /// Drop clients whose window has expired. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.window_start.elapsed() <= self.window);
        before.saturating_sub(self.entries.len())
    }

    /// Clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

/// Periodically prune expired clients from `limiter`
pub fn spawn_cleanup(limiter: Arc<RateLimiter>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = limiter.cleanup();
            if removed > 0 {
                tracing::debug!(removed, "rate limiter entries pruned");
            }
        }
    })
}

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = request
        .headers()
        .get(CLIENT_IP_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    if !state.rate_limiter.check(&client_ip) {
        counter!(keys::HTTP_RATE_LIMITED).increment(1);
        tracing::warn!(client = %client_ip, "rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
