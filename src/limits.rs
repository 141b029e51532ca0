//! Request rate limiting.
//!
//! A fixed-window counter per client IP, applied as middleware in front of
//! every route. When the window is exhausted requests receive HTTP 429 with
//! a reason distinct from authentication failures.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use crate::AppState;
use crate::config::LimitsConfig;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Copy)]
struct WindowState {
    window_start: Instant,
    count: u32,
}

/// Fixed-window per-IP rate limiter.
///
/// Entries for IPs that stop sending requests are swept out once per window,
/// so the map stays proportional to currently-active clients.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<IpAddr, WindowState>,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            windows: DashMap::new(),
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Record a request from `ip`, rejecting it if the current window is full.
    pub fn check(&self, ip: IpAddr) -> Result<()> {
        self.check_at(ip, Instant::now())
    }

    /// Drop windows that expired before `now`, at most once per window length.
    fn sweep_expired(&self, now: Instant) {
        let Ok(mut last_sweep) = self.last_sweep.lock() else {
            return;
        };
        if now.duration_since(*last_sweep) < self.window {
            return;
        }
        *last_sweep = now;
        self.windows.retain(|_, state| now.duration_since(state.window_start) < self.window);
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> Result<()> {
        self.sweep_expired(now);

        let mut entry = self.windows.entry(ip).or_insert(WindowState {
            window_start: now,
            count: 0,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            return Err(Error::TooManyRequests);
        }

        entry.count += 1;
        Ok(())
    }
}

/// Axum middleware applying the limiter to every request.
///
/// The client IP comes from the connection info; when it is unavailable
/// (e.g. in-process test servers) all traffic shares one bucket.
pub async fn rate_limit_middleware(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

    state.rate_limiter.check(ip)?;
    Ok(next.run(request).await)
}
