//! Per-client rate limiting for the conversion endpoint.
//!
//! One keyed governor limiter is shared by all requests and keyed by the peer IP taken
//! from `ConnectInfo`. A request without connection info (an in-process router with no
//! listener) is not limited.

use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::clock::{Clock, DefaultClock};
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};

use crate::core::RateLimitConfig;

use super::error::ApiError;

type KeyedLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

/// Forget idle clients after this many checks.
const RETAIN_EVERY: u64 = 1024;

/// Keyed limiter allowing `max_requests` per client within a rolling window.
pub struct ClientRateLimiter {
    limiter: KeyedLimiter,
    clock: DefaultClock,
    checks: AtomicU64,
}

impl ClientRateLimiter {
    /// Returns `None` when `max_requests` is zero or the window is too short to divide.
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let period = window.checked_div(max_requests)?;
        let quota = Quota::with_period(period)?.allow_burst(burst);

        Some(Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
            checks: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        if !config.enabled {
            tracing::info!("Rate limiting disabled");
            return None;
        }

        let limiter = Self::new(config.max_requests, Duration::from_secs(config.window_secs));
        match &limiter {
            Some(_) => tracing::info!(
                "Rate limiting /convert to {} requests per {} seconds per client",
                config.max_requests,
                config.window_secs
            ),
            None => tracing::warn!(
                "Invalid rate limit ({} requests per {} seconds), rate limiting disabled",
                config.max_requests,
                config.window_secs
            ),
        }
        limiter
    }

    /// Record one request from `client`; `Err` carries the time until it may retry.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % RETAIN_EVERY == RETAIN_EVERY - 1 {
            self.limiter.retain_recent();
        }

        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

/// Middleware rejecting clients over their quota with 429.
pub async fn limit_by_client_ip(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>()
        && let Err(wait) = limiter.check(addr.ip())
    {
        tracing::warn!("Rate limit exceeded for {}", addr.ip());
        return Err(ApiError::too_many_requests(wait.as_secs().max(1)));
    }

    Ok(next.run(request).await)
}
