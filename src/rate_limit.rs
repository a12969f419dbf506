//! Per-address throttling of the student-facing code endpoints.
//!
//! This is advisory: it slows down code guessing, but nothing relies on it
//! for correctness.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use log::warn;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    tokio::sync::Mutex,
    Request, State,
};

/// Length of the rolling window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Number of tracked addresses above which idle ones are swept out.
pub const SWEEP_THRESHOLD: usize = 1024;

/// A rolling-window request counter keyed by client address.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// `max_requests` per [`WINDOW`].
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests as usize, WINDOW)
    }

    /// Record a request from `ip` and report whether it is within budget.
    pub async fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now()).await
    }

    /// [`Self::check`] at a given instant.
    pub async fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let mut hits = self.hits.lock().await;
        if hits.len() >= SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, recent| {
                recent
                    .last()
                    .map_or(false, |&at| now.saturating_duration_since(at) < window)
            });
        }

        let recent = hits.entry(ip).or_default();
        recent.retain(|&at| now.saturating_duration_since(at) < self.window);
        if recent.len() >= self.max_requests {
            if recent.is_empty() {
                hits.remove(&ip);
            }
            return false;
        }
        recent.push(now);
        true
    }

    /// Number of addresses currently holding state.
    pub async fn tracked_addresses(&self) -> usize {
        self.hits.lock().await.len()
    }
}

/// Request guard that fails with 429 once the client's budget is spent.
pub struct WithinRateLimit;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for WithinRateLimit {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as the `RateLimiter` is always managed.
        let limiter = req.guard::<&State<RateLimiter>>().await.unwrap();
        let ip = req
            .client_ip()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        if limiter.check(ip).await {
            Outcome::Success(WithinRateLimit)
        } else {
            warn!("Rate limit exceeded by {ip}");
            Outcome::Failure((Status::TooManyRequests, ()))
        }
    }
}
