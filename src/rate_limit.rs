use axum::http::HeaderMap;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::metrics::TRACKED_CLIENTS;

const LOOPBACK: &str = "127.0.0.1";

// Rate limit entry - tracks requests per client IP
#[derive(Debug, Clone)]
pub struct RateLimitEntry {
    pub count: u32,
    pub reset_at: Instant,
}

/// Fixed-window limiter keyed by client IP.
///
/// Approximate on purpose: two concurrent requests from one IP may both pass
/// the threshold, and sweeping is best-effort. Per process only.
pub struct RateLimiter {
    entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
    max_tracked: usize,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_tracked: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
            max_tracked,
        }
    }

    pub fn check(&self, ip: &str) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: &str, now: Instant) -> bool {
        let allowed = {
            let mut entry = self
                .entries
                .entry(ip.to_string())
                .or_insert_with(|| RateLimitEntry {
                    count: 0,
                    reset_at: now + self.window,
                });

            // window expired..? start a new one
            if now > entry.reset_at {
                entry.count = 0;
                entry.reset_at = now + self.window;
            }

            if entry.count >= self.max_requests {
                false
            } else {
                entry.count += 1;
                true
            }
        };

        // entry guard must be dropped before retain, DashMap would deadlock
        if self.entries.len() > self.max_tracked {
            self.sweep(now);
        }
        TRACKED_CLIENTS.set(self.entries.len() as f64);

        allowed
    }

    // Drop entries whose window ended more than one window ago
    fn sweep(&self, now: Instant) {
        let before = self.entries.len();
        let cutoff = now.checked_sub(self.window);
        self.entries
            .retain(|_, entry| cutoff.is_none_or(|cutoff| entry.reset_at >= cutoff));
        tracing::debug!(
            removed = before - self.entries.len(),
            remaining = self.entries.len(),
            "Swept expired rate limit entries"
        );
    }

    pub fn retry_after_secs(&self) -> u64 {
        self.window.as_secs()
    }

    pub fn tracked_clients(&self) -> usize {
        self.entries.len()
    }
}

// X-Forwarded-For (first hop), then X-Real-IP, then the socket peer, then loopback
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty());

    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| LOOPBACK.to_string())
}
