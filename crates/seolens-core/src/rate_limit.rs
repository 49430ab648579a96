//! In-memory, per-IP rate limiting
//!
//! Fixed-window counters keyed by client IP, with a bounded number of
//! tracked clients evicted least-recently-seen. The limiter is plain
//! state handed to the handler that needs it; approximate limiting
//! under concurrent requests from one IP is acceptable.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

/// Requests allowed per window per client.
pub const MAX_REQUESTS_PER_WINDOW: u32 = 5;
/// Length of the counting window.
pub const WINDOW: Duration = Duration::from_secs(60);
/// Upper bound on tracked clients.
pub const MAX_TRACKED_CLIENTS: usize = 500;

#[derive(Debug, Clone, Copy)]
struct ClientEntry {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    max_clients: usize,
    clients: HashMap<IpAddr, ClientEntry>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_clients: usize) -> Self {
        Self {
            max_requests,
            window,
            max_clients,
            clients: HashMap::new(),
        }
    }

    /// Record a request from `ip` and report whether it is allowed.
    pub fn check(&mut self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    /// Clock-explicit variant of [`check`](Self::check).
    pub fn check_at(&mut self, ip: IpAddr, now: Instant) -> bool {
        if !self.clients.contains_key(&ip) && self.clients.len() >= self.max_clients {
            self.evict_least_recent();
        }

        let entry = self.clients.entry(ip).or_insert(ClientEntry {
            count: 0,
            window_start: now,
            last_seen: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.last_seen = now;
        entry.count <= self.max_requests
    }

    fn evict_least_recent(&mut self) {
        if let Some(oldest) = self
            .clients
            .iter()
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(ip, _)| *ip)
        {
            self.clients.remove(&oldest);
        }
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_REQUESTS_PER_WINDOW, WINDOW, MAX_TRACKED_CLIENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn sixth_request_in_window_is_rejected() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at(ip(1), now));
        }
        assert!(!limiter.check_at(ip(1), now));
    }

    #[test]
    fn window_expiry_allows_new_requests() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();

        for _ in 0..6 {
            limiter.check_at(ip(1), now);
        }
        assert!(!limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(1), now + WINDOW + Duration::from_millis(1)));
    }

    #[test]
    fn clients_are_counted_independently() {
        let mut limiter = RateLimiter::default();
        let now = Instant::now();

        for _ in 0..5 {
            assert!(limiter.check_at(ip(1), now));
        }
        assert!(!limiter.check_at(ip(1), now));
        assert!(limiter.check_at(ip(2), now));
    }

    #[test]
    fn capacity_evicts_least_recently_seen() {
        let mut limiter = RateLimiter::new(5, WINDOW, 2);
        let base = Instant::now();

        // Exhaust ip 1, then displace it with two fresher clients.
        for _ in 0..6 {
            limiter.check_at(ip(1), base);
        }
        limiter.check_at(ip(2), base + Duration::from_secs(1));
        limiter.check_at(ip(3), base + Duration::from_secs(2));
        assert_eq!(limiter.tracked_clients(), 2);

        // ip 1 was evicted, so its counter starts over.
        assert!(limiter.check_at(ip(1), base + Duration::from_secs(3)));
    }
}
