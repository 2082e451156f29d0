//! Process-wide request counters.
//!
//! All updates are relaxed atomic operations: the metrics stage never takes a
//! lock and never waits on a backend, so it adds no measurable latency.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub struct Metrics {
    requests: AtomicU64,
    errors: AtomicU64,
    panics: AtomicU64,
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
    // Indexed by status class: 1xx .. 5xx.
    by_class: [AtomicU64; 5],
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            panics: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            peak_in_flight: AtomicU64::new(0),
            by_class: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
        }
    }

    /// Counts a new request and samples the in-flight gauge. The gauge goes
    /// back down when the returned guard is dropped.
    #[must_use]
    pub fn start_request(&self) -> InFlight<'_> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let now = self.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::Relaxed);
        InFlight { metrics: self }
    }

    pub fn record_status(&self, status: StatusCode) {
        let class = usize::from(status.as_u16() / 100);
        if let Some(counter) = class.checked_sub(1).and_then(|i| self.by_class.get(i)) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_panic(&self) {
        self.panics.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let class = |i: usize| self.by_class[i].load(Ordering::Relaxed);
        Snapshot {
            requests: self.requests.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            panics: self.panics.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
            peak_in_flight: self.peak_in_flight.load(Ordering::Relaxed),
            status_1xx: class(0),
            status_2xx: class(1),
            status_3xx: class(2),
            status_4xx: class(3),
            status_5xx: class(4),
        }
    }
}

pub struct InFlight<'a> {
    metrics: &'a Metrics,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.metrics.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub requests: u64,
    pub errors: u64,
    pub panics: u64,
    pub in_flight: u64,
    pub peak_in_flight: u64,
    pub status_1xx: u64,
    pub status_2xx: u64,
    pub status_3xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gauge_follows_guard() {
        let metrics = Metrics::new();
        let a = metrics.start_request();
        let b = metrics.start_request();
        assert_eq!(metrics.snapshot().in_flight, 2);
        drop(a);
        drop(b);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 2);
        assert_eq!(snap.in_flight, 0);
        assert_eq!(snap.peak_in_flight, 2);
    }

    #[test]
    fn status_classes() {
        let metrics = Metrics::new();
        metrics.record_status(StatusCode::OK);
        metrics.record_status(StatusCode::CREATED);
        metrics.record_status(StatusCode::NOT_FOUND);
        metrics.record_status(StatusCode::INTERNAL_SERVER_ERROR);

        let snap = metrics.snapshot();
        assert_eq!(snap.status_2xx, 2);
        assert_eq!(snap.status_4xx, 1);
        assert_eq!(snap.status_5xx, 1);
        assert_eq!(snap.status_3xx, 0);
    }
}
