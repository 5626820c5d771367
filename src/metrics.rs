// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring session activity

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Session metrics
///
/// Uses atomic operations for thread-safe tracking without locks. A
/// controller owns one instance; clones of the controller share it.
#[derive(Debug)]
pub struct Metrics {
    /// Captures started (camera or upload)
    pub captures_started: AtomicU64,

    /// Captures rejected before classification (bad MIME type, camera errors)
    pub captures_rejected: AtomicU64,

    /// Classifications whose results were folded into the statistics
    pub classifications: AtomicU64,

    /// Classifications that failed for a reason other than a timeout
    pub classification_failures: AtomicU64,

    /// Classifications that hit the timeout
    pub timeouts: AtomicU64,

    /// Captures abandoned by the user
    pub cancellations: AtomicU64,

    /// Items detected across all folded classifications
    pub items_detected: AtomicU64,

    /// Total time spent awaiting classifiers, in milliseconds
    pub total_classification_time_ms: AtomicU64,

    /// Creation time
    start_time: Instant,
}

/// Plain copy of the counters at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub captures_started: u64,
    pub captures_rejected: u64,
    pub classifications: u64,
    pub classification_failures: u64,
    pub timeouts: u64,
    pub cancellations: u64,
    pub items_detected: u64,
    pub total_classification_time_ms: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            captures_started: AtomicU64::new(0),
            captures_rejected: AtomicU64::new(0),
            classifications: AtomicU64::new(0),
            classification_failures: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            items_detected: AtomicU64::new(0),
            total_classification_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_capture_started(&self) {
        self.captures_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capture_rejected(&self) {
        self.captures_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a folded classification and the number of items it contributed
    pub fn record_classification(&self, items: usize) {
        self.classifications.fetch_add(1, Ordering::Relaxed);
        self.items_detected.fetch_add(items as u64, Ordering::Relaxed);
    }

    pub fn record_classification_failure(&self) {
        self.classification_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_classification_time(&self, duration: Duration) {
        self.total_classification_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average classification time in milliseconds over successful runs
    pub fn avg_classification_time_ms(&self) -> f64 {
        let total = self.total_classification_time_ms.load(Ordering::Relaxed);
        let count = self.classifications.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            captures_started: self.captures_started.load(Ordering::Relaxed),
            captures_rejected: self.captures_rejected.load(Ordering::Relaxed),
            classifications: self.classifications.load(Ordering::Relaxed),
            classification_failures: self.classification_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            cancellations: self.cancellations.load(Ordering::Relaxed),
            items_detected: self.items_detected.load(Ordering::Relaxed),
            total_classification_time_ms: self.total_classification_time_ms.load(Ordering::Relaxed),
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        let s = self.snapshot();
        tracing::info!("=== Session Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Captures: {} started, {} rejected, {} cancelled",
            s.captures_started,
            s.captures_rejected,
            s.cancellations
        );
        tracing::info!(
            "Classifications: {} completed ({} items), {} failed, {} timed out",
            s.classifications,
            s.items_detected,
            s.classification_failures,
            s.timeouts
        );
        tracing::info!(
            "Classification time: {:.2}s total (avg: {:.2}ms)",
            s.total_classification_time_ms as f64 / 1000.0,
            self.avg_classification_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
