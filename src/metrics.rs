// Performance metrics module
//
// Provides lightweight metrics tracking for monitoring watcher activity

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Watcher performance metrics
///
/// Uses atomic operations for thread-safe metric tracking without locks.
/// Metrics accumulate for the lifetime of a `Replacer` and can be logged
/// periodically or on shutdown.
#[derive(Debug)]
pub struct Metrics {
    /// Mutation batches processed
    pub batches_processed: AtomicU64,

    /// Full-document rescan ticks completed
    pub rescans_completed: AtomicU64,

    /// Sub-documents successfully attached
    pub frames_attached: AtomicU64,

    /// Sub-document attachments denied (cross-origin)
    pub frames_denied: AtomicU64,

    /// Times the mutation stream lagged and dropped records
    pub mutation_lag_events: AtomicU64,

    /// Text nodes written back by engine sweeps
    pub text_rewrites: AtomicU64,

    /// Watcher start time
    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            batches_processed: AtomicU64::new(0),
            rescans_completed: AtomicU64::new(0),
            frames_attached: AtomicU64::new(0),
            frames_denied: AtomicU64::new(0),
            mutation_lag_events: AtomicU64::new(0),
            text_rewrites: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_batch(&self) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rescan(&self) {
        self.rescans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_attached(&self) {
        self.frames_attached.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_denied(&self) {
        self.frames_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mutation_lag(&self) {
        self.mutation_lag_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_text_rewrites(&self, count: u64) {
        self.text_rewrites.fetch_add(count, Ordering::Relaxed);
    }

    /// Get total uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Watcher Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Batches: {}, rescans: {}, text rewrites: {}",
            self.batches_processed.load(Ordering::Relaxed),
            self.rescans_completed.load(Ordering::Relaxed),
            self.text_rewrites.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Frames: {} attached, {} denied; mutation lag events: {}",
            self.frames_attached.load(Ordering::Relaxed),
            self.frames_denied.load(Ordering::Relaxed),
            self.mutation_lag_events.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.batches_processed.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.frames_attached.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_counters() {
        let metrics = Metrics::new();

        metrics.record_batch();
        metrics.record_batch();
        metrics.record_rescan();
        metrics.record_frame_attached();
        metrics.record_frame_denied();
        metrics.record_mutation_lag();
        metrics.record_text_rewrites(3);

        assert_eq!(metrics.batches_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.rescans_completed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.frames_attached.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.frames_denied.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.mutation_lag_events.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.text_rewrites.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_uptime() {
        let metrics = Metrics::new();
        thread::sleep(Duration::from_millis(10));
        assert!(metrics.uptime().as_millis() >= 10);
    }
}
