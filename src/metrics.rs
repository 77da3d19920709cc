//! Request metrics and statistics tracking for the rating service.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

use crate::models::Prediction;
use crate::types::{Rating, Rejection};

/// Metrics collector for review handling
pub struct ServiceMetrics {
    /// Reviews submitted for a known movie
    pub reviews_received: AtomicU64,
    /// Reviews that produced a rating
    pub ratings_issued: AtomicU64,
    /// Reviews refused for having too few tokens
    pub rejected_too_short: AtomicU64,
    /// Reviews refused for having no known vocabulary
    pub rejected_no_vocabulary: AtomicU64,
    /// Sub-model failures after the guard accepted the review
    pub prediction_failures: AtomicU64,
    /// Handling times (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Count of issued ratings per value (index 0 is rating 1)
    rating_buckets: RwLock<[u64; 10]>,
    /// Absolute word/char score differences
    divergences: RwLock<Vec<f64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            reviews_received: AtomicU64::new(0),
            ratings_issued: AtomicU64::new(0),
            rejected_too_short: AtomicU64::new(0),
            rejected_no_vocabulary: AtomicU64::new(0),
            prediction_failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            rating_buckets: RwLock::new([0; 10]),
            divergences: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    fn record_latency(&self, elapsed: Duration) {
        self.reviews_received.fetch_add(1, Ordering::Relaxed);

        let mut latencies = self.latencies.write().unwrap_or_else(PoisonError::into_inner);
        latencies.push(elapsed.as_micros() as u64);
        // Keep only last 10000
        if latencies.len() > 10000 {
            latencies.drain(0..5000);
        }
    }

    /// Record a review that produced a rating
    pub fn record_rating(&self, elapsed: Duration, prediction: &Prediction) {
        self.record_latency(elapsed);
        self.ratings_issued.fetch_add(1, Ordering::Relaxed);

        let bucket = usize::from(prediction.rating.value() - Rating::MIN);
        self.rating_buckets.write().unwrap_or_else(PoisonError::into_inner)[bucket] += 1;

        let mut divergences = self.divergences.write().unwrap_or_else(PoisonError::into_inner);
        divergences.push(prediction.divergence());
        if divergences.len() > 1000 {
            divergences.drain(0..500);
        }
    }

    /// Record a review refused by the guard
    pub fn record_rejection(&self, elapsed: Duration, rejection: Rejection) {
        self.record_latency(elapsed);
        match rejection {
            Rejection::TooShort => self.rejected_too_short.fetch_add(1, Ordering::Relaxed),
            Rejection::NoKnownVocabulary => self.rejected_no_vocabulary.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record a failed prediction
    pub fn record_failure(&self, elapsed: Duration) {
        self.record_latency(elapsed);
        self.prediction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get handling time statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let times = self.latencies.read().unwrap_or_else(PoisonError::into_inner);
        if times.is_empty() {
            return LatencyStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        drop(times);
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |p: f64| sorted[((count as f64 * p) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: percentile(0.50),
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Mean absolute difference between word and char scores
    pub fn get_avg_divergence(&self) -> f64 {
        let divergences = self.divergences.read().unwrap_or_else(PoisonError::into_inner);
        if divergences.is_empty() {
            return 0.0;
        }
        divergences.iter().sum::<f64>() / divergences.len() as f64
    }

    /// Get current throughput (reviews per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.reviews_received.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get issued ratings per value
    pub fn get_rating_distribution(&self) -> [u64; 10] {
        *self.rating_buckets.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serializable view of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            reviews_received: self.reviews_received.load(Ordering::Relaxed),
            ratings_issued: self.ratings_issued.load(Ordering::Relaxed),
            rejected_too_short: self.rejected_too_short.load(Ordering::Relaxed),
            rejected_no_vocabulary: self.rejected_no_vocabulary.load(Ordering::Relaxed),
            prediction_failures: self.prediction_failures.load(Ordering::Relaxed),
            throughput: self.get_throughput(),
            latency: self.get_latency_stats(),
            rating_distribution: self.get_rating_distribution(),
            avg_divergence: self.get_avg_divergence(),
        }
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let snapshot = self.snapshot();
        let rejected = snapshot.rejected_too_short + snapshot.rejected_no_vocabulary;

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║              MOVIE RATING SERVICE - METRICS SUMMARY          ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Reviews Received: {:>8}  │  Throughput: {:>8.2} reviews/s ║",
            snapshot.reviews_received, snapshot.throughput
        );
        info!(
            "║ Ratings Issued:   {:>8}  │  Rejected: {:>6}  Failed: {:>4} ║",
            snapshot.ratings_issued, rejected, snapshot.prediction_failures
        );
        info!(
            "║   too short: {:>6}   no known vocabulary: {:>6}               ║",
            snapshot.rejected_too_short, snapshot.rejected_no_vocabulary
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Handling Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5}   ║",
            snapshot.latency.mean_us,
            snapshot.latency.p50_us,
            snapshot.latency.p95_us,
            snapshot.latency.p99_us
        );
        info!(
            "║ Word/Char Divergence: {:>5.2} (lower = models agree more)      ║",
            snapshot.avg_divergence
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Rating Distribution:                                         ║");
        let total: u64 = snapshot.rating_distribution.iter().sum();
        for (i, &count) in snapshot.rating_distribution.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
            info!("║   {:>2}/10: {:>6} ({:>5.1}%) {}", i + 1, count, pct, bar);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Handling time statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Point-in-time copy of the service metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub reviews_received: u64,
    pub ratings_issued: u64,
    pub rejected_too_short: u64,
    pub rejected_no_vocabulary: u64,
    pub prediction_failures: u64,
    pub throughput: f64,
    pub latency: LatencyStats,
    pub rating_distribution: [u64; 10],
    pub avg_divergence: f64,
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
