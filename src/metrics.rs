//! Metrics collection and export module

use crate::rpc_manager::SubmissionErrorKind;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::time::Instant;

/// Prometheus metrics for building, submitting and confirming transactions
pub struct EngineMetrics {
    registry: Registry,

    // Counters
    pub transactions_built: IntCounter,
    pub submissions_total: IntCounter,
    pub submission_errors: IntCounterVec,
    pub confirmed_total: IntCounter,
    pub failed_total: IntCounter,
    pub timed_out_total: IntCounter,
    pub fatal_total: IntCounter,

    // Histograms
    pub build_latency: Histogram,
    pub confirm_latency: Histogram,
}

impl EngineMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let transactions_built = IntCounter::with_opts(Opts::new(
            "txflow_transactions_built_total",
            "Number of signed transactions produced by the builder",
        ))?;

        let submissions_total = IntCounter::with_opts(Opts::new(
            "txflow_submissions_total",
            "Number of submissions to the primary endpoint",
        ))?;

        let submission_errors = IntCounterVec::new(
            Opts::new(
                "txflow_submission_errors_total",
                "Primary endpoint submission errors by class",
            ),
            &["kind"],
        )?;

        let confirmed_total = IntCounter::with_opts(Opts::new(
            "txflow_confirmed_total",
            "Transactions that landed and executed successfully",
        ))?;

        let failed_total = IntCounter::with_opts(Opts::new(
            "txflow_failed_total",
            "Transactions that landed with an execution error",
        ))?;

        let timed_out_total = IntCounter::with_opts(Opts::new(
            "txflow_timed_out_total",
            "Confirmations abandoned at the deadline",
        ))?;

        let fatal_total = IntCounter::with_opts(Opts::new(
            "txflow_fatal_total",
            "Confirmations stopped by a program rejection",
        ))?;

        let build_latency = Histogram::with_opts(
            HistogramOpts::new("txflow_build_latency_seconds", "Transaction build latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;

        let confirm_latency = Histogram::with_opts(
            HistogramOpts::new(
                "txflow_confirm_latency_seconds",
                "Time from first submission to a terminal outcome",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 45.0, 90.0]),
        )?;

        registry.register(Box::new(transactions_built.clone()))?;
        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submission_errors.clone()))?;
        registry.register(Box::new(confirmed_total.clone()))?;
        registry.register(Box::new(failed_total.clone()))?;
        registry.register(Box::new(timed_out_total.clone()))?;
        registry.register(Box::new(fatal_total.clone()))?;
        registry.register(Box::new(build_latency.clone()))?;
        registry.register(Box::new(confirm_latency.clone()))?;

        Ok(Self {
            registry,
            transactions_built,
            submissions_total,
            submission_errors,
            confirmed_total,
            failed_total,
            timed_out_total,
            fatal_total,
            build_latency,
            confirm_latency,
        })
    }

    /// Get the registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_submission_error(&self, kind: SubmissionErrorKind) {
        self.submission_errors
            .with_label_values(&[kind.as_str()])
            .inc();
    }
}

/// Timer helper for measuring operation duration
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn observe_duration(&self, histogram: &Histogram) {
        histogram.observe(self.elapsed_secs());
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.transactions_built.inc();
        metrics.record_submission_error(SubmissionErrorKind::StaleBlockhash);
        metrics.record_submission_error(SubmissionErrorKind::StaleBlockhash);

        assert_eq!(metrics.transactions_built.get(), 1);
        assert_eq!(
            metrics
                .submission_errors
                .with_label_values(&["stale_blockhash"])
                .get(),
            2
        );
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_timer_observes() {
        let metrics = EngineMetrics::new().unwrap();
        Timer::new().observe_duration(&metrics.build_latency);
        assert_eq!(metrics.build_latency.get_sample_count(), 1);
    }
}
