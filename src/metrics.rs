//! Proxy call counters surfaced on the health endpoint.
//!
//! One instance lives in the application state; the counters are relaxed
//! atomics because they are only ever reported, never used for control flow.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct ProxyMetrics {
    chat_calls: AtomicUsize,
    chat_failures: AtomicUsize,
    translate_calls: AtomicUsize,
    translate_failures: AtomicUsize,
    translate_fallbacks: AtomicUsize,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a chat request that reached the upstream.
    pub fn record_chat_call(&self) {
        self.chat_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_chat_failure(&self) {
        self.chat_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a translation request handed to the backend chain.
    pub fn record_translate_call(&self) {
        self.translate_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translate_failure(&self) {
        self.translate_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a translation that only succeeded on a secondary backend.
    pub fn record_translate_fallback(&self) {
        self.translate_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn report(&self) -> MetricsReport {
        let chat_calls = self.chat_calls.load(Ordering::Relaxed);
        let chat_failures = self.chat_failures.load(Ordering::Relaxed);
        let translate_calls = self.translate_calls.load(Ordering::Relaxed);
        let translate_failures = self.translate_failures.load(Ordering::Relaxed);

        MetricsReport {
            chat_calls,
            chat_failures,
            chat_success_rate: success_rate(chat_calls, chat_failures),
            translate_calls,
            translate_failures,
            translate_fallbacks: self.translate_fallbacks.load(Ordering::Relaxed),
            translate_success_rate: success_rate(translate_calls, translate_failures),
        }
    }
}

/// Percentage of calls that did not fail; 0 when nothing was called yet.
fn success_rate(calls: usize, failures: usize) -> f64 {
    if calls == 0 {
        return 0.0;
    }
    (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub chat_calls: usize,
    pub chat_failures: usize,
    /// 0-100
    pub chat_success_rate: f64,
    pub translate_calls: usize,
    pub translate_failures: usize,
    pub translate_fallbacks: usize,
    /// 0-100
    pub translate_success_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_chat_call_and_failure() {
        let metrics = ProxyMetrics::new();

        metrics.record_chat_call();
        metrics.record_chat_call();
        metrics.record_chat_failure();

        let report = metrics.report();
        assert_eq!(report.chat_calls, 2);
        assert_eq!(report.chat_failures, 1);
    }

    #[test]
    fn test_record_translate_counters() {
        let metrics = ProxyMetrics::new();

        metrics.record_translate_call();
        metrics.record_translate_fallback();

        let report = metrics.report();
        assert_eq!(report.translate_calls, 1);
        assert_eq!(report.translate_fallbacks, 1);
        assert_eq!(report.translate_failures, 0);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = ProxyMetrics::new().report();

        assert_eq!(report.chat_calls, 0);
        assert_eq!(report.chat_success_rate, 0.0);
        assert_eq!(report.translate_success_rate, 0.0);
    }

    #[test]
    fn test_report_success_rate() {
        let metrics = ProxyMetrics::new();

        // 4 calls, 1 failure = 75% success rate
        for _ in 0..4 {
            metrics.record_translate_call();
        }
        metrics.record_translate_failure();

        assert_eq!(metrics.report().translate_success_rate, 75.0);
    }

    #[test]
    fn test_report_all_failures() {
        let metrics = ProxyMetrics::new();

        metrics.record_chat_call();
        metrics.record_chat_failure();

        assert_eq!(metrics.report().chat_success_rate, 0.0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let json = serde_json::to_string(&ProxyMetrics::new().report()).expect("serialize");
        assert!(json.contains("chatSuccessRate"));
        assert!(json.contains("translateFallbacks"));
    }
}
