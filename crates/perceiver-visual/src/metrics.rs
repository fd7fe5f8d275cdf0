//! Visual check counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static CHECK_TOTAL: AtomicU64 = AtomicU64::new(0);
static CHECK_BOOTSTRAPPED: AtomicU64 = AtomicU64::new(0);
static CHECK_DIFFERENT: AtomicU64 = AtomicU64::new(0);
static CHECK_FAILED: AtomicU64 = AtomicU64::new(0);
static DIFF_LAT_NS: AtomicU64 = AtomicU64::new(0);
static DIFF_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Bootstrapped,
    Matched,
    Different,
    Failed,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub checks: u64,
    pub bootstrapped: u64,
    pub with_differences: u64,
    pub failed: u64,
    pub diff_avg_ms: f64,
}

pub fn record_check(outcome: CheckOutcome) {
    CHECK_TOTAL.fetch_add(1, Ordering::Relaxed);
    match outcome {
        CheckOutcome::Bootstrapped => {
            CHECK_BOOTSTRAPPED.fetch_add(1, Ordering::Relaxed);
        }
        CheckOutcome::Different => {
            CHECK_DIFFERENT.fetch_add(1, Ordering::Relaxed);
        }
        CheckOutcome::Failed => {
            CHECK_FAILED.fetch_add(1, Ordering::Relaxed);
        }
        CheckOutcome::Matched => {}
    }
}

pub fn record_diff_latency(duration: Duration) {
    let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
    DIFF_LAT_NS.fetch_add(nanos, Ordering::Relaxed);
    DIFF_LAT_SAMPLES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    let samples = DIFF_LAT_SAMPLES.load(Ordering::Relaxed);
    let diff_avg_ms = if samples == 0 {
        0.0
    } else {
        (DIFF_LAT_NS.load(Ordering::Relaxed) as f64 / samples as f64) / 1_000_000.0
    };
    MetricSnapshot {
        checks: CHECK_TOTAL.load(Ordering::Relaxed),
        bootstrapped: CHECK_BOOTSTRAPPED.load(Ordering::Relaxed),
        with_differences: CHECK_DIFFERENT.load(Ordering::Relaxed),
        failed: CHECK_FAILED.load(Ordering::Relaxed),
        diff_avg_ms,
    }
}
