//! Telemetry helpers for the page inspector.
//!
//! Lightweight counters + latency aggregates so the CLI can surface basic
//! metrics without an external metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static INSPECT_TOTAL: AtomicU64 = AtomicU64::new(0);
static INSPECT_FAILED: AtomicU64 = AtomicU64::new(0);
static INSPECT_ELEMENTS: AtomicU64 = AtomicU64::new(0);
static INSPECT_LAT_NS: AtomicU64 = AtomicU64::new(0);
static INSPECT_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub inspect: MetricCounter,
    pub failed: u64,
    pub elements_captured: u64,
}

pub fn record_inspect(elements: Option<usize>, duration: Duration) {
    INSPECT_TOTAL.fetch_add(1, Ordering::Relaxed);
    match elements {
        Some(count) => {
            INSPECT_ELEMENTS.fetch_add(count as u64, Ordering::Relaxed);
        }
        None => {
            INSPECT_FAILED.fetch_add(1, Ordering::Relaxed);
        }
    }
    let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
    INSPECT_LAT_NS.fetch_add(nanos, Ordering::Relaxed);
    INSPECT_LAT_SAMPLES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    let samples = INSPECT_LAT_SAMPLES.load(Ordering::Relaxed);
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (INSPECT_LAT_NS.load(Ordering::Relaxed) as f64 / samples as f64) / 1_000_000.0
    };
    MetricSnapshot {
        inspect: MetricCounter {
            total: INSPECT_TOTAL.load(Ordering::Relaxed),
            avg_ms,
        },
        failed: INSPECT_FAILED.load(Ordering::Relaxed),
        elements_captured: INSPECT_ELEMENTS.load(Ordering::Relaxed),
    }
}
