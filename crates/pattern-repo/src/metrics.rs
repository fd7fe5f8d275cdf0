use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static QUERY_TOTAL: AtomicU64 = AtomicU64::new(0);
static QUERY_MISS: AtomicU64 = AtomicU64::new(0);
static SOURCES_RETURNED: AtomicU64 = AtomicU64::new(0);
static SUMMARY_FALLBACK: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub queries: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub sources_returned: u64,
    pub summary_fallbacks: u64,
}

pub fn record_query(hits: usize) {
    QUERY_TOTAL.fetch_add(1, Ordering::Relaxed);
    if hits == 0 {
        QUERY_MISS.fetch_add(1, Ordering::Relaxed);
    }
    SOURCES_RETURNED.fetch_add(hits as u64, Ordering::Relaxed);
}

pub fn record_summary_fallback() {
    SUMMARY_FALLBACK.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    let queries = QUERY_TOTAL.load(Ordering::Relaxed);
    let misses = QUERY_MISS.load(Ordering::Relaxed);
    let hit_rate = if queries == 0 {
        0.0
    } else {
        (queries - misses) as f64 / queries as f64
    };
    MetricSnapshot {
        queries,
        misses,
        hit_rate,
        sources_returned: SOURCES_RETURNED.load(Ordering::Relaxed),
        summary_fallbacks: SUMMARY_FALLBACK.load(Ordering::Relaxed),
    }
}
