//! Heal outcome counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::types::HealStatus;

static HEAL_HEALED: AtomicU64 = AtomicU64::new(0);
static HEAL_NOTHING: AtomicU64 = AtomicU64::new(0);
static HEAL_UNVERIFIED: AtomicU64 = AtomicU64::new(0);
static HEAL_FAILED: AtomicU64 = AtomicU64::new(0);
static LLM_FALLBACKS: AtomicU64 = AtomicU64::new(0);
static HEAL_LAT_NS: AtomicU64 = AtomicU64::new(0);
static HEAL_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub healed: u64,
    pub nothing_to_fix: u64,
    pub no_verified_replacement: u64,
    pub failed: u64,
    pub llm_fallbacks: u64,
    pub avg_ms: f64,
}

pub fn record_heal(status: Option<HealStatus>, duration: Duration) {
    let counter = match status {
        Some(HealStatus::Healed) => &HEAL_HEALED,
        Some(HealStatus::NothingToFix) => &HEAL_NOTHING,
        Some(HealStatus::NoVerifiedReplacement) => &HEAL_UNVERIFIED,
        None => &HEAL_FAILED,
    };
    counter.fetch_add(1, Ordering::Relaxed);
    let nanos = duration.as_nanos().min(u128::from(u64::MAX)) as u64;
    HEAL_LAT_NS.fetch_add(nanos, Ordering::Relaxed);
    HEAL_LAT_SAMPLES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_llm_fallback() {
    LLM_FALLBACKS.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    let samples = HEAL_LAT_SAMPLES.load(Ordering::Relaxed);
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (HEAL_LAT_NS.load(Ordering::Relaxed) as f64 / samples as f64) / 1_000_000.0
    };
    MetricSnapshot {
        healed: HEAL_HEALED.load(Ordering::Relaxed),
        nothing_to_fix: HEAL_NOTHING.load(Ordering::Relaxed),
        no_verified_replacement: HEAL_UNVERIFIED.load(Ordering::Relaxed),
        failed: HEAL_FAILED.load(Ordering::Relaxed),
        llm_fallbacks: LLM_FALLBACKS.load(Ordering::Relaxed),
        avg_ms,
    }
}
