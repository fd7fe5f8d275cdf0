//! Loop counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static STEPS: AtomicU64 = AtomicU64::new(0);
static TOOL_FAILURES: AtomicU64 = AtomicU64::new(0);
static LLM_DECISIONS: AtomicU64 = AtomicU64::new(0);
static LLM_FALLBACKS: AtomicU64 = AtomicU64::new(0);
static RUNS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static RUNS_FAILED: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub steps: u64,
    pub tool_failures: u64,
    pub llm_decisions: u64,
    pub llm_fallbacks: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
}

pub fn record_step(failed: bool) {
    STEPS.fetch_add(1, Ordering::Relaxed);
    if failed {
        TOOL_FAILURES.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_llm_decision() {
    LLM_DECISIONS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_llm_fallback() {
    LLM_FALLBACKS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_run(completed: bool) {
    let counter = if completed { &RUNS_COMPLETED } else { &RUNS_FAILED };
    counter.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    MetricSnapshot {
        steps: STEPS.load(Ordering::Relaxed),
        tool_failures: TOOL_FAILURES.load(Ordering::Relaxed),
        llm_decisions: LLM_DECISIONS.load(Ordering::Relaxed),
        llm_fallbacks: LLM_FALLBACKS.load(Ordering::Relaxed),
        runs_completed: RUNS_COMPLETED.load(Ordering::Relaxed),
        runs_failed: RUNS_FAILED.load(Ordering::Relaxed),
    }
}
