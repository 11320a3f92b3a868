//! Workload simulator.
//!
//! # Responsibilities
//! - Produce CPU-bound busy-work of parameterized intensity
//! - Stand in for fraud-check latency in the transaction pipeline
//! - Generate host-metrics load for the maintenance endpoint
//!
//! # Design Decisions
//! - Real arithmetic work, not a sleep: the point is to burn measurable CPU
//!   so host metrics correlate with traces
//! - No I/O and no allocation growth inside the burn loop
//! - Not cooperatively cancellable; runs to completion on the calling task

use std::hint::black_box;
use std::time::{Duration, Instant};

/// Perform `intensity` iterations of square-root accumulation and return the
/// wall-clock time it took.
pub fn burn(intensity: u64) -> Duration {
    let start = Instant::now();
    let mut acc = 0.0f64;
    for i in 0..intensity {
        acc += (i as f64).sqrt();
    }
    black_box(acc);
    start.elapsed()
}

/// Generate `len` uniformly random values, sort them, and return the elapsed
/// wall-clock time.
pub fn random_sort(len: usize) -> Duration {
    let start = Instant::now();
    let mut data: Vec<f64> = (0..len).map(|_| fastrand::f64()).collect();
    data.sort_unstable_by(f64::total_cmp);
    black_box(data.last().copied());
    start.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burn_runs_to_completion() {
        let elapsed = burn(100_000);
        assert!(elapsed.as_nanos() > 0);
    }

    #[test]
    fn burn_zero_intensity_is_instant() {
        // Zero work is legal; the caller controls intensity.
        let elapsed = burn(0);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn random_sort_measures_elapsed_time() {
        let elapsed = random_sort(100_000);
        assert!(elapsed.as_nanos() > 0);
    }
}
