//! Sampling Loop
//!
//! Re-invokes a test body to build a timing distribution.
//!
//! ```text
//! ┌───────────────┐  ok   ┌──────────────┐  budget left & count < max
//! │ run iteration │──────▶│ record time  │───────────────────────────┐
//! └───────────────┘       └──────────────┘                           │
//!        ▲  │ failed             │ count == max / budget spent       │
//!        │  ▼                    ▼                                   │
//!        │ stop(Failed)     stop(MaxSamples | TimeBudget)            │
//!        └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Stop conditions are only evaluated between iterations, so at least one
//! iteration always runs.

use crate::measure::Timer;

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Collected the configured number of samples
    MaxSamples,
    /// Cumulative time reached the budget
    TimeBudget,
    /// An iteration failed
    Failed,
}

/// Samples collected by one loop
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOutcome {
    /// Elapsed milliseconds of every successful iteration, in order
    pub times: Vec<f64>,
    /// Why sampling ended
    pub stop: StopReason,
}

impl SamplingOutcome {
    /// Whether every iteration succeeded
    pub fn passed(&self) -> bool {
        self.stop != StopReason::Failed
    }
}

/// Run `iteration` until `max_samples` successes, the time budget is spent,
/// or an iteration returns `false`.
///
/// A `max_samples` of zero is treated as one.
pub fn run_sampling_loop<F>(max_samples: u32, max_run_time_ms: f64, mut iteration: F) -> SamplingOutcome
where
    F: FnMut() -> bool,
{
    let max_samples = max_samples.max(1) as usize;
    let mut times = Vec::with_capacity(max_samples.min(1024));
    let loop_timer = Timer::start();

    let stop = loop {
        let timer = Timer::start();
        let ok = iteration();
        let elapsed = timer.elapsed_ms();

        if !ok {
            break StopReason::Failed;
        }
        times.push(elapsed);

        if times.len() >= max_samples {
            break StopReason::MaxSamples;
        }
        if loop_timer.elapsed_ms() >= max_run_time_ms {
            break StopReason::TimeBudget;
        }
    };

    tracing::debug!(samples = times.len(), ?stop, "sampling finished");
    SamplingOutcome { times, stop }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_stops_at_max_samples() {
        let mut calls = 0;
        let outcome = run_sampling_loop(25, 60_000.0, || {
            calls += 1;
            true
        });

        assert_eq!(calls, 25);
        assert_eq!(outcome.times.len(), 25);
        assert_eq!(outcome.stop, StopReason::MaxSamples);
        assert!(outcome.passed());
    }

    #[test]
    fn test_stops_on_time_budget() {
        let outcome = run_sampling_loop(1_000, 5.0, || {
            std::thread::sleep(Duration::from_millis(2));
            true
        });

        assert_eq!(outcome.stop, StopReason::TimeBudget);
        assert!(!outcome.times.is_empty());
        assert!(outcome.times.len() < 1_000);
    }

    #[test]
    fn test_zero_budget_still_collects_one_sample() {
        let outcome = run_sampling_loop(10, 0.0, || true);
        assert_eq!(outcome.times.len(), 1);
        assert_eq!(outcome.stop, StopReason::TimeBudget);
    }

    #[test]
    fn test_zero_max_samples_runs_once() {
        let outcome = run_sampling_loop(0, 60_000.0, || true);
        assert_eq!(outcome.times.len(), 1);
        assert_eq!(outcome.stop, StopReason::MaxSamples);
    }

    #[test]
    fn test_failure_keeps_earlier_samples() {
        let mut calls = 0;
        let outcome = run_sampling_loop(100, 60_000.0, || {
            calls += 1;
            calls < 4
        });

        assert_eq!(calls, 4);
        assert_eq!(outcome.times.len(), 3);
        assert_eq!(outcome.stop, StopReason::Failed);
        assert!(!outcome.passed());
    }

    #[test]
    fn test_first_iteration_failure_has_no_samples() {
        let outcome = run_sampling_loop(100, 60_000.0, || false);
        assert!(outcome.times.is_empty());
        assert_eq!(outcome.stop, StopReason::Failed);
    }
}
