//! Run Context
//!
//! Bookkeeping for one group or test invocation that never lands on the
//! result model directly: when it started and whether anything failed.

use wasmjig_core::Timer;

/// Transient state threaded through one group's or one test's run
#[derive(Debug)]
pub struct RunContext {
    timer: Timer,
    pass: bool,
    failure: Option<String>,
}

impl RunContext {
    /// Start timing a new invocation
    pub fn start() -> Self {
        Self {
            timer: Timer::start(),
            pass: true,
            failure: None,
        }
    }

    /// Record a failure; the first reason is kept
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.pass = false;
        self.failure.get_or_insert_with(|| reason.into());
    }

    /// Whether nothing has failed yet
    pub fn passing(&self) -> bool {
        self.pass
    }

    /// The first recorded failure reason
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Milliseconds since the invocation started
    pub fn elapsed_ms(&self) -> f64 {
        self.timer.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_kept() {
        let mut context = RunContext::start();
        assert!(context.passing());

        context.fail("beforeAll hook failed");
        context.fail("afterAll hook failed");

        assert!(!context.passing());
        assert_eq!(context.failure(), Some("beforeAll hook failed"));
        assert!(context.elapsed_ms() >= 0.0);
    }
}
