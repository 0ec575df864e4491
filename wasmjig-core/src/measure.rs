//! Wall-Clock Timing
//!
//! Test bodies are timed with the monotonic clock and reported in
//! fractional milliseconds.

use std::time::Instant;

/// Timer for a single guest invocation or a whole loop
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds elapsed since the timer started
    #[inline(always)]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timer_elapsed() {
        let timer = Timer::start();
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();

        // Should be at least ~10ms, with slack for coarse clocks
        assert!(elapsed >= 5.0);
        // Should be well under a second (accounting for scheduling)
        assert!(elapsed < 1000.0);
    }

    #[test]
    fn test_timer_monotonic() {
        let timer = Timer::start();
        let a = timer.elapsed_ms();
        let b = timer.elapsed_ms();
        assert!(b >= a);
    }
}
