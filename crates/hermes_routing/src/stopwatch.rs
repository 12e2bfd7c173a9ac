use std::{
    fmt::Display,
    time::{Duration, Instant},
};

use tracing::debug;

/// Measures a named phase of route creation and reports it at debug level.
pub struct Stopwatch {
    started_at: Instant,
    phase: &'static str,
}

impl Stopwatch {
    pub fn start(phase: &'static str) -> Self {
        Self {
            started_at: Instant::now(),
            phase,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn report(&self) {
        debug!(phase = self.phase, elapsed = ?self.elapsed(), "route phase finished");
    }

    /// Reports the elapsed time and restarts the stopwatch for the next phase.
    pub fn lap(&mut self, next_phase: &'static str) {
        self.report();
        self.phase = next_phase;
        self.started_at = Instant::now();
    }
}

impl Display for Stopwatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {:?}", self.phase, self.elapsed())
    }
}
