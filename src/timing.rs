//! Stage timing.

use std::time::{Duration, Instant};

/// Measures one pipeline stage.
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given stage name.
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Stop the timer, log the elapsed time and return it.
    pub fn finish(self) -> (&'static str, Duration) {
        let elapsed = self.start.elapsed();
        tracing::info!(stage = self.name, "done in {}", format_duration(elapsed));
        (self.name, elapsed)
    }
}

/// `1.5s` below a minute, `2.3m` above.
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 60.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}s", secs)
    }
}
