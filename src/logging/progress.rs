//! Grid search progress observers

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::info;

/// Receives `(completed, total)` updates while a sweep runs.
///
/// Called from worker threads when the sweep is parallel, so implementations
/// must be `Send + Sync`. Completion order is not guaranteed to be monotonic
/// across threads, but `completed == total` is reported exactly once.
pub trait SweepProgress: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

impl<F> SweepProgress for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}

/// Discards every update
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl SweepProgress for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

#[derive(Debug, Default)]
struct Cadence {
    last_line: Option<Instant>,
    /// Updates swallowed since `last_line`
    quiet: usize,
}

/// Emits progress through `tracing`: at most one line per `every`, plus the
/// final update. Each line reports how many updates were folded into it.
#[derive(Debug)]
pub struct TracingProgress {
    sweep: String,
    every: Duration,
    cadence: Mutex<Cadence>,
}

impl TracingProgress {
    pub fn new(sweep: impl Into<String>, every: Duration) -> Self {
        Self {
            sweep: sweep.into(),
            every,
            cadence: Mutex::new(Cadence::default()),
        }
    }

    /// `Some(folded)` when an update at `now` gets its own line, where
    /// `folded` counts the updates swallowed since the previous line.
    fn due(&self, now: Instant, completed: usize, total: usize) -> Option<usize> {
        let mut cadence = match self.cadence.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let waited = cadence
            .last_line
            .map_or(true, |at| now.duration_since(at) >= self.every);
        if waited || completed == total {
            cadence.last_line = Some(now);
            Some(std::mem::take(&mut cadence.quiet))
        } else {
            cadence.quiet += 1;
            None
        }
    }
}

impl Default for TracingProgress {
    fn default() -> Self {
        Self::new("grid_search", Duration::from_secs(2))
    }
}

impl SweepProgress for TracingProgress {
    fn on_progress(&self, completed: usize, total: usize) {
        let Some(folded) = self.due(Instant::now(), completed, total) else {
            return;
        };
        let pct = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        info!(
            sweep = %self.sweep,
            completed,
            total,
            pct = %format_args!("{:.1}", pct),
            folded,
            "Sweep progress"
        );
    }
}
