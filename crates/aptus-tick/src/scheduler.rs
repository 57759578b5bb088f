//! Fixed-interval scheduler.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Full configuration for the scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks. The first tick fires one interval after the
    /// scheduler is created, never immediately.
    pub interval: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

impl TickConfig {
    /// Four minutes, comfortably inside the portal's cookie lifetime.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(240);

    /// Shortest interval accepted. Anything below is clamped up.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// Create a config for a specific interval.
    pub fn every(interval: Duration) -> Self {
        Self { interval }
    }

    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_secs_f64() * 1000.0,
                "interval below minimum, clamping"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info (returned to caller each tick)
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// `true` if this tick fired late because the previous cycle's work
    /// ran past the deadline.
    pub overrun: bool,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-interval scheduler.
///
/// Call [`wait_for_tick`](Self::wait_for_tick) in a loop; do the periodic
/// work between calls. Time spent in the work counts against the next
/// interval. After an overrun the next tick is one interval from when
/// the late tick fired, so slow cycles never run back to back.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    next_tick: Instant,
}

impl TickScheduler {
    /// Create a new scheduler. The first tick is due one interval from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let next_tick = Instant::now() + config.interval;

        debug!(
            interval_secs = config.interval.as_secs_f64(),
            "tick scheduler created"
        );

        Self {
            config,
            tick_count: 0,
            next_tick,
        }
    }

    /// Create a scheduler for a specific interval.
    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig::every(interval))
    }

    /// Wait until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let next = self.next_tick;
        let interval = self.config.interval;

        time::sleep_until(next).await;

        let now = Instant::now();
        self.tick_count += 1;

        // >10% of an interval late = the previous cycle overran.
        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > interval / 10;
        if overrun {
            warn!(
                tick = self.tick_count,
                late_secs = late_by.as_secs_f64(),
                "tick overrun, rescheduling from now"
            );
            self.next_tick = now + interval;
        } else {
            self.next_tick = next + interval;
        }

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
        }
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// The configured interval (after clamping).
    pub fn interval(&self) -> Duration {
        self.config.interval
    }
}
