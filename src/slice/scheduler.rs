//! Change scheduler.
//!
//! Coalesces bursts of grid edits into one re-slice trigger. The delay is
//! chosen from the gap since the previous edit:
//!
//! - gap below the idle threshold (the user is dragging a slider): short delay
//! - otherwise (first edit, or the user paused): long delay
//!
//! Every edit replaces the pending value and pushes the deadline out, so
//! only the last edit of a burst fires. The scheduler is owned by one
//! slicer instance and driven from its control loop; it spawns nothing.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Gap below which edits count as one continuous drag.
pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_millis(200);

/// Delay used while the user is actively dragging.
pub const DEFAULT_SHORT_DELAY: Duration = Duration::from_millis(50);

/// Delay used for isolated edits.
pub const DEFAULT_LONG_DELAY: Duration = Duration::from_millis(300);

/// Debounce timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    pub idle_threshold: Duration,
    pub short_delay: Duration,
    pub long_delay: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            short_delay: DEFAULT_SHORT_DELAY,
            long_delay: DEFAULT_LONG_DELAY,
        }
    }
}

impl DebounceConfig {
    /// Check that continuous edits coalesce faster than isolated ones.
    pub fn validate(&self) -> Result<(), String> {
        if self.short_delay >= self.long_delay {
            return Err(format!(
                "short delay ({}ms) must be less than long delay ({}ms)",
                self.short_delay.as_millis(),
                self.long_delay.as_millis()
            ));
        }
        Ok(())
    }

    /// Delay for an edit arriving `gap` after the previous one (`None` for
    /// the first edit).
    pub fn delay_for(&self, gap: Option<Duration>) -> Duration {
        match gap {
            Some(gap) if gap < self.idle_threshold => self.short_delay,
            _ => self.long_delay,
        }
    }
}

/// Debounces values of type `T`, keeping only the latest.
#[derive(Debug)]
pub struct ChangeScheduler<T> {
    config: DebounceConfig,
    last_change: Option<Instant>,
    deadline: Option<Instant>,
    latest: Option<T>,
}

impl<T> ChangeScheduler<T> {
    pub fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            last_change: None,
            deadline: None,
            latest: None,
        }
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    /// Record an edit, replacing any pending value and rescheduling.
    ///
    /// Returns the delay chosen for this edit.
    pub fn notify_change(&mut self, value: T) -> Duration {
        let now = Instant::now();
        let gap = self.last_change.map(|t| now.saturating_duration_since(t));
        let delay = self.config.delay_for(gap);

        self.last_change = Some(now);
        self.deadline = Some(now + delay);
        self.latest = Some(value);
        delay
    }

    /// Whether a trigger is scheduled.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// When the pending trigger fires.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Drop the pending trigger, returning its value.
    pub fn cancel(&mut self) -> Option<T> {
        self.deadline = None;
        self.latest.take()
    }

    /// Wait for the pending trigger and return its value.
    ///
    /// Pends forever while nothing is scheduled. Cancel safe: dropping the
    /// future before it completes leaves the trigger scheduled.
    pub async fn fired(&mut self) -> T {
        loop {
            let Some(deadline) = self.deadline else {
                return std::future::pending().await;
            };
            sleep_until(deadline).await;

            // A newer edit may have moved the deadline while we slept
            if self.deadline == Some(deadline) {
                self.deadline = None;
                if let Some(value) = self.latest.take() {
                    return value;
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
