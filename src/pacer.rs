//! Drift-free pacing between frames.

use std::time::{Duration, Instant};

use crate::termination::{Sleep, Termination};

/// Periodic frame timer.
///
/// Ticks fall on a fixed grid `start + k * interval`. Waiting blocks until
/// the next tick on the grid. Ticks that pass while the caller is busy are
/// coalesced: the next wait returns at once and the following one lands
/// back on the grid. The average frame period therefore tracks the
/// interval instead of growing by the rendering time of every frame.
///
/// A zero interval disables pacing entirely.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use tmv::{FramePacer, Termination};
///
/// let mut pacer = FramePacer::new(Duration::ZERO);
/// let token = Termination::new();
///
/// // Pacing is a no-op with no delay configured.
/// assert!(!pacer.is_enabled());
/// pacer.arm();
/// pacer.wait_for_next_tick(&token);
/// ```
#[derive(Clone, Debug)]
pub struct FramePacer {
    /// Minimum time between ticks
    interval: Duration,
    /// Next tick on the grid, once armed
    next_tick: Option<Instant>,
}

impl FramePacer {
    /// Create an unarmed pacer with the given minimum interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
        }
    }

    /// Change the interval. The pacer must be re-armed afterwards.
    pub fn configure(&mut self, interval: Duration) {
        self.interval = interval;
        self.next_tick = None;
    }

    /// Get the configured interval.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check if pacing does anything.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Check if the tick grid has been started.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Start the tick grid now. The first tick is one interval away.
    pub fn arm(&mut self) {
        self.arm_at(Instant::now());
    }

    /// Start the tick grid at `now`.
    pub fn arm_at(&mut self, now: Instant) {
        if self.is_enabled() {
            self.next_tick = Some(now + self.interval);
        }
    }

    /// Work out the deadline of the wait that starts at `now`, advancing
    /// the grid past it.
    ///
    /// Returns `None` when the caller should not block: pacing is disabled,
    /// or a tick already fired while the caller was busy.
    pub fn schedule(&mut self, now: Instant) -> Option<Instant> {
        if !self.is_enabled() {
            return None;
        }

        let next = match self.next_tick {
            Some(next) => next,
            None => {
                self.arm_at(now);
                self.next_tick?
            }
        };

        if now < next {
            self.next_tick = Some(next + self.interval);
            return Some(next);
        }

        // One or more ticks passed; they count as a single pending tick.
        let behind = now.duration_since(next).as_nanos();
        let missed = behind / self.interval.as_nanos();
        self.next_tick = Some(next + self.grid_offset(missed + 1));
        None
    }

    /// Duration of `ticks` intervals, saturating instead of overflowing.
    fn grid_offset(&self, ticks: u128) -> Duration {
        let nanos = self.interval.as_nanos().saturating_mul(ticks);
        let secs = u64::try_from(nanos / 1_000_000_000).unwrap_or(u64::MAX);
        Duration::new(secs, (nanos % 1_000_000_000) as u32)
    }

    /// Block until the next tick, or until termination is requested.
    ///
    /// The caller checks `termination` after this returns; an interrupted
    /// wait is not an error.
    pub fn wait_for_next_tick(&mut self, termination: &Termination) -> Sleep {
        match self.schedule(Instant::now()) {
            Some(deadline) => termination.sleep_until(deadline),
            None if termination.is_requested() => Sleep::Interrupted,
            None => Sleep::Elapsed,
        }
    }
}
