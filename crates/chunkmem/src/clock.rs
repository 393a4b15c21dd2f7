//! Frame clock built from whole wall-clock seconds plus the sub-second part.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of wall-clock time.
pub trait WallTime {
    /// Time since the Unix epoch.
    fn now(&self) -> Duration;
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallTime;

impl WallTime for SystemWallTime {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

impl<W: WallTime + ?Sized> WallTime for &W {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Monotonic seconds counter fed by a [`WallTime`] source.
///
/// Each reading adds the whole seconds elapsed since the previous one, then
/// the fractional part of the current wall second. A backwards jump of the
/// wall clock resynchronizes without advancing.
#[derive(Debug)]
pub struct FrameClock<W = SystemWallTime> {
    source: W,
    seconds: u64,
    last_wall_secs: u64,
    last_reading: f64,
}

impl FrameClock<SystemWallTime> {
    /// Clock on the system wall time, starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(SystemWallTime)
    }
}

impl Default for FrameClock<SystemWallTime> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WallTime> FrameClock<W> {
    /// Clock on a custom source, starting at zero.
    pub fn with_source(source: W) -> Self {
        let last_wall_secs = source.now().as_secs();
        Self {
            source,
            seconds: 0,
            last_wall_secs,
            last_reading: 0.0,
        }
    }

    /// Current time in seconds. Never decreases.
    #[allow(clippy::cast_precision_loss)]
    pub fn now(&mut self) -> f64 {
        let wall = self.source.now();
        let secs = wall.as_secs();
        if secs >= self.last_wall_secs {
            self.seconds += secs - self.last_wall_secs;
        } else {
            tracing::debug!(from = self.last_wall_secs, to = secs, "wall clock went backwards");
        }
        self.last_wall_secs = secs;

        let reading = self.seconds as f64 + f64::from(wall.subsec_micros()) / 1_000_000.0;
        self.last_reading = reading.max(self.last_reading);
        self.last_reading
    }

    /// Time elapsed since an earlier reading `start`.
    pub fn elapsed_since(&mut self, start: f64) -> Duration {
        Duration::from_secs_f64((self.now() - start).max(0.0))
    }
}
