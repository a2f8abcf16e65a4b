use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds, clamped.
    pub delta: f32,
    /// Time elapsed since the previous tick, in seconds.
    pub raw_delta: f32,
    /// Time elapsed since the clock was created, in seconds.
    pub elapsed: f32,
    /// Monotonic frame counter.
    pub frame_index: u64,
}

impl FrameTime {
    /// Instantaneous frames per second, measured on the unclamped delta.
    ///
    /// Zero when no time has elapsed since the previous tick.
    #[must_use]
    pub fn fps(&self) -> f32 {
        if self.raw_delta > 0.0 {
            self.raw_delta.recip()
        } else {
            0.0
        }
    }
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so that a stall (debugger, minimized window)
/// doesn't teleport the camera.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    delta_min: Duration,
    delta_max: Duration,
}

impl FrameClock {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    #[must_use]
    pub fn with_clamps(delta_min: Duration, delta_max: Duration) -> Self {
        debug_assert!(delta_min <= delta_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            delta_min,
            delta_max,
        }
    }

    /// Advances the clock.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let raw_delta = now.saturating_duration_since(self.last);
        let delta = raw_delta.clamp(self.delta_min, self.delta_max);
        self.last = now;

        let time = FrameTime {
            delta: delta.as_secs_f32(),
            raw_delta: raw_delta.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f32(),
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);

        time
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
