//! Game clock with decoupled logic and real time
//!
//! Every gameplay update consumes two durations: scaled logic time (affected
//! by pause and slow motion) and unscaled wall-clock time. The clock turns
//! raw frame deltas into that pair so timers that must ignore time scale
//! (network timeouts, real-time cooldowns) can run off the real component.

/// The time pair produced by one clock tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickDelta {
    /// Scaled logic time for this tick, in seconds.
    pub elapsed: f32,
    /// Unscaled wall-clock time for this tick, in seconds.
    pub real_elapsed: f32,
}

/// Converts frame deltas into scaled logic time.
///
/// `elapsed = real_elapsed * scale` while running, and zero while paused;
/// real time always advances.
#[derive(Debug, Clone)]
pub struct GameClock {
    scale: f32,
    paused: bool,
    total_elapsed: f32,
    total_real_elapsed: f32,
    ticks: u64,
}

impl GameClock {
    /// Create a clock running at real-time scale.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scale: 1.0,
            paused: false,
            total_elapsed: 0.0,
            total_real_elapsed: 0.0,
            ticks: 0,
        }
    }

    /// Set the time scale at construction.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.set_scale(scale);
        self
    }

    /// Change the time scale. Negative values clamp to zero.
    pub fn set_scale(&mut self, scale: f32) {
        self.scale = scale.max(0.0);
    }

    /// Current time scale.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Stop logic time; real time keeps advancing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume logic time.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether logic time is stopped.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance the clock by one frame delta.
    ///
    /// Negative deltas clamp to zero.
    pub fn tick(&mut self, real_delta: f32) -> TickDelta {
        let real_elapsed = real_delta.max(0.0);
        let elapsed = if self.paused {
            0.0
        } else {
            real_elapsed * self.scale
        };
        self.total_elapsed += elapsed;
        self.total_real_elapsed += real_elapsed;
        self.ticks += 1;
        TickDelta {
            elapsed,
            real_elapsed,
        }
    }

    /// Total scaled logic time since creation.
    #[must_use]
    pub fn total_elapsed(&self) -> f32 {
        self.total_elapsed
    }

    /// Total real time since creation.
    #[must_use]
    pub fn total_real_elapsed(&self) -> f32 {
        self.total_real_elapsed
    }

    /// Number of ticks taken.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}
