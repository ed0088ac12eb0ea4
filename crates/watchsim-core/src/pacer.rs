//! Wall-clock adapter: converts elapsed real time into simulated time.
//!
//! The adapter is the simulation engine's own clock, distinct from the
//! device clock it drives. Each frame it measures the real time elapsed
//! since the previous frame, multiplies by the speed factor, and hands
//! the resulting simulated delta to the caller.
//!
//! Pacing is speed-adaptive: at low speeds the loop reschedules at a
//! render-synchronized cadence (~16 ms) to keep dashboard updates
//! fluid, while above [`PacingConfig::frame_sync_max_speed`] it drops
//! to a minimum-delay timer (~5 ms) so the frame rate never caps
//! simulated throughput. Both cadences and the threshold are
//! configuration, not hardcoded constants.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tracing::warn;

/// Lowest accepted speed multiplier.
pub const MIN_SPEED: u32 = 1;

/// Highest accepted speed multiplier.
pub const MAX_SPEED: u32 = 1000;

/// Frame pacing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PacingConfig {
    /// Render-synchronized cadence in milliseconds (low speeds).
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,

    /// Minimum-delay cadence in milliseconds (high speeds).
    #[serde(default = "default_turbo_interval_ms")]
    pub turbo_interval_ms: u64,

    /// Highest speed that still uses the render-synchronized cadence.
    #[serde(default = "default_frame_sync_max_speed")]
    pub frame_sync_max_speed: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
            turbo_interval_ms: default_turbo_interval_ms(),
            frame_sync_max_speed: default_frame_sync_max_speed(),
        }
    }
}

const fn default_frame_interval_ms() -> u64 {
    16
}

const fn default_turbo_interval_ms() -> u64 {
    5
}

const fn default_frame_sync_max_speed() -> u32 {
    20
}

/// The rescheduling strategy selected for a given speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStrategy {
    /// Render-synchronized cadence for smooth visual updates.
    FrameSynced,
    /// Minimum-delay timer to avoid frame-rate throughput ceilings.
    MinimumDelay,
}

impl FrameStrategy {
    /// Select the strategy for `speed` under the given pacing config.
    pub const fn for_speed(speed: u32, pacing: &PacingConfig) -> Self {
        if speed > pacing.frame_sync_max_speed {
            Self::MinimumDelay
        } else {
            Self::FrameSynced
        }
    }

    /// The reschedule delay this strategy imposes.
    pub const fn interval(self, pacing: &PacingConfig) -> Duration {
        match self {
            Self::FrameSynced => Duration::from_millis(pacing.frame_interval_ms),
            Self::MinimumDelay => Duration::from_millis(pacing.turbo_interval_ms),
        }
    }
}

/// Converts elapsed wall-clock time into simulated-time deltas.
///
/// Not the device clock: this is the engine-side pacing component that
/// feeds deltas into the device. All wall-clock reads go through the
/// explicit `*_at(Instant)` variants so tests can drive the adapter
/// with synthetic instants.
#[derive(Debug, Clone)]
pub struct WallClockAdapter {
    /// Speed multiplier, always within `[MIN_SPEED, MAX_SPEED]`.
    speed: u32,

    /// Whether the scheduling loop should keep running.
    running: bool,

    /// Pacing cadences and threshold.
    pacing: PacingConfig,

    /// Wall-clock instant of `start`, while running.
    real_start: Option<Instant>,

    /// Wall-clock instant of the previous frame, while running.
    last_frame: Option<Instant>,

    /// Total simulated milliseconds produced since the last reset.
    simulated_elapsed_ms: f64,

    /// Number of frames processed since the last reset.
    frame_index: u64,
}

impl WallClockAdapter {
    /// Create an adapter at the requested speed.
    ///
    /// An out-of-range speed is rejected with a warning and the adapter
    /// starts at [`MIN_SPEED`] instead.
    pub fn new(speed: u32, pacing: PacingConfig) -> Self {
        let mut adapter = Self {
            speed: MIN_SPEED,
            running: false,
            pacing,
            real_start: None,
            last_frame: None,
            simulated_elapsed_ms: 0.0,
            frame_index: 0,
        };
        adapter.set_speed(speed);
        adapter
    }

    /// Start the adapter, capturing the current instant as the origin.
    /// Idempotent: starting a running adapter is a no-op.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Start with an explicit wall-clock origin (test hook).
    pub fn start_at(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.real_start = Some(now);
        self.last_frame = Some(now);
    }

    /// Pause the adapter. Idempotent; cancels any pending reschedule
    /// (callers observe this via [`next_delay`] returning `None`).
    ///
    /// [`next_delay`]: WallClockAdapter::next_delay
    pub const fn pause(&mut self) {
        self.running = false;
    }

    /// Set the speed multiplier.
    ///
    /// Values outside `[MIN_SPEED, MAX_SPEED]` are rejected: a warning
    /// is logged and the previous speed is retained. A valid change
    /// takes effect on the next frame.
    pub fn set_speed(&mut self, speed: u32) {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            warn!(
                requested = speed,
                current = self.speed,
                "speed must be between {MIN_SPEED} and {MAX_SPEED}, keeping current"
            );
            return;
        }
        self.speed = speed;
    }

    /// Current speed multiplier.
    pub const fn speed(&self) -> u32 {
        self.speed
    }

    /// Whether the adapter is running.
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The reschedule strategy in effect at the current speed.
    pub const fn strategy(&self) -> FrameStrategy {
        FrameStrategy::for_speed(self.speed, &self.pacing)
    }

    /// Delay until the next frame, or `None` when paused.
    ///
    /// `None` is the cancellation signal: a paused adapter must never
    /// be rescheduled.
    pub const fn next_delay(&self) -> Option<Duration> {
        if self.running {
            Some(self.strategy().interval(&self.pacing))
        } else {
            None
        }
    }

    /// Process one frame at the current instant, returning the
    /// simulated-time delta in milliseconds.
    pub fn frame(&mut self) -> f64 {
        self.frame_at(Instant::now())
    }

    /// Process one frame with an explicit instant (test hook).
    ///
    /// Returns 0.0 when the adapter is not running.
    pub fn frame_at(&mut self, now: Instant) -> f64 {
        if !self.running {
            return 0.0;
        }

        let real_delta_ms = self
            .last_frame
            .map_or(0.0, |last| now.saturating_duration_since(last).as_secs_f64() * 1000.0);
        self.last_frame = Some(now);

        let simulated_delta_ms = real_delta_ms * f64::from(self.speed);
        self.simulated_elapsed_ms += simulated_delta_ms;
        self.frame_index = self.frame_index.saturating_add(1);

        simulated_delta_ms
    }

    /// Total simulated milliseconds produced since the last reset.
    pub const fn elapsed_simulated_ms(&self) -> f64 {
        self.simulated_elapsed_ms
    }

    /// Elapsed real milliseconds since `start`, or 0 when not running.
    pub fn elapsed_real_ms(&self) -> f64 {
        self.elapsed_real_ms_at(Instant::now())
    }

    /// Elapsed real milliseconds at an explicit instant (test hook).
    pub fn elapsed_real_ms_at(&self, now: Instant) -> f64 {
        if !self.running {
            return 0.0;
        }
        self.real_start
            .map_or(0.0, |start| now.saturating_duration_since(start).as_secs_f64() * 1000.0)
    }

    /// Number of frames processed since the last reset.
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Pause and zero all elapsed counters. Speed is retained.
    pub const fn reset(&mut self) {
        self.pause();
        self.simulated_elapsed_ms = 0.0;
        self.frame_index = 0;
        self.real_start = None;
        self.last_frame = None;
    }
}
