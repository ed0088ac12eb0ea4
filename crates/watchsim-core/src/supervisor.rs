//! Run supervision: pacing, progress, and completion.
//!
//! The supervisor owns the device, the wall-clock adapter, and the
//! event dispatcher. Each frame it converts elapsed real time into a
//! simulated delta, advances the device, fans the resulting events out
//! to listeners, and then checks progress. When the configured duration
//! has fully elapsed it pauses the adapter and raises a completion
//! event, exactly once per run.

use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;
use watchsim_types::{DeviceState, EventEnvelope, SimulationEvent};

use crate::archetype;
use crate::device::DeviceOrchestrator;
use crate::dispatch::{Dispatcher, ListenerError};
use crate::pacer::WallClockAdapter;

/// Simulated milliseconds in one day.
const MS_PER_DAY: f64 = 86_400_000.0;

/// A point-in-time snapshot of the run, for logging and UIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    /// Current simulated device time.
    pub simulated_time: NaiveDateTime,
    /// Lifetime whole steps emitted.
    pub total_steps: u64,
    /// The device's current power state.
    pub current_state: DeviceState,
    /// Completed fraction of the configured duration, 0-100.
    pub progress: f64,
    /// Current speed multiplier.
    pub speed: u32,
    /// Whether the run is currently advancing.
    pub running: bool,
    /// Whether the configured duration has fully elapsed.
    pub completed: bool,
}

/// Drives a device through a fixed-duration simulation run.
#[derive(Debug)]
pub struct SimulationSupervisor {
    device: DeviceOrchestrator,
    adapter: WallClockAdapter,
    dispatcher: Dispatcher,
    duration_days: u32,
    total_duration_ms: f64,
    completed: bool,
}

impl SimulationSupervisor {
    /// Supervise `device` for `duration_days` simulated days.
    pub fn new(device: DeviceOrchestrator, adapter: WallClockAdapter, duration_days: u32) -> Self {
        Self {
            device,
            adapter,
            dispatcher: Dispatcher::new(),
            duration_days,
            total_duration_ms: f64::from(duration_days) * MS_PER_DAY,
            completed: false,
        }
    }

    /// Register an event listener under a label used in failure logs.
    pub fn subscribe<F>(&mut self, label: impl Into<String>, listener: F)
    where
        F: FnMut(&EventEnvelope) -> Result<(), ListenerError> + Send + 'static,
    {
        self.dispatcher.subscribe(label, listener);
    }

    /// Process one frame at the current wall-clock instant.
    pub fn frame(&mut self) {
        self.frame_at(Instant::now());
    }

    /// Process one frame with an explicit instant (test hook).
    pub fn frame_at(&mut self, now: Instant) {
        let delta_ms = self.adapter.frame_at(now);
        for envelope in self.device.advance(delta_ms) {
            self.dispatcher.dispatch(&envelope);
        }

        if !self.completed && self.progress() >= 100.0 && self.adapter.is_running() {
            self.adapter.pause();
            self.completed = true;
            info!(
                total_steps = self.device.total_steps(),
                duration_days = self.duration_days,
                "simulation complete"
            );
            let envelope = EventEnvelope::new(
                self.device.current_time(),
                SimulationEvent::SimulationComplete {
                    total_steps: self.device.total_steps(),
                    duration_days: self.duration_days,
                },
            );
            self.dispatcher.dispatch(&envelope);
        }
    }

    /// Completed fraction of the configured duration, clamped to 100.
    pub fn progress(&self) -> f64 {
        if self.total_duration_ms <= 0.0 {
            return 100.0;
        }
        (self.adapter.elapsed_simulated_ms() / self.total_duration_ms * 100.0).min(100.0)
    }

    /// Begin (or resume) advancing simulated time.
    pub fn start(&mut self) {
        self.adapter.start();
    }

    /// Stop advancing simulated time. Idempotent.
    pub const fn pause(&mut self) {
        self.adapter.pause();
    }

    /// Return to an unstarted run at `start` (or wall-clock now when
    /// `None`), clearing all device state and the completion latch.
    pub fn reset(&mut self, start: Option<NaiveDateTime>) {
        self.adapter.reset();
        self.device.reset(start);
        self.completed = false;
    }

    /// Change the speed multiplier; out-of-range values are rejected
    /// with a warning and the previous speed is retained.
    pub fn set_speed(&mut self, speed: u32) {
        self.adapter.set_speed(speed);
    }

    /// Switch to the named wearer archetype, falling back to the
    /// default profile when the id is unknown. Step counters restart.
    pub fn set_archetype(&mut self, id: &str) {
        self.device.set_archetype(archetype::by_id(id));
    }

    /// Delay until the next frame, or `None` when paused.
    pub const fn next_delay(&self) -> Option<Duration> {
        self.adapter.next_delay()
    }

    /// Whether the configured duration has fully elapsed.
    pub const fn is_complete(&self) -> bool {
        self.completed
    }

    /// Whether the run is currently advancing.
    pub const fn is_running(&self) -> bool {
        self.adapter.is_running()
    }

    /// The supervised device, for queries.
    pub const fn device(&self) -> &DeviceOrchestrator {
        &self.device
    }

    /// Snapshot of the run for logging and UIs.
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            simulated_time: self.device.current_time(),
            total_steps: self.device.total_steps(),
            current_state: self.device.current_state(),
            progress: self.progress(),
            speed: self.adapter.speed(),
            running: self.adapter.is_running(),
            completed: self.completed,
        }
    }
}
