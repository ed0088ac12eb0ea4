//! The tagged simulation event stream and its envelope.
//!
//! Every event carries two timestamps: the wall-clock instant it was
//! emitted and the simulated device time it describes. Downstream
//! consumers (dashboard, export glue) rely on the serialized tag names
//! (`NEW_SECOND`, `NEW_MINUTE`, ...) staying stable.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ActivityKind, DeviceState};

/// A recorded state machine transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransitionEvent {
    /// State before the transition.
    pub from: DeviceState,
    /// State after the transition.
    pub to: DeviceState,
    /// Simulated device time at which the transition occurred.
    pub timestamp: NaiveDateTime,
    /// Human-readable description of which rule fired.
    pub reason: String,
}

/// An event produced by the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationEvent {
    /// The device clock crossed a second boundary.
    NewSecond {
        /// The new second-of-minute component, 0-59.
        second: u32,
    },

    /// The device clock crossed a minute boundary.
    NewMinute {
        /// The new minute-of-hour component, 0-59.
        minute: u32,
    },

    /// The step simulator emitted whole steps.
    NewStep {
        /// Steps emitted by this tick (always >= 1).
        steps: u64,
        /// Lifetime step total for this run.
        total_steps: u64,
        /// Steps accumulated in the current simulated minute.
        steps_this_minute: u64,
        /// The activity block kind that produced the steps.
        activity: ActivityKind,
        /// The block's randomized cadence, steps per minute.
        steps_per_minute: u32,
    },

    /// The device state machine transitioned.
    NewState {
        /// State before the transition.
        from: DeviceState,
        /// State after the transition.
        to: DeviceState,
        /// Which rule fired, in human-readable form.
        reason: String,
        /// Simulated device time of the transition.
        timestamp: NaiveDateTime,
    },

    /// The configured simulated duration has fully elapsed.
    SimulationComplete {
        /// Lifetime step total at completion.
        total_steps: u64,
        /// Configured duration, in simulated days.
        duration_days: u32,
    },
}

impl SimulationEvent {
    /// The serialized tag name for this event.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NewSecond { .. } => "NEW_SECOND",
            Self::NewMinute { .. } => "NEW_MINUTE",
            Self::NewStep { .. } => "NEW_STEP",
            Self::NewState { .. } => "NEW_STATE",
            Self::SimulationComplete { .. } => "SIMULATION_COMPLETE",
        }
    }
}

/// An event together with its emission timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Wall-clock instant the event was emitted.
    pub timestamp: DateTime<Utc>,
    /// Simulated device time the event describes.
    pub simulated_time: NaiveDateTime,
    /// The event payload.
    #[serde(flatten)]
    pub event: SimulationEvent,
}

impl EventEnvelope {
    /// Wrap an event, stamping it with the current wall-clock time.
    pub fn new(simulated_time: NaiveDateTime, event: SimulationEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            simulated_time,
            event,
        }
    }
}
