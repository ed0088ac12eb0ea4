//! Shared type definitions for the Watchsim device simulator.
//!
//! This crate is the single source of truth for the types that cross
//! component boundaries: the device state enumeration, the tagged event
//! stream consumed by the dashboard and the export glue, and the RTC
//! reading exposed by the device clock.
//!
//! # Modules
//!
//! - [`enums`] -- Device state and activity kind enumerations
//! - [`events`] -- The tagged simulation event stream and its envelope
//! - [`rtc`] -- Calendar/time-of-day components from the device clock

pub mod enums;
pub mod events;
pub mod rtc;

// Re-export all public types at crate root for convenience.
pub use enums::{ActivityKind, DeviceState};
pub use events::{EventEnvelope, SimulationEvent, StateTransitionEvent};
pub use rtc::RtcReading;
