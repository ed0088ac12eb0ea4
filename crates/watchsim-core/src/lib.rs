//! Device clock, activity planning, and run supervision for the
//! Watchsim wearable simulator.
//!
//! This crate owns the full simulation core: a wall-clock adapter turns
//! elapsed real time into simulated deltas, the device clock quantizes
//! them into 100 ms sub-steps and raises second/minute interrupts, and
//! the orchestrator feeds those interrupts into step generation and the
//! device state machine.
//!
//! # Modules
//!
//! - [`pacer`] -- Wall-clock adapter with speed-adaptive frame pacing.
//! - [`clock`] -- Device clock with 100 ms quantization and boundary
//!   interrupts.
//! - [`archetype`] -- Built-in wearer behavior profiles.
//! - [`planner`] -- Per-day randomized sleep/wake and activity blocks.
//! - [`stepgen`] -- Fractional step accumulation driven by the plan.
//! - [`statemachine`] -- Priority-rule device power-state machine.
//! - [`device`] -- Orchestration of clock, steps, and state into one
//!   event stream.
//! - [`dispatch`] -- Fault-isolated listener fan-out.
//! - [`supervisor`] -- Progress tracking and run completion.
//! - [`config`] -- Configuration loading from `watchsim-config.yaml`.
//! - [`runner`] -- The async sleep/frame drive loop.

pub mod archetype;
pub mod clock;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod pacer;
pub mod planner;
pub mod runner;
pub mod statemachine;
pub mod stepgen;
pub mod supervisor;
