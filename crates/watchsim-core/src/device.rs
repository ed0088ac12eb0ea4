//! Device orchestration: clock, step generator, and state machine
//! composed into one event-producing unit.
//!
//! The orchestrator owns no policy of its own. It forwards each
//! second-boundary interrupt into the step generator with a fixed
//! 1-second delta (step generation is driven by simulated-time
//! boundaries, never by wall-clock jitter) and each minute-boundary
//! interrupt into the state machine, then flattens everything into a
//! single ordered envelope stream.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use watchsim_types::{DeviceState, EventEnvelope, RtcReading, SimulationEvent};

use crate::archetype::ArchetypeProfile;
use crate::clock::{ClockInterrupt, DeviceClock};
use crate::statemachine::DeviceStateMachine;
use crate::stepgen::StepSimulator;

/// How state machine output feeds back into step generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepModulation {
    /// Steps follow the daily plan's schedule only; the state machine
    /// is a passive observer. This is the default.
    #[default]
    Schedule,

    /// Step output is additionally scaled by the current state's
    /// multiplier (SLEEP suppresses, IDLE and BACKGROUND attenuate).
    StateScaled,
}

/// The composed simulated device.
#[derive(Debug, Clone)]
pub struct DeviceOrchestrator {
    clock: DeviceClock,
    stepgen: StepSimulator,
    state_machine: DeviceStateMachine,
    modulation: StepModulation,

    /// Steps seen since the last minute-boundary evaluation.
    steps_in_last_minute: u64,
}

impl DeviceOrchestrator {
    /// Assemble a device starting at the given simulated time.
    pub fn new(
        start: NaiveDateTime,
        archetype: ArchetypeProfile,
        seed: Option<u64>,
        modulation: StepModulation,
    ) -> Self {
        Self {
            clock: DeviceClock::new(start),
            stepgen: StepSimulator::new(archetype, seed),
            state_machine: DeviceStateMachine::new(DeviceState::Idle),
            modulation,
            steps_in_last_minute: 0,
        }
    }

    /// Advance simulated time and collect every event that elapses.
    ///
    /// Envelopes come out in chronological order: for each second, any
    /// step emission precedes the second event itself; at a shared
    /// boundary, second-driven events precede minute-driven ones.
    pub fn advance(&mut self, delta_ms: f64) -> Vec<EventEnvelope> {
        let mut events = Vec::new();

        for interrupt in self.clock.advance(delta_ms) {
            match interrupt {
                ClockInterrupt::NewSecond { second, at } => {
                    let multiplier = match self.modulation {
                        StepModulation::Schedule => 1.0,
                        StepModulation::StateScaled => {
                            self.state_machine.current_state().step_multiplier()
                        }
                    };

                    if let Some(sample) = self.stepgen.process_tick(at, 1.0, multiplier) {
                        self.steps_in_last_minute =
                            self.steps_in_last_minute.saturating_add(sample.steps);
                        events.push(EventEnvelope::new(
                            at,
                            SimulationEvent::NewStep {
                                steps: sample.steps,
                                total_steps: sample.total_steps,
                                steps_this_minute: sample.steps_this_minute,
                                activity: sample.activity,
                                steps_per_minute: sample.steps_per_minute,
                            },
                        ));
                    }

                    events.push(EventEnvelope::new(at, SimulationEvent::NewSecond { second }));
                }

                ClockInterrupt::NewMinute { minute, at } => {
                    if let Some(transition) = self.state_machine.update(
                        at,
                        self.steps_in_last_minute,
                        self.stepgen.total_steps(),
                    ) {
                        events.push(EventEnvelope::new(
                            at,
                            SimulationEvent::NewState {
                                from: transition.from,
                                to: transition.to,
                                reason: transition.reason,
                                timestamp: transition.timestamp,
                            },
                        ));
                    }
                    self.steps_in_last_minute = 0;

                    events.push(EventEnvelope::new(at, SimulationEvent::NewMinute { minute }));
                }
            }
        }

        events
    }

    /// RTC register read of the simulated device time.
    pub fn rtc(&self) -> RtcReading {
        self.clock.rtc()
    }

    /// Current simulated device time.
    pub const fn current_time(&self) -> NaiveDateTime {
        self.clock.current_time()
    }

    /// Lifetime whole steps emitted.
    pub const fn total_steps(&self) -> u64 {
        self.stepgen.total_steps()
    }

    /// The state machine's single current state.
    pub const fn current_state(&self) -> DeviceState {
        self.state_machine.current_state()
    }

    /// Whole steps per simulated hour of day.
    pub const fn hourly_distribution(&self) -> &[u64; 24] {
        self.stepgen.hourly_distribution()
    }

    /// Percentage of simulated time spent in each state.
    pub fn state_distribution(&self) -> Vec<(DeviceState, f64)> {
        self.state_machine
            .state_distribution(self.clock.current_time())
    }

    /// The modulation strategy in effect.
    pub const fn modulation(&self) -> StepModulation {
        self.modulation
    }

    /// Replace the wearer profile, discarding the current plan and all
    /// step counters. Device time and state are unaffected.
    pub fn set_archetype(&mut self, archetype: ArchetypeProfile) {
        self.stepgen.set_archetype(archetype);
        self.steps_in_last_minute = 0;
    }

    /// Reinitialize the device to `start` (or wall-clock now when
    /// `None`), clearing all counters, the plan, and state history.
    pub fn reset(&mut self, start: Option<NaiveDateTime>) {
        self.clock.reset(start);
        self.stepgen.reset();
        self.state_machine.reset(DeviceState::Idle);
        self.steps_in_last_minute = 0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::NaiveDate;
    use watchsim_types::ActivityKind;

    use super::*;
    use crate::archetype::{ActivityRate, TimeWindow};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    const fn window(hour: u32) -> TimeWindow {
        TimeWindow {
            hour,
            randomization_minutes: 0,
            step_minutes: 0,
        }
    }

    /// A profile that never schedules any activity, with a fixed
    /// 22:00-06:00 sleep window.
    fn inactive_profile() -> ArchetypeProfile {
        ArchetypeProfile {
            id: "test-inactive",
            name: "Test Inactive",
            description: "deterministic no-activity profile",
            sleep: window(22),
            wake: window(6),
            walks: ActivityRate {
                steps_per_minute: 110,
                dispersion: 0,
                duration_minutes: 10,
                frequency_per_week: 0,
            },
            runs: ActivityRate {
                steps_per_minute: 150,
                dispersion: 0,
                duration_minutes: 10,
                frequency_per_week: 0,
            },
        }
    }

    /// A profile that is always awake and walks daily.
    fn walking_profile() -> ArchetypeProfile {
        ArchetypeProfile {
            id: "test-walker",
            name: "Test Walker",
            description: "always-awake daily walker",
            sleep: window(8),
            wake: window(8),
            walks: ActivityRate {
                steps_per_minute: 120,
                dispersion: 0,
                duration_minutes: 60,
                frequency_per_week: 7,
            },
            runs: ActivityRate {
                steps_per_minute: 150,
                dispersion: 0,
                duration_minutes: 10,
                frequency_per_week: 0,
            },
        }
    }

    #[test]
    fn one_second_of_time_emits_one_second_event() {
        let mut device = DeviceOrchestrator::new(
            at(12, 0),
            inactive_profile(),
            Some(1),
            StepModulation::Schedule,
        );
        let events = device.advance(1000.0);
        let seconds = events
            .iter()
            .filter(|e| matches!(e.event, SimulationEvent::NewSecond { .. }))
            .count();
        assert_eq!(seconds, 1);
    }

    #[test]
    fn a_full_day_of_walking_lands_near_the_plan() {
        let mut device = DeviceOrchestrator::new(
            at(0, 0),
            walking_profile(),
            Some(3),
            StepModulation::Schedule,
        );
        // One simulated day in one-hour slices.
        for _ in 0..24 {
            let _ = device.advance(3_600_000.0);
        }
        // 1-3 walk blocks of 60 min at 120/min.
        let total = device.total_steps();
        assert!(
            (7100..=21700).contains(&total),
            "total steps {total} outside plausible plan range"
        );
    }

    #[test]
    fn step_events_precede_their_second_event() {
        let mut device = DeviceOrchestrator::new(
            at(0, 0),
            walking_profile(),
            Some(3),
            StepModulation::Schedule,
        );
        for _ in 0..24 {
            let events = device.advance(3_600_000.0);
            for pair in events.windows(2) {
                if let (Some(first), Some(second)) = (pair.first(), pair.get(1))
                    && matches!(first.event, SimulationEvent::NewStep { .. })
                {
                    assert!(
                        matches!(second.event, SimulationEvent::NewSecond { .. }),
                        "step event not followed by its second event"
                    );
                }
            }
        }
    }

    #[test]
    fn quiet_night_drives_the_machine_to_sleep() {
        let mut device = DeviceOrchestrator::new(
            at(23, 0),
            inactive_profile(),
            Some(1),
            StepModulation::Schedule,
        );
        let mut transitions = Vec::new();
        // 35 quiet simulated minutes, minute by minute.
        for _ in 0..35 {
            for event in device.advance(60_000.0) {
                if let SimulationEvent::NewState { to, .. } = event.event {
                    transitions.push(to);
                }
            }
        }
        assert_eq!(transitions.last(), Some(&DeviceState::Sleep));
        assert_eq!(device.current_state(), DeviceState::Sleep);
    }

    #[test]
    fn state_scaling_never_exceeds_schedule_output() {
        // Same seed means the same daily plan; the state multipliers
        // can only attenuate, never amplify.
        let run = |modulation| {
            let mut device =
                DeviceOrchestrator::new(at(0, 0), walking_profile(), Some(3), modulation);
            for _ in 0..24 {
                let _ = device.advance(3_600_000.0);
            }
            device.total_steps()
        };
        let scheduled = run(StepModulation::Schedule);
        let scaled = run(StepModulation::StateScaled);
        assert!(scheduled > 0);
        assert!(
            scaled <= scheduled,
            "scaled {scaled} exceeds scheduled {scheduled}"
        );
    }

    #[test]
    fn reset_returns_device_to_initial_shape() {
        let mut device = DeviceOrchestrator::new(
            at(0, 0),
            walking_profile(),
            Some(3),
            StepModulation::Schedule,
        );
        let _ = device.advance(3_600_000.0);
        device.reset(Some(at(6, 0)));
        assert_eq!(device.current_time(), at(6, 0));
        assert_eq!(device.total_steps(), 0);
        assert_eq!(device.current_state(), DeviceState::Idle);
    }

    #[test]
    fn set_archetype_keeps_time_but_clears_steps() {
        let mut device = DeviceOrchestrator::new(
            at(0, 0),
            walking_profile(),
            Some(3),
            StepModulation::Schedule,
        );
        let _ = device.advance(3_600_000.0);
        let time_before = device.current_time();
        device.set_archetype(inactive_profile());
        assert_eq!(device.current_time(), time_before);
        assert_eq!(device.total_steps(), 0);
    }

    #[test]
    fn rtc_reflects_advanced_time() {
        let mut device = DeviceOrchestrator::new(
            at(12, 0),
            inactive_profile(),
            Some(1),
            StepModulation::Schedule,
        );
        let _ = device.advance(90_000.0);
        let rtc = device.rtc();
        assert_eq!(rtc.hour, 12);
        assert_eq!(rtc.minute, 1);
        assert_eq!(rtc.second, 30);
    }

    #[test]
    fn step_events_carry_walk_activity() {
        let mut device = DeviceOrchestrator::new(
            at(0, 0),
            walking_profile(),
            Some(3),
            StepModulation::Schedule,
        );
        let mut kinds = Vec::new();
        for _ in 0..24 {
            for event in device.advance(3_600_000.0) {
                if let SimulationEvent::NewStep { activity, .. } = event.event {
                    kinds.push(activity);
                }
            }
        }
        assert!(kinds.iter().all(|k| *k == ActivityKind::Walk));
        assert!(!kinds.is_empty());
    }
}
