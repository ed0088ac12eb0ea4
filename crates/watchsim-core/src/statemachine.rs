//! Device power-state machine.
//!
//! The machine tracks one current [`DeviceState`] and re-evaluates it
//! once per simulated minute against a fixed rule table. Rules are
//! keyed by source state and carry a priority; of the rules whose
//! source matches the current state, predicates are evaluated in
//! descending priority order and the first match wins. A match whose
//! target equals the current state is a no-op.
//!
//! The machine's notion of night (22:00-06:00) is a fixed window,
//! deliberately independent of the archetype's randomized sleep
//! schedule: the device decides when to power down from its own
//! heuristics, not from the wearer model.

use std::collections::VecDeque;

use chrono::{NaiveDateTime, Timelike};
use tracing::debug;
use watchsim_types::{DeviceState, StateTransitionEvent};

/// Maximum retained transitions; the oldest entry is dropped beyond it.
pub const TRANSITION_HISTORY_CAP: usize = 50;

/// Start of the fixed night window, inclusive.
const NIGHT_START_HOUR: u32 = 22;

/// End of the fixed night window, exclusive.
const NIGHT_END_HOUR: u32 = 6;

/// Whether the given hour falls in the device's fixed night window.
pub const fn is_night(hour: u32) -> bool {
    hour >= NIGHT_START_HOUR || hour < NIGHT_END_HOUR
}

/// The inputs a transition predicate sees for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateContext {
    /// Simulated device time of the evaluation.
    pub time: NaiveDateTime,
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Whether the hour falls in the fixed night window.
    pub is_night: bool,
    /// Whole steps recorded in the minute that just ended.
    pub steps_in_last_minute: u64,
    /// Lifetime step total.
    pub total_steps: u64,
    /// Whole minutes since the last minute with nonzero steps.
    pub minutes_since_last_activity: i64,
}

/// One row of the transition table.
#[derive(Debug, Clone, Copy)]
struct TransitionRule {
    from: DeviceState,
    to: DeviceState,
    priority: u8,
    condition: fn(&StateContext) -> bool,
    reason: &'static str,
}

/// The fixed transition table. Priorities are part of the contract:
/// when multiple predicates hold, the highest-priority row is applied.
const RULES: [TransitionRule; 11] = [
    TransitionRule {
        from: DeviceState::Sleep,
        to: DeviceState::Active,
        priority: 100,
        condition: |c| c.steps_in_last_minute > 20 && !c.is_night,
        reason: "woke to sustained step activity",
    },
    TransitionRule {
        from: DeviceState::Sleep,
        to: DeviceState::Idle,
        priority: 90,
        condition: |c| !c.is_night && c.steps_in_last_minute == 0,
        reason: "morning wake with no activity",
    },
    TransitionRule {
        from: DeviceState::Idle,
        to: DeviceState::Sleep,
        priority: 95,
        condition: |c| {
            c.is_night && c.steps_in_last_minute == 0 && c.minutes_since_last_activity > 30
        },
        reason: "prolonged nighttime inactivity",
    },
    TransitionRule {
        from: DeviceState::Idle,
        to: DeviceState::Active,
        priority: 85,
        condition: |c| c.steps_in_last_minute > 30,
        reason: "step burst above active threshold",
    },
    TransitionRule {
        from: DeviceState::Idle,
        to: DeviceState::Background,
        priority: 80,
        condition: |c| c.steps_in_last_minute > 10 && c.steps_in_last_minute <= 30,
        reason: "moderate step activity",
    },
    TransitionRule {
        from: DeviceState::Background,
        to: DeviceState::Sleep,
        priority: 92,
        condition: |c| {
            c.is_night && c.steps_in_last_minute == 0 && c.minutes_since_last_activity > 30
        },
        reason: "prolonged nighttime inactivity",
    },
    TransitionRule {
        from: DeviceState::Background,
        to: DeviceState::Active,
        priority: 88,
        condition: |c| c.steps_in_last_minute > 50,
        reason: "sustained high step rate",
    },
    TransitionRule {
        from: DeviceState::Background,
        to: DeviceState::Idle,
        priority: 75,
        condition: |c| c.steps_in_last_minute == 0 && c.minutes_since_last_activity > 5,
        reason: "activity tapered off",
    },
    TransitionRule {
        from: DeviceState::Active,
        to: DeviceState::Sleep,
        priority: 93,
        condition: |c| {
            c.is_night && c.steps_in_last_minute == 0 && c.minutes_since_last_activity > 15
        },
        reason: "nighttime inactivity after activity",
    },
    TransitionRule {
        from: DeviceState::Active,
        to: DeviceState::Background,
        priority: 78,
        condition: |c| c.steps_in_last_minute > 0 && c.steps_in_last_minute < 20,
        reason: "step rate dropped below active threshold",
    },
    TransitionRule {
        from: DeviceState::Active,
        to: DeviceState::Idle,
        priority: 70,
        condition: |c| c.steps_in_last_minute == 0 && c.minutes_since_last_activity > 3,
        reason: "no steps for several minutes",
    },
];

/// The device state machine.
#[derive(Debug, Clone)]
pub struct DeviceStateMachine {
    /// The single current state.
    current: DeviceState,

    /// Simulated instant of the last minute with nonzero steps.
    last_activity_at: Option<NaiveDateTime>,

    /// Bounded transition history, oldest first.
    history: VecDeque<StateTransitionEvent>,
}

impl DeviceStateMachine {
    /// Create a machine in the given initial state.
    pub const fn new(initial: DeviceState) -> Self {
        Self {
            current: initial,
            last_activity_at: None,
            history: VecDeque::new(),
        }
    }

    /// Evaluate the rule table at a minute boundary.
    ///
    /// Returns the recorded transition, or `None` when no rule fired
    /// (or the winning rule targets the current state).
    pub fn update(
        &mut self,
        time: NaiveDateTime,
        steps_in_last_minute: u64,
        total_steps: u64,
    ) -> Option<StateTransitionEvent> {
        // An active minute (or the very first evaluation) re-anchors
        // the inactivity counter.
        if steps_in_last_minute > 0 || self.last_activity_at.is_none() {
            self.last_activity_at = Some(time);
        }
        let minutes_since_last_activity = self
            .last_activity_at
            .map_or(0, |at| time.signed_duration_since(at).num_minutes());

        let hour = time.hour();
        let context = StateContext {
            time,
            hour,
            is_night: is_night(hour),
            steps_in_last_minute,
            total_steps,
            minutes_since_last_activity,
        };

        let mut candidates: Vec<&TransitionRule> =
            RULES.iter().filter(|r| r.from == self.current).collect();
        candidates.sort_unstable_by(|a, b| b.priority.cmp(&a.priority));

        let rule = candidates.into_iter().find(|r| (r.condition)(&context))?;
        if rule.to == self.current {
            return None;
        }

        let event = StateTransitionEvent {
            from: rule.from,
            to: rule.to,
            timestamp: time,
            reason: rule.reason.to_owned(),
        };

        debug!(
            from = %event.from,
            to = %event.to,
            reason = event.reason,
            steps = steps_in_last_minute,
            "state transition"
        );

        if self.history.len() >= TRANSITION_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());
        self.current = rule.to;

        Some(event)
    }

    /// The single current state.
    pub const fn current_state(&self) -> DeviceState {
        self.current
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &StateTransitionEvent> {
        self.history.iter()
    }

    /// Percentage of simulated time spent in each state, derived from
    /// the transition history's timestamps up to `now`.
    ///
    /// With no transitions recorded the current state is reported at
    /// 100%.
    pub fn state_distribution(&self, now: NaiveDateTime) -> Vec<(DeviceState, f64)> {
        let mut totals_minutes = [0.0f64; 4];

        if self.history.is_empty() {
            return DeviceState::ALL
                .into_iter()
                .map(|s| (s, if s == self.current { 100.0 } else { 0.0 }))
                .collect();
        }

        // Attribute [t_i, t_{i+1}) to the state entered at t_i; the
        // final segment runs to `now`.
        for (i, event) in self.history.iter().enumerate() {
            let end = self
                .history
                .get(i.saturating_add(1))
                .map_or(now, |next| next.timestamp);
            let minutes = end
                .signed_duration_since(event.timestamp)
                .num_seconds()
                .max(0);
            #[allow(clippy::cast_precision_loss)]
            let minutes = minutes as f64 / 60.0;
            if let Some(slot) = totals_minutes.get_mut(state_index(event.to)) {
                *slot += minutes;
            }
        }

        let total: f64 = totals_minutes.iter().sum();
        DeviceState::ALL
            .into_iter()
            .map(|s| {
                let share = totals_minutes
                    .get(state_index(s))
                    .copied()
                    .unwrap_or_default();
                let pct = if total > 0.0 { share / total * 100.0 } else { 0.0 };
                (s, pct)
            })
            .collect()
    }

    /// Return to the given state, clearing history and activity
    /// tracking.
    pub fn reset(&mut self, initial: DeviceState) {
        self.current = initial;
        self.last_activity_at = None;
        self.history.clear();
    }
}

const fn state_index(state: DeviceState) -> usize {
    match state {
        DeviceState::Sleep => 0,
        DeviceState::Idle => 1,
        DeviceState::Background => 2,
        DeviceState::Active => 3,
    }
}
