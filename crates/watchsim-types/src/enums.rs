//! Enumeration types for the Watchsim device simulator.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

/// The device's power/activity state.
///
/// Exactly one state is current at any time. Transitions are governed by
/// the rule table in the state machine, evaluated once per simulated
/// minute. Each state carries a step multiplier used by the alternate
/// state-scaled modulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    /// Sleep mode -- no activity tracking.
    Sleep,
    /// Idle -- minimal activity detection.
    Idle,
    /// Background tracking -- normal activity detection.
    Background,
    /// Active mode -- full activity tracking.
    Active,
}

impl DeviceState {
    /// Multiplier applied to step generation in state-scaled modulation.
    pub const fn step_multiplier(self) -> f64 {
        match self {
            Self::Sleep => 0.0,
            Self::Idle => 0.3,
            Self::Background => 0.7,
            Self::Active => 1.0,
        }
    }

    /// Wire label for the state (matches the serialized form).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sleep => "SLEEP",
            Self::Idle => "IDLE",
            Self::Background => "BACKGROUND",
            Self::Active => "ACTIVE",
        }
    }

    /// All states, in a fixed order (useful for distribution reports).
    pub const ALL: [Self; 4] = [Self::Sleep, Self::Idle, Self::Background, Self::Active];
}

impl core::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Activity kind
// ---------------------------------------------------------------------------

/// The kind of a scheduled activity block within a daily plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// A walk block (moderate cadence).
    Walk,
    /// A run block (high cadence).
    Run,
}

impl ActivityKind {
    /// Wire label for the activity kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Run => "run",
        }
    }
}

impl core::fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn device_state_serializes_screaming() {
        let json = serde_json::to_string(&DeviceState::Background).unwrap();
        assert_eq!(json, "\"BACKGROUND\"");
        let back: DeviceState = serde_json::from_str("\"SLEEP\"").unwrap();
        assert_eq!(back, DeviceState::Sleep);
    }

    #[test]
    fn step_multipliers_match_state_configs() {
        assert!((DeviceState::Sleep.step_multiplier() - 0.0).abs() < f64::EPSILON);
        assert!((DeviceState::Idle.step_multiplier() - 0.3).abs() < f64::EPSILON);
        assert!((DeviceState::Background.step_multiplier() - 0.7).abs() < f64::EPSILON);
        assert!((DeviceState::Active.step_multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn activity_kind_serializes_lowercase() {
        let json = serde_json::to_string(&ActivityKind::Run).unwrap();
        assert_eq!(json, "\"run\"");
    }
}
