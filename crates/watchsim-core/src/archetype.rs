//! Wearer archetype profiles.
//!
//! An archetype bundles the statistical parameters that drive a day of
//! simulated behavior: when the wearer sleeps and wakes, and how often
//! and how intensely they walk and run. The planner samples from these
//! parameters once per simulated day.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A randomized time-of-day anchor, e.g. "around 23:00, +/- 60 minutes
/// in 60-minute increments".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Base hour of day, 0-23.
    pub hour: u32,
    /// Maximum offset from the base hour, in minutes.
    pub randomization_minutes: u32,
    /// Granularity of the offset, in minutes.
    pub step_minutes: u32,
}

/// Cadence and scheduling parameters for one activity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRate {
    /// Mean cadence in steps per minute.
    pub steps_per_minute: u32,
    /// Maximum symmetric deviation from the mean cadence.
    pub dispersion: u32,
    /// Duration of one block, in minutes.
    pub duration_minutes: u32,
    /// Expected occurrences per week; 7 means daily.
    pub frequency_per_week: u32,
}

/// A complete wearer behavior profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchetypeProfile {
    /// Stable identifier used in configuration.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// One-line description of the wearer this profile models.
    pub description: &'static str,
    /// When the wearer falls asleep.
    pub sleep: TimeWindow,
    /// When the wearer wakes up.
    pub wake: TimeWindow,
    /// Walking blocks.
    pub walks: ActivityRate,
    /// Running blocks.
    pub runs: ActivityRate,
}

impl ArchetypeProfile {
    /// Rough expected daily step count, for log summaries.
    ///
    /// Uses mean cadences and assumes two walk blocks per day on
    /// average plus the weekly run frequency spread over seven days.
    pub const fn expected_daily_steps(&self) -> u64 {
        let walks = (self.walks.steps_per_minute as u64)
            .saturating_mul(self.walks.duration_minutes as u64)
            .saturating_mul(2);
        let weekly_runs = (self.runs.steps_per_minute as u64)
            .saturating_mul(self.runs.duration_minutes as u64)
            .saturating_mul(self.runs.frequency_per_week as u64);
        walks.saturating_add(weekly_runs / 7)
    }
}

/// The built-in archetype catalog.
pub fn catalog() -> Vec<ArchetypeProfile> {
    vec![
        office_worker(),
        shift_worker(),
        athlete(),
        sedentary(),
        active(),
        flexible(),
    ]
}

/// Look up a profile by id, falling back to the office worker.
///
/// An unknown id logs a warning rather than failing: a mistyped
/// archetype in configuration should still produce a runnable
/// simulation.
pub fn by_id(id: &str) -> ArchetypeProfile {
    catalog()
        .into_iter()
        .find(|p| p.id == id)
        .unwrap_or_else(|| {
            warn!(archetype = id, "unknown archetype, falling back to office worker");
            office_worker()
        })
}

const fn office_worker() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "office",
        name: "Office Worker",
        description: "Regular 9-to-5 schedule with commute walks and occasional evening runs",
        sleep: TimeWindow {
            hour: 0,
            randomization_minutes: 60,
            step_minutes: 60,
        },
        wake: TimeWindow {
            hour: 8,
            randomization_minutes: 60,
            step_minutes: 60,
        },
        walks: ActivityRate {
            steps_per_minute: 110,
            dispersion: 10,
            duration_minutes: 10,
            frequency_per_week: 7,
        },
        runs: ActivityRate {
            steps_per_minute: 150,
            dispersion: 15,
            duration_minutes: 10,
            frequency_per_week: 3,
        },
    }
}

const fn shift_worker() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "shift",
        name: "Shift Worker",
        description: "Night shift schedule, sleeping through the morning",
        sleep: TimeWindow {
            hour: 9,
            randomization_minutes: 60,
            step_minutes: 60,
        },
        wake: TimeWindow {
            hour: 17,
            randomization_minutes: 60,
            step_minutes: 60,
        },
        walks: ActivityRate {
            steps_per_minute: 110,
            dispersion: 10,
            duration_minutes: 10,
            frequency_per_week: 7,
        },
        runs: ActivityRate {
            steps_per_minute: 150,
            dispersion: 15,
            duration_minutes: 10,
            frequency_per_week: 3,
        },
    }
}

const fn athlete() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "athlete",
        name: "Athlete",
        description: "Early riser training daily with long, fast runs",
        sleep: TimeWindow {
            hour: 22,
            randomization_minutes: 30,
            step_minutes: 30,
        },
        wake: TimeWindow {
            hour: 6,
            randomization_minutes: 30,
            step_minutes: 30,
        },
        walks: ActivityRate {
            steps_per_minute: 115,
            dispersion: 10,
            duration_minutes: 15,
            frequency_per_week: 7,
        },
        runs: ActivityRate {
            steps_per_minute: 170,
            dispersion: 10,
            duration_minutes: 45,
            frequency_per_week: 6,
        },
    }
}

const fn sedentary() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "sedentary",
        name: "Sedentary",
        description: "Mostly stationary, short infrequent walks, rarely runs",
        sleep: TimeWindow {
            hour: 1,
            randomization_minutes: 90,
            step_minutes: 30,
        },
        wake: TimeWindow {
            hour: 9,
            randomization_minutes: 90,
            step_minutes: 30,
        },
        walks: ActivityRate {
            steps_per_minute: 95,
            dispersion: 15,
            duration_minutes: 5,
            frequency_per_week: 4,
        },
        runs: ActivityRate {
            steps_per_minute: 140,
            dispersion: 20,
            duration_minutes: 5,
            frequency_per_week: 1,
        },
    }
}

const fn active() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "active",
        name: "Active",
        description: "Frequent walker with regular medium-length runs",
        sleep: TimeWindow {
            hour: 23,
            randomization_minutes: 60,
            step_minutes: 30,
        },
        wake: TimeWindow {
            hour: 7,
            randomization_minutes: 60,
            step_minutes: 30,
        },
        walks: ActivityRate {
            steps_per_minute: 115,
            dispersion: 10,
            duration_minutes: 20,
            frequency_per_week: 7,
        },
        runs: ActivityRate {
            steps_per_minute: 160,
            dispersion: 15,
            duration_minutes: 25,
            frequency_per_week: 4,
        },
    }
}

const fn flexible() -> ArchetypeProfile {
    ArchetypeProfile {
        id: "flexible",
        name: "Flexible Schedule",
        description: "Irregular hours with widely randomized sleep and activity times",
        sleep: TimeWindow {
            hour: 2,
            randomization_minutes: 120,
            step_minutes: 30,
        },
        wake: TimeWindow {
            hour: 10,
            randomization_minutes: 120,
            step_minutes: 30,
        },
        walks: ActivityRate {
            steps_per_minute: 105,
            dispersion: 15,
            duration_minutes: 15,
            frequency_per_week: 5,
        },
        runs: ActivityRate {
            steps_per_minute: 155,
            dispersion: 15,
            duration_minutes: 20,
            frequency_per_week: 2,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_unique() {
        let profiles = catalog();
        let mut ids: Vec<_> = profiles.iter().map(|p| p.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), profiles.len());
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(by_id("shift").id, "shift");
        assert_eq!(by_id("athlete").name, "Athlete");
    }

    #[test]
    fn unknown_id_falls_back_to_office_worker() {
        let profile = by_id("does-not-exist");
        assert_eq!(profile.id, "office");
    }

    #[test]
    fn office_worker_baseline_parameters() {
        let p = by_id("office");
        assert_eq!(p.sleep.hour, 0);
        assert_eq!(p.wake.hour, 8);
        assert_eq!(p.walks.steps_per_minute, 110);
        assert_eq!(p.runs.frequency_per_week, 3);
    }

    #[test]
    fn expected_daily_steps_is_positive() {
        for profile in catalog() {
            assert!(profile.expected_daily_steps() > 0, "{}", profile.id);
        }
    }
}
