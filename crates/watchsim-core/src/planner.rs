//! Daily activity planning.
//!
//! At the start of each simulated day the planner samples a fresh
//! [`DailyPlan`] from the wearer's archetype: randomized sleep and wake
//! hours, one to three walk blocks, and at most one run block, each
//! with a randomized start time and cadence. The plan is then consulted
//! every tick by the step simulator, which never re-randomizes
//! mid-day.
//!
//! Block scheduling is probabilistic: an activity with a weekly
//! frequency of `f` is included on a given day with probability `f/7`,
//! so a frequency of 7 guarantees the activity daily.

use chrono::NaiveDate;
use rand::Rng;
use tracing::debug;
use watchsim_types::ActivityKind;

use crate::archetype::{ActivityRate, ArchetypeProfile, TimeWindow};

/// Minutes in a simulated day.
const MINUTES_PER_DAY: i64 = 1440;

/// One scheduled activity block within a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityBlock {
    /// Walk or run.
    pub kind: ActivityKind,
    /// Start hour of day, 0-23.
    pub start_hour: u32,
    /// Start minute within the hour, 0-59.
    pub start_minute: u32,
    /// Block length in minutes.
    pub duration_minutes: u32,
    /// Randomized cadence for this block, steps per minute.
    pub steps_per_minute: u32,
}

impl ActivityBlock {
    /// Start offset from midnight, in minutes.
    pub const fn start_minute_of_day(&self) -> u32 {
        self.start_hour.saturating_mul(60).saturating_add(self.start_minute)
    }

    /// Whether the given time of day falls inside this block.
    ///
    /// Blocks never wrap past midnight: a block scheduled late enough
    /// to spill over is truncated at 23:59.
    pub const fn contains(&self, hour: u32, minute: u32) -> bool {
        let now = hour.saturating_mul(60).saturating_add(minute);
        let start = self.start_minute_of_day();
        let end = start.saturating_add(self.duration_minutes);
        now >= start && now < end
    }
}

/// The sampled schedule for one simulated day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPlan {
    /// The calendar day this plan covers.
    pub date: NaiveDate,
    /// Hour the wearer falls asleep, 0-23.
    pub sleep_hour: u32,
    /// Hour the wearer wakes, 0-23.
    pub wake_hour: u32,
    /// Scheduled activity blocks, sorted by start time.
    pub activities: Vec<ActivityBlock>,
}

impl DailyPlan {
    /// Whether the wearer is asleep at the given hour.
    ///
    /// The sleep interval is `[sleep_hour, wake_hour)`, wrapping past
    /// midnight when sleep starts in the evening. Equal sleep and wake
    /// hours degenerate to an always-awake day.
    pub const fn is_sleeping(&self, hour: u32) -> bool {
        if self.sleep_hour == self.wake_hour {
            false
        } else if self.sleep_hour < self.wake_hour {
            hour >= self.sleep_hour && hour < self.wake_hour
        } else {
            hour >= self.sleep_hour || hour < self.wake_hour
        }
    }

    /// The activity block covering the given time of day, if any.
    pub fn active_block(&self, hour: u32, minute: u32) -> Option<&ActivityBlock> {
        self.activities.iter().find(|b| b.contains(hour, minute))
    }
}

/// Sample a plan for `date` from the archetype's parameters.
pub fn plan_day<R: Rng + ?Sized>(
    date: NaiveDate,
    profile: &ArchetypeProfile,
    rng: &mut R,
) -> DailyPlan {
    let sleep_hour = randomized_hour(&profile.sleep, rng);
    let wake_hour = randomized_hour(&profile.wake, rng);

    let mut activities = Vec::new();

    if occurs_today(&profile.walks, rng) {
        let walk_count = rng.random_range(1..=3);
        for _ in 0..walk_count {
            activities.push(schedule_block(
                ActivityKind::Walk,
                &profile.walks,
                sleep_hour,
                wake_hour,
                rng,
            ));
        }
    }

    if occurs_today(&profile.runs, rng) {
        activities.push(schedule_block(
            ActivityKind::Run,
            &profile.runs,
            sleep_hour,
            wake_hour,
            rng,
        ));
    }

    activities.sort_by_key(ActivityBlock::start_minute_of_day);

    debug!(
        archetype = profile.id,
        %date,
        sleep_hour,
        wake_hour,
        blocks = activities.len(),
        "planned day"
    );

    DailyPlan {
        date,
        sleep_hour,
        wake_hour,
        activities,
    }
}

/// Randomize a time window's base hour in `step_minutes` increments,
/// wrapping around midnight.
fn randomized_hour<R: Rng + ?Sized>(window: &TimeWindow, rng: &mut R) -> u32 {
    let max_steps = i64::from(
        window
            .randomization_minutes
            .checked_div(window.step_minutes)
            .unwrap_or(0),
    );
    let offset_minutes = rng
        .random_range(-max_steps..=max_steps)
        .saturating_mul(i64::from(window.step_minutes));
    let total = i64::from(window.hour)
        .saturating_mul(60)
        .saturating_add(offset_minutes)
        .rem_euclid(MINUTES_PER_DAY);
    u32::try_from(total / 60).unwrap_or(window.hour)
}

/// Whether an activity with the given weekly frequency happens today.
fn occurs_today<R: Rng + ?Sized>(rate: &ActivityRate, rng: &mut R) -> bool {
    let probability = (f64::from(rate.frequency_per_week) / 7.0).clamp(0.0, 1.0);
    rng.random_bool(probability)
}

/// Schedule one block at a uniformly random awake time of day.
fn schedule_block<R: Rng + ?Sized>(
    kind: ActivityKind,
    rate: &ActivityRate,
    sleep_hour: u32,
    wake_hour: u32,
    rng: &mut R,
) -> ActivityBlock {
    let awake_hours = i64::from(if sleep_hour > wake_hour {
        sleep_hour.saturating_sub(wake_hour)
    } else {
        24u32.saturating_sub(wake_hour).saturating_add(sleep_hour)
    });
    let awake_minutes = awake_hours.saturating_mul(60).max(1);

    let offset = rng.random_range(0..awake_minutes);
    let total = i64::from(wake_hour)
        .saturating_mul(60)
        .saturating_add(offset)
        .rem_euclid(MINUTES_PER_DAY);

    ActivityBlock {
        kind,
        start_hour: u32::try_from(total / 60).unwrap_or(wake_hour),
        start_minute: u32::try_from(total % 60).unwrap_or(0),
        duration_minutes: rate.duration_minutes,
        steps_per_minute: cadence_with_dispersion(rate, rng),
    }
}

/// Draw a cadence from the rate's symmetric dispersion interval.
fn cadence_with_dispersion<R: Rng + ?Sized>(rate: &ActivityRate, rng: &mut R) -> u32 {
    let jitter = rng.random::<f64>().mul_add(2.0, -1.0) * f64::from(rate.dispersion);
    let cadence = f64::from(rate.steps_per_minute) + jitter;
    if cadence <= 0.0 {
        return 0;
    }
    // Bounded by steps_per_minute + dispersion, far below u32::MAX.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        cadence.round() as u32
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::archetype;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn same_seed_produces_identical_plans() {
        let profile = archetype::by_id("office");
        let a = plan_day(date(), &profile, &mut StdRng::seed_from_u64(42));
        let b = plan_day(date(), &profile, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn daily_frequency_always_schedules_a_walk() {
        let profile = archetype::by_id("office");
        assert_eq!(profile.walks.frequency_per_week, 7);
        for seed in 0..50 {
            let plan = plan_day(date(), &profile, &mut StdRng::seed_from_u64(seed));
            let walks = plan
                .activities
                .iter()
                .filter(|b| b.kind == ActivityKind::Walk)
                .count();
            assert!((1..=3).contains(&walks), "seed {seed}: {walks} walks");
        }
    }

    #[test]
    fn at_most_one_run_per_day() {
        let profile = archetype::by_id("athlete");
        for seed in 0..50 {
            let plan = plan_day(date(), &profile, &mut StdRng::seed_from_u64(seed));
            let runs = plan
                .activities
                .iter()
                .filter(|b| b.kind == ActivityKind::Run)
                .count();
            assert!(runs <= 1, "seed {seed}: {runs} runs");
        }
    }

    #[test]
    fn blocks_are_sorted_by_start_time() {
        let profile = archetype::by_id("office");
        for seed in 0..20 {
            let plan = plan_day(date(), &profile, &mut StdRng::seed_from_u64(seed));
            let starts: Vec<_> = plan
                .activities
                .iter()
                .map(ActivityBlock::start_minute_of_day)
                .collect();
            let mut sorted = starts.clone();
            sorted.sort_unstable();
            assert_eq!(starts, sorted, "seed {seed}");
        }
    }

    #[test]
    fn cadence_stays_within_dispersion() {
        let profile = archetype::by_id("office");
        for seed in 0..50 {
            let plan = plan_day(date(), &profile, &mut StdRng::seed_from_u64(seed));
            for block in &plan.activities {
                let rate = match block.kind {
                    ActivityKind::Walk => &profile.walks,
                    ActivityKind::Run => &profile.runs,
                };
                let lo = rate.steps_per_minute - rate.dispersion;
                let hi = rate.steps_per_minute + rate.dispersion;
                assert!(
                    (lo..=hi).contains(&block.steps_per_minute),
                    "seed {seed}: cadence {} outside [{lo}, {hi}]",
                    block.steps_per_minute
                );
            }
        }
    }

    #[test]
    fn sleep_interval_wraps_past_midnight() {
        let plan = DailyPlan {
            date: date(),
            sleep_hour: 23,
            wake_hour: 7,
            activities: Vec::new(),
        };
        assert!(plan.is_sleeping(23));
        assert!(plan.is_sleeping(3));
        assert!(!plan.is_sleeping(7));
        assert!(!plan.is_sleeping(12));
    }

    #[test]
    fn daytime_sleep_interval() {
        let plan = DailyPlan {
            date: date(),
            sleep_hour: 9,
            wake_hour: 17,
            activities: Vec::new(),
        };
        assert!(plan.is_sleeping(9));
        assert!(plan.is_sleeping(12));
        assert!(!plan.is_sleeping(17));
        assert!(!plan.is_sleeping(2));
    }

    #[test]
    fn equal_sleep_and_wake_means_always_awake() {
        let plan = DailyPlan {
            date: date(),
            sleep_hour: 8,
            wake_hour: 8,
            activities: Vec::new(),
        };
        for hour in 0..24 {
            assert!(!plan.is_sleeping(hour));
        }
    }

    #[test]
    fn block_near_midnight_is_truncated() {
        let block = ActivityBlock {
            kind: ActivityKind::Walk,
            start_hour: 23,
            start_minute: 55,
            duration_minutes: 10,
            steps_per_minute: 110,
        };
        assert!(block.contains(23, 55));
        assert!(block.contains(23, 59));
        // The block does not resume after the date rolls over.
        assert!(!block.contains(0, 0));
        assert!(!block.contains(0, 4));
    }

    #[test]
    fn active_block_finds_covering_block() {
        let plan = DailyPlan {
            date: date(),
            sleep_hour: 0,
            wake_hour: 8,
            activities: vec![ActivityBlock {
                kind: ActivityKind::Run,
                start_hour: 18,
                start_minute: 30,
                duration_minutes: 10,
                steps_per_minute: 150,
            }],
        };
        assert!(plan.active_block(18, 35).is_some());
        assert!(plan.active_block(18, 40).is_none());
        assert!(plan.active_block(10, 0).is_none());
    }

    #[test]
    fn randomized_hours_stay_in_range() {
        let profile = archetype::by_id("flexible");
        for seed in 0..100 {
            let plan = plan_day(date(), &profile, &mut StdRng::seed_from_u64(seed));
            assert!(plan.sleep_hour < 24, "seed {seed}");
            assert!(plan.wake_hour < 24, "seed {seed}");
        }
    }
}
