//! Step generation from the daily activity plan.
//!
//! The simulator is driven once per simulated second. Sub-step cadences
//! (e.g. 110 steps/minute = 1.83 steps/second) are carried in a
//! fractional accumulator, and whole steps are emitted only when the
//! accumulator reaches one. Over a full block this converges on the
//! block's nominal step count without ever inventing or losing steps.
//!
//! The generator owns its plan lifecycle: it replans automatically when
//! the simulated date changes, including mid-run rollovers at midnight.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};
use watchsim_types::ActivityKind;

use crate::archetype::ArchetypeProfile;
use crate::planner::{self, DailyPlan};

/// Whole steps emitted by a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSample {
    /// Steps emitted by this tick, always >= 1.
    pub steps: u64,
    /// Lifetime step total after this tick.
    pub total_steps: u64,
    /// Steps accumulated in the current simulated minute.
    pub steps_this_minute: u64,
    /// The activity kind of the covering block.
    pub activity: ActivityKind,
    /// The covering block's randomized cadence, steps per minute.
    pub steps_per_minute: u32,
}

/// Stateful per-second step generator.
#[derive(Debug, Clone)]
pub struct StepSimulator {
    /// Behavior profile the daily plans are sampled from.
    archetype: ArchetypeProfile,

    /// Planner randomness, seedable for reproducible runs.
    rng: StdRng,

    /// The plan for the current simulated date.
    plan: Option<DailyPlan>,

    /// Date of the current plan, used to detect rollovers.
    last_date: Option<NaiveDate>,

    /// Minute component at the previous tick.
    last_minute: Option<u32>,

    /// Lifetime whole steps emitted.
    total_steps: u64,

    /// Whole steps emitted in the current simulated minute.
    steps_this_minute: u64,

    /// Fractional steps not yet emitted.
    accumulated: f64,

    /// Whole steps per simulated hour of day, across the whole run.
    hourly: [u64; 24],
}

impl StepSimulator {
    /// Create a generator for the given profile.
    ///
    /// With `seed` the planner randomness is fully reproducible;
    /// without it the generator seeds itself from OS entropy.
    pub fn new(archetype: ArchetypeProfile, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            archetype,
            rng,
            plan: None,
            last_date: None,
            last_minute: None,
            total_steps: 0,
            steps_this_minute: 0,
            accumulated: 0.0,
            hourly: [0; 24],
        }
    }

    /// Advance the generator by one tick of `delta_seconds` simulated
    /// seconds at the given device time.
    ///
    /// `multiplier` scales the cadence (1.0 leaves the plan's schedule
    /// untouched). Returns `Some` only when at least one whole step is
    /// emitted.
    pub fn process_tick(
        &mut self,
        time: NaiveDateTime,
        delta_seconds: f64,
        multiplier: f64,
    ) -> Option<StepSample> {
        let date = time.date();
        if self.last_date != Some(date) {
            let plan = planner::plan_day(date, &self.archetype, &mut self.rng);
            info!(
                %date,
                sleep_hour = plan.sleep_hour,
                wake_hour = plan.wake_hour,
                blocks = plan.activities.len(),
                "new daily plan"
            );
            self.plan = Some(plan);
            self.last_date = Some(date);
            self.accumulated = 0.0;
        }

        let minute = time.minute();
        if self.last_minute != Some(minute) {
            self.steps_this_minute = 0;
            self.last_minute = Some(minute);
        }

        let plan = self.plan.as_ref()?;
        let hour = time.hour();

        if plan.is_sleeping(hour) {
            // Sleep produces no steps and clears any carried fraction.
            self.accumulated = 0.0;
            return None;
        }

        let block = *plan.active_block(hour, minute)?;

        let per_second = f64::from(block.steps_per_minute) / 60.0;
        self.accumulated += per_second * delta_seconds * multiplier;

        if self.accumulated < 1.0 {
            return None;
        }

        let whole = self.accumulated.floor();
        self.accumulated -= whole;

        // floor() of a small positive accumulator always fits in u64.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = whole as u64;

        self.total_steps = self.total_steps.saturating_add(steps);
        self.steps_this_minute = self.steps_this_minute.saturating_add(steps);
        if let Some(bucket) = usize::try_from(hour)
            .ok()
            .and_then(|h| self.hourly.get_mut(h))
        {
            *bucket = bucket.saturating_add(steps);
        }

        debug!(
            steps,
            total = self.total_steps,
            activity = %block.kind,
            cadence = block.steps_per_minute,
            "steps emitted"
        );

        Some(StepSample {
            steps,
            total_steps: self.total_steps,
            steps_this_minute: self.steps_this_minute,
            activity: block.kind,
            steps_per_minute: block.steps_per_minute,
        })
    }

    /// Replace the behavior profile, discarding the current plan and
    /// all counters.
    pub fn set_archetype(&mut self, archetype: ArchetypeProfile) {
        self.archetype = archetype;
        self.reset();
    }

    /// Clear the plan, counters, and fractional accumulator. The RNG
    /// stream is left untouched.
    pub fn reset(&mut self) {
        self.plan = None;
        self.last_date = None;
        self.last_minute = None;
        self.total_steps = 0;
        self.steps_this_minute = 0;
        self.accumulated = 0.0;
        self.hourly = [0; 24];
    }

    /// Lifetime whole steps emitted.
    pub const fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Whole steps emitted in the current simulated minute.
    pub const fn steps_this_minute(&self) -> u64 {
        self.steps_this_minute
    }

    /// Whole steps per simulated hour of day.
    pub const fn hourly_distribution(&self) -> &[u64; 24] {
        &self.hourly
    }

    /// The plan for the current simulated date, once one exists.
    pub const fn current_plan(&self) -> Option<&DailyPlan> {
        self.plan.as_ref()
    }

    /// The behavior profile in use.
    pub const fn archetype(&self) -> &ArchetypeProfile {
        &self.archetype
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use chrono::TimeDelta;

    use super::*;
    use crate::archetype;
    use crate::planner::ActivityBlock;

    /// A generator with a hand-built plan so tests control the schedule
    /// exactly.
    fn with_plan(blocks: Vec<ActivityBlock>, sleep_hour: u32, wake_hour: u32) -> StepSimulator {
        let mut sim = StepSimulator::new(archetype::by_id("office"), Some(7));
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        sim.plan = Some(DailyPlan {
            date,
            sleep_hour,
            wake_hour,
            activities: blocks,
        });
        sim.last_date = Some(date);
        sim
    }

    fn walk_block(start_hour: u32, duration_minutes: u32, cadence: u32) -> ActivityBlock {
        ActivityBlock {
            kind: ActivityKind::Walk,
            start_hour,
            start_minute: 0,
            duration_minutes,
            steps_per_minute: cadence,
        }
    }

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, second)
            .unwrap()
    }

    #[test]
    fn block_total_matches_cadence_within_one() {
        // 110 steps/min for 10 minutes: 600 one-second ticks.
        let mut sim = with_plan(vec![walk_block(10, 10, 110)], 0, 8);
        let mut time = at(10, 0, 0);
        for _ in 0..600 {
            let _ = sim.process_tick(time, 1.0, 1.0);
            time += TimeDelta::seconds(1);
        }
        let expected = 110 * 10;
        let diff = sim.total_steps().abs_diff(expected);
        assert!(diff <= 1, "total {} vs expected {expected}", sim.total_steps());
    }

    #[test]
    fn fractional_cadence_accumulates_across_ticks() {
        // 110/60 = 1.83 steps/second: the first tick emits 1, fraction
        // carries until a 2-step tick appears.
        let mut sim = with_plan(vec![walk_block(10, 10, 110)], 0, 8);
        let first = sim.process_tick(at(10, 0, 0), 1.0, 1.0).unwrap();
        assert_eq!(first.steps, 1);
        let mut saw_two = false;
        let mut time = at(10, 0, 1);
        for _ in 0..10 {
            if let Some(sample) = sim.process_tick(time, 1.0, 1.0)
                && sample.steps == 2
            {
                saw_two = true;
            }
            time += TimeDelta::seconds(1);
        }
        assert!(saw_two, "carried fraction never produced a 2-step tick");
    }

    #[test]
    fn sleeping_emits_nothing_and_clears_fraction() {
        let mut sim = with_plan(vec![walk_block(10, 30, 110)], 22, 6);
        // Build up a fraction inside the block.
        let sample = sim.process_tick(at(10, 0, 0), 1.0, 1.0);
        assert!(sample.is_some());
        // Hour 23 is inside the wrapped sleep interval [22, 6).
        assert!(sim.process_tick(at(23, 0, 0), 1.0, 1.0).is_none());
        // Back in the block: the old fraction must not leak in. A
        // single 1-second tick at 110/min emits exactly 1 step.
        let sample = sim.process_tick(at(10, 5, 0), 1.0, 1.0);
        assert_eq!(sample.unwrap().steps, 1);
    }

    #[test]
    fn outside_any_block_emits_nothing() {
        let mut sim = with_plan(vec![walk_block(10, 10, 110)], 0, 8);
        assert!(sim.process_tick(at(12, 0, 0), 1.0, 1.0).is_none());
        assert_eq!(sim.total_steps(), 0);
    }

    #[test]
    fn minute_counter_resets_on_minute_change() {
        let mut sim = with_plan(vec![walk_block(10, 10, 110)], 0, 8);
        let mut time = at(10, 0, 0);
        for _ in 0..60 {
            let _ = sim.process_tick(time, 1.0, 1.0);
            time += TimeDelta::seconds(1);
        }
        assert!(sim.steps_this_minute() > 0);
        // First tick of the next minute starts the counter over.
        let sample = sim.process_tick(at(10, 1, 0), 1.0, 1.0).unwrap();
        assert!(sample.steps_this_minute <= 2);
    }

    #[test]
    fn date_rollover_triggers_replan() {
        let mut sim = StepSimulator::new(archetype::by_id("office"), Some(99));
        let _ = sim.process_tick(at(12, 0, 0), 1.0, 1.0);
        let first_date = sim.current_plan().unwrap().date;

        let next_day = at(12, 0, 0) + TimeDelta::days(1);
        let _ = sim.process_tick(next_day, 1.0, 1.0);
        let second_date = sim.current_plan().unwrap().date;

        assert_eq!(second_date, first_date + TimeDelta::days(1));
    }

    #[test]
    fn multiplier_scales_emission_rate() {
        let mut sim = with_plan(vec![walk_block(10, 10, 120)], 0, 8);
        // 120/min = 2/sec; zero multiplier suppresses steps entirely.
        assert!(sim.process_tick(at(10, 0, 0), 1.0, 0.0).is_none());
        // Full multiplier emits 2 per second.
        let sample = sim.process_tick(at(10, 0, 1), 1.0, 1.0).unwrap();
        assert_eq!(sample.steps, 2);
    }

    #[test]
    fn hourly_distribution_tracks_emission_hour() {
        let mut sim = with_plan(vec![walk_block(14, 10, 120)], 0, 8);
        let _ = sim.process_tick(at(14, 0, 0), 1.0, 1.0);
        assert_eq!(sim.hourly_distribution()[14], 2);
        assert_eq!(sim.hourly_distribution()[13], 0);
    }

    #[test]
    fn reset_clears_counters_and_plan() {
        let mut sim = with_plan(vec![walk_block(10, 10, 120)], 0, 8);
        let _ = sim.process_tick(at(10, 0, 0), 1.0, 1.0);
        sim.reset();
        assert_eq!(sim.total_steps(), 0);
        assert!(sim.current_plan().is_none());
        assert_eq!(sim.hourly_distribution(), &[0; 24]);
    }

    #[test]
    fn set_archetype_resets_state() {
        let mut sim = with_plan(vec![walk_block(10, 10, 120)], 0, 8);
        let _ = sim.process_tick(at(10, 0, 0), 1.0, 1.0);
        sim.set_archetype(archetype::by_id("athlete"));
        assert_eq!(sim.total_steps(), 0);
        assert_eq!(sim.archetype().id, "athlete");
    }
}
