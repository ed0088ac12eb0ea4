//! Async drive loop for a supervised simulation run.
//!
//! [`run_simulation`] is the top-level entry point: it starts the
//! supervisor and repeatedly sleeps for the pacing delay and processes
//! one frame, until the supervisor pauses itself (completion or an
//! external pause) or an optional frame bound is hit.
//!
//! All simulation logic lives in the supervisor; the runner only owns
//! the sleep/frame cadence.

use tracing::{info, warn};

use crate::supervisor::SimulationSupervisor;

/// Result of a drive-loop run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Frames processed by this run.
    pub frames: u64,
    /// Lifetime whole steps at loop exit.
    pub total_steps: u64,
    /// Progress at loop exit, 0-100.
    pub progress: f64,
    /// Whether the configured duration fully elapsed.
    pub completed: bool,
}

/// Drive the supervisor until it pauses or `max_frames` is reached.
///
/// The loop exits when [`SimulationSupervisor::next_delay`] returns
/// `None`, which happens on completion or any external pause. A
/// `max_frames` bound is mainly useful for bounded test runs.
pub async fn run_simulation(
    supervisor: &mut SimulationSupervisor,
    max_frames: Option<u64>,
) -> RunSummary {
    supervisor.start();
    let snapshot = supervisor.snapshot();
    info!(
        speed = snapshot.speed,
        start = %snapshot.simulated_time,
        "simulation starting"
    );

    let mut frames: u64 = 0;
    loop {
        let Some(delay) = supervisor.next_delay() else {
            break;
        };
        tokio::time::sleep(delay).await;
        supervisor.frame();
        frames = frames.saturating_add(1);

        if let Some(max) = max_frames
            && frames >= max
        {
            supervisor.pause();
            break;
        }
    }

    RunSummary {
        frames,
        total_steps: supervisor.device().total_steps(),
        progress: supervisor.progress(),
        completed: supervisor.is_complete(),
    }
}

/// Log the end of a run.
pub fn log_run_end(summary: &RunSummary) {
    if summary.completed {
        info!(
            frames = summary.frames,
            total_steps = summary.total_steps,
            "simulation ended at full duration"
        );
    } else {
        warn!(
            frames = summary.frames,
            total_steps = summary.total_steps,
            progress = summary.progress,
            "simulation ended before full duration"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::archetype;
    use crate::device::{DeviceOrchestrator, StepModulation};
    use crate::pacer::{PacingConfig, WallClockAdapter};

    fn supervisor(speed: u32) -> SimulationSupervisor {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let device = DeviceOrchestrator::new(
            start,
            archetype::by_id("office"),
            Some(5),
            StepModulation::Schedule,
        );
        let adapter = WallClockAdapter::new(speed, PacingConfig::default());
        SimulationSupervisor::new(device, adapter, 1)
    }

    #[tokio::test]
    async fn bounded_by_max_frames() {
        let mut sup = supervisor(1000);
        let summary = run_simulation(&mut sup, Some(5)).await;
        assert_eq!(summary.frames, 5);
        assert!(!summary.completed);
        assert!(!sup.is_running());
    }

    #[tokio::test]
    async fn bounded_run_advances_simulated_time() {
        let mut sup = supervisor(1000);
        let before = sup.device().current_time();
        let _ = run_simulation(&mut sup, Some(20)).await;
        assert!(sup.device().current_time() > before);
        assert!(sup.progress() > 0.0);
    }

    #[tokio::test]
    async fn summary_matches_supervisor_state() {
        let mut sup = supervisor(1000);
        let summary = run_simulation(&mut sup, Some(10)).await;
        assert!((summary.progress - sup.progress()).abs() < f64::EPSILON);
        assert_eq!(summary.total_steps, sup.device().total_steps());
        assert_eq!(summary.completed, sup.is_complete());
    }
}
