//! Simulator binary for Watchsim.
//!
//! Wires the simulation core to configuration, structured logging, and
//! the optional per-minute export.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `watchsim-config.yaml` (or the path given
//!    as the first argument; missing file means built-in defaults)
//! 2. Initialize structured logging (tracing, `RUST_LOG` overridable)
//! 3. Resolve the wearer archetype and assemble the device
//! 4. Subscribe the event logger and, if enabled, the export recorder
//! 5. Run the drive loop until the configured duration elapses
//! 6. Write the export file and log the final snapshot

mod error;
mod export;

use std::path::Path;

use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use watchsim_core::archetype;
use watchsim_core::config::{DEFAULT_CONFIG_PATH, SimulationConfig};
use watchsim_core::device::DeviceOrchestrator;
use watchsim_core::pacer::WallClockAdapter;
use watchsim_core::runner;
use watchsim_core::supervisor::SimulationSupervisor;
use watchsim_types::SimulationEvent;

use crate::error::EngineError;
use crate::export::ExportRecorder;

/// Application entry point for the simulator.
///
/// # Errors
///
/// Returns an error if configuration loading or the export write fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!(config_path, "watchsim-engine starting");
    info!(
        archetype = config.simulation.archetype,
        speed = config.simulation.speed,
        duration_days = config.simulation.duration_days,
        seed = config.simulation.seed,
        modulation = ?config.simulation.modulation,
        "Configuration loaded"
    );

    // 3. Assemble the device and supervisor.
    let profile = archetype::by_id(&config.simulation.archetype);
    info!(
        profile = profile.id,
        expected_daily_steps = profile.expected_daily_steps(),
        "Archetype resolved"
    );

    let device = DeviceOrchestrator::new(
        config.simulation.start_date,
        profile,
        config.simulation.seed,
        config.simulation.modulation,
    );
    let adapter = WallClockAdapter::new(config.simulation.speed, config.pacing);
    let mut supervisor =
        SimulationSupervisor::new(device, adapter, config.simulation.duration_days);

    // 4. Subscribe listeners.
    supervisor.subscribe("event-log", |envelope| {
        match &envelope.event {
            SimulationEvent::NewState {
                from, to, reason, ..
            } => {
                info!(%from, %to, %reason, simulated_time = %envelope.simulated_time, "state transition");
            }
            SimulationEvent::SimulationComplete {
                total_steps,
                duration_days,
            } => {
                info!(total_steps, duration_days, "simulation complete");
            }
            SimulationEvent::NewMinute { .. } => {
                debug!(simulated_time = %envelope.simulated_time, "minute elapsed");
            }
            SimulationEvent::NewSecond { .. } | SimulationEvent::NewStep { .. } => {}
        }
        Ok(())
    });

    let recorder = ExportRecorder::new();
    if config.export.enabled {
        recorder.attach(&mut supervisor);
        info!(path = config.export.path, "Export recorder attached");
    }

    // 5. Run the drive loop.
    let summary = runner::run_simulation(&mut supervisor, None).await;
    runner::log_run_end(&summary);

    // 6. Write the export and log the final snapshot.
    if config.export.enabled {
        recorder.write(&config.export.path, config.export.format)?;
    }

    let snapshot = supervisor.snapshot();
    info!(
        simulated_time = %snapshot.simulated_time,
        total_steps = snapshot.total_steps,
        final_state = %snapshot.current_state,
        progress = snapshot.progress,
        "Final snapshot"
    );

    Ok(())
}

/// Load the configuration file, falling back to built-in defaults when
/// the file does not exist.
fn load_config(path: &str) -> Result<SimulationConfig, EngineError> {
    if Path::new(path).exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        Ok(SimulationConfig::default())
    }
}
