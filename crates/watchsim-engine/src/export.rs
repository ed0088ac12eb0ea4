//! Per-minute step export.
//!
//! The recorder subscribes to the event stream and captures one record
//! per simulated minute: the minute's timestamp and the running step
//! total at that point. On completion the records are written out as
//! newline-separated CSV or as a single JSON document.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;
use watchsim_core::config::ExportFormat;
use watchsim_core::dispatch::ListenerError;
use watchsim_core::supervisor::SimulationSupervisor;
use watchsim_types::{EventEnvelope, SimulationEvent};

use crate::error::EngineError;

/// One exported record: running step total at a minute boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MinuteRecord {
    /// Simulated time of the minute boundary.
    pub timestamp: NaiveDateTime,
    /// Running whole-step total at that boundary.
    pub steps: u64,
}

/// Collects per-minute records from the event stream.
#[derive(Debug, Clone, Default)]
pub struct ExportRecorder {
    records: Arc<Mutex<Vec<MinuteRecord>>>,
}

impl ExportRecorder {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// The event listener that feeds this recorder.
    pub fn listener(&self) -> impl FnMut(&EventEnvelope) -> Result<(), ListenerError> + Send + use<> {
        let records = Arc::clone(&self.records);
        let mut running_total: u64 = 0;
        move |envelope: &EventEnvelope| {
            match envelope.event {
                SimulationEvent::NewStep { total_steps, .. } => {
                    running_total = total_steps;
                }
                SimulationEvent::NewMinute { .. } => {
                    records
                        .lock()
                        .map_err(|_| "recorder poisoned")?
                        .push(MinuteRecord {
                            timestamp: envelope.simulated_time,
                            steps: running_total,
                        });
                }
                _ => {}
            }
            Ok(())
        }
    }

    /// Subscribe this recorder to the supervisor's event stream.
    pub fn attach(&self, supervisor: &mut SimulationSupervisor) {
        supervisor.subscribe("export-recorder", self.listener());
    }

    /// The records captured so far, in emission order.
    pub fn records(&self) -> Vec<MinuteRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Write the captured records to `path` in the given format.
    pub fn write(&self, path: impl AsRef<Path>, format: ExportFormat) -> Result<(), EngineError> {
        let records = self.records();
        let contents = match format {
            ExportFormat::Csv => render_csv(&records),
            ExportFormat::Json => serde_json::to_string_pretty(&records)?,
        };
        std::fs::write(path.as_ref(), contents)?;
        info!(
            path = %path.as_ref().display(),
            records = records.len(),
            ?format,
            "export written"
        );
        Ok(())
    }
}

fn render_csv(records: &[MinuteRecord]) -> String {
    let mut out = String::from("timestamp,steps\n");
    for record in records {
        let _ = writeln!(out, "{},{}", record.timestamp, record.steps);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::NaiveDate;
    use watchsim_core::dispatch::Dispatcher;
    use watchsim_types::ActivityKind;

    use super::*;

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn step_event(total: u64) -> SimulationEvent {
        SimulationEvent::NewStep {
            steps: 1,
            total_steps: total,
            steps_this_minute: 1,
            activity: ActivityKind::Walk,
            steps_per_minute: 110,
        }
    }

    fn feed(recorder: &ExportRecorder, events: Vec<(NaiveDateTime, SimulationEvent)>) {
        let mut dispatcher = Dispatcher::new();
        dispatcher.subscribe("export-recorder", recorder.listener());
        for (time, event) in events {
            dispatcher.dispatch(&EventEnvelope::new(time, event));
        }
    }

    #[test]
    fn records_running_total_per_minute() {
        let recorder = ExportRecorder::new();
        feed(
            &recorder,
            vec![
                (at(0), step_event(10)),
                (at(1), SimulationEvent::NewMinute { minute: 1 }),
                (at(1), step_event(25)),
                (at(2), SimulationEvent::NewMinute { minute: 2 }),
            ],
        );
        let records = recorder.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].steps, 10);
        assert_eq!(records[0].timestamp, at(1));
        assert_eq!(records[1].steps, 25);
    }

    #[test]
    fn seconds_and_state_events_are_ignored() {
        let recorder = ExportRecorder::new();
        feed(
            &recorder,
            vec![
                (at(0), SimulationEvent::NewSecond { second: 30 }),
                (
                    at(0),
                    SimulationEvent::SimulationComplete {
                        total_steps: 100,
                        duration_days: 1,
                    },
                ),
            ],
        );
        assert!(recorder.records().is_empty());
    }

    #[test]
    fn csv_rendering_shape() {
        let records = vec![
            MinuteRecord {
                timestamp: at(0),
                steps: 12,
            },
            MinuteRecord {
                timestamp: at(1),
                steps: 30,
            },
        ];
        let csv = render_csv(&records);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("timestamp,steps"));
        assert_eq!(lines.next(), Some("2024-01-01 09:00:00,12"));
        assert_eq!(lines.next(), Some("2024-01-01 09:01:00,30"));
    }

    #[test]
    fn json_export_is_an_array_of_records() {
        let records = vec![MinuteRecord {
            timestamp: at(0),
            steps: 12,
        }];
        let json = serde_json::to_value(&records).unwrap();
        assert_eq!(json[0]["steps"], 12);
    }
}
