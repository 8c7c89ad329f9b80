use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

/// Immutable view of one track's counters and timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: TelemetryCounters,
    /// Frames forwarded per second of track lifetime.
    pub frames_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(counters: &TelemetryCounters, timer: &TelemetryTimer) -> Self {
        let elapsed = timer.elapsed();
        let frames_per_sec = if elapsed.as_secs_f64() > 0.0 {
            counters.frames_forwarded() as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            counters: counters.clone(),
            frames_per_sec,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Stage time can never exceed wall time.
    pub fn sanity_check(&self) -> bool {
        self.stage_times.total() <= self.elapsed
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
