//! Bound on consecutive filler (SIF) frames.
//!
//! State machine per track: `Idle -> FillerRun -> Idle`.
//!
//! Two independent budgets are checked against the current run before the
//! next filler is admitted: a count ceiling catches a rapid flood, a
//! duration ceiling catches a slow drip. One genuine frame ends the run.
//!
//! Every operation has an `_at` twin taking an explicit `Instant` so callers
//! and tests can drive the clock.

use std::time::{Duration, Instant};

use crate::constants::{MAX_SIF_COUNT, MAX_SIF_DURATION_MS};
use crate::options::KeyProviderOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SifGuardConfig {
    pub max_count: u32,
    pub max_duration: Duration,
}

impl Default for SifGuardConfig {
    fn default() -> Self {
        Self {
            max_count: MAX_SIF_COUNT,
            max_duration: Duration::from_millis(MAX_SIF_DURATION_MS),
        }
    }
}

impl From<&KeyProviderOptions> for SifGuardConfig {
    fn from(opts: &KeyProviderOptions) -> Self {
        Self {
            max_count: opts.sif_max_count,
            max_duration: opts.sif_max_duration(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SifState {
    Idle,
    FillerRun,
}

#[derive(Debug, Clone)]
pub struct SifGuard {
    config: SifGuardConfig,
    consecutive_sif_count: u32,
    sif_run_started_at: Option<Instant>,
    last_sif_at: Option<Instant>,
    user_frames_since_sif: u64,
}

impl Default for SifGuard {
    fn default() -> Self {
        Self::new(SifGuardConfig::default())
    }
}

impl SifGuard {
    pub fn new(config: SifGuardConfig) -> Self {
        Self {
            config,
            consecutive_sif_count: 0,
            sif_run_started_at: None,
            last_sif_at: None,
            user_frames_since_sif: 0,
        }
    }

    pub fn config(&self) -> SifGuardConfig {
        self.config
    }

    pub fn record_sif(&mut self) {
        self.record_sif_at(Instant::now());
    }

    pub fn record_sif_at(&mut self, now: Instant) {
        if self.consecutive_sif_count == 0 {
            self.sif_run_started_at = Some(now);
        }
        self.consecutive_sif_count = self.consecutive_sif_count.saturating_add(1);
        self.last_sif_at = Some(now);
        self.user_frames_since_sif = 0;
    }

    /// A genuine frame clears the run.
    pub fn record_user_frame(&mut self) {
        self.consecutive_sif_count = 0;
        self.sif_run_started_at = None;
        self.user_frames_since_sif = self.user_frames_since_sif.saturating_add(1);
    }

    pub fn is_sif_allowed(&self) -> bool {
        self.is_sif_allowed_at(Instant::now())
    }

    pub fn is_sif_allowed_at(&self, now: Instant) -> bool {
        if self.consecutive_sif_count >= self.config.max_count {
            return false;
        }
        match self.sif_run_started_at {
            Some(start) => now.saturating_duration_since(start) < self.config.max_duration,
            None => true,
        }
    }

    pub fn reset(&mut self) {
        self.consecutive_sif_count = 0;
        self.sif_run_started_at = None;
        self.last_sif_at = None;
        self.user_frames_since_sif = 0;
    }

    pub fn state(&self) -> SifState {
        if self.consecutive_sif_count == 0 {
            SifState::Idle
        } else {
            SifState::FillerRun
        }
    }

    pub fn consecutive_sif_count(&self) -> u32 {
        self.consecutive_sif_count
    }

    pub fn user_frames_since_sif(&self) -> u64 {
        self.user_frames_since_sif
    }

    pub fn last_sif_at(&self) -> Option<Instant> {
        self.last_sif_at
    }

    /// Length of the current run, zero when idle.
    pub fn run_elapsed_at(&self, now: Instant) -> Duration {
        self.sif_run_started_at
            .map(|start| now.saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
    }
}
