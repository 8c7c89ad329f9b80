//! Mutable per-track counters.
//!
//! Collected frame by frame on the track's own thread, so no atomics.
//! Converted into an immutable `TelemetrySnapshot` on demand.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::framing::FrameKind;

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub frames_key: u64,
    pub frames_delta: u64,
    pub frames_audio: u64,
    pub frames_empty: u64,
    /// Frames absorbed without output (per-frame errors, SIF drops).
    pub frames_dropped: u64,
    pub decode_failures: u64,
    pub sif_drops: u64,
    pub ratchet_steps: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Tag + trailer bytes added or removed by the codec.
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record one frame that made it through the codec.
    pub fn add_frame(&mut self, kind: FrameKind, len_in: usize, len_out: usize) {
        match kind {
            FrameKind::Key => self.frames_key += 1,
            FrameKind::Delta => self.frames_delta += 1,
            FrameKind::Audio => self.frames_audio += 1,
            FrameKind::Empty => self.frames_empty += 1,
        }
        self.bytes_in += len_in as u64;
        self.bytes_out += len_out as u64;
        self.bytes_overhead += len_in.abs_diff(len_out) as u64;
    }

    pub fn add_failure(&mut self, decryption: bool) {
        self.frames_dropped += 1;
        if decryption {
            self.decode_failures += 1;
        }
    }

    pub fn add_sif_drop(&mut self) {
        self.frames_dropped += 1;
        self.sif_drops += 1;
    }

    pub fn add_ratchet_steps(&mut self, steps: u8) {
        self.ratchet_steps += steps as u64;
    }

    pub fn frames_forwarded(&self) -> u64 {
        self.frames_key + self.frames_delta + self.frames_audio + self.frames_empty
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.frames_key += other.frames_key;
        self.frames_delta += other.frames_delta;
        self.frames_audio += other.frames_audio;
        self.frames_empty += other.frames_empty;
        self.frames_dropped += other.frames_dropped;
        self.decode_failures += other.decode_failures;
        self.sif_drops += other.sif_drops;
        self.ratchet_steps += other.ratchet_steps;

        self.bytes_in += other.bytes_in;
        self.bytes_out += other.bytes_out;
        self.bytes_overhead += other.bytes_overhead;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
