use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::events::{E2eeEvent, EventEmitter};
use crate::frame_worker::{FrameDecryptor, FrameEncryptor, FrameWorkerError};
use crate::framing::Frame;
use crate::keys::KeyProvider;
use crate::sif_guard::SifGuard;
use crate::telemetry::{Stage, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use super::tolerance::FailureTolerance;
use super::types::{Direction, DropReason, FrameOutcome, FrameSink, TrackConfig, TrackError};

#[derive(Debug)]
enum TrackCodec {
    Encrypt { encryptor: FrameEncryptor, provider: Arc<dyn KeyProvider> },
    Decrypt(FrameDecryptor),
}

impl TrackCodec {
    /// Apply the codec to one non-filler frame. Returns the output frame
    /// and the ratchet steps taken.
    fn apply(
        &mut self,
        participant: &str,
        frame: &Frame,
        timer: &mut TelemetryTimer,
    ) -> Result<(Frame, u8), FrameWorkerError> {
        match self {
            TrackCodec::Encrypt { encryptor, provider } => {
                let t0 = Instant::now();
                let key_set = provider.get_key(participant, None)?;
                timer.add_stage_time(Stage::KeyLookup, t0.elapsed());

                let t1 = Instant::now();
                let out = encryptor.encrypt_frame(frame, &key_set)?;
                timer.add_stage_time(Stage::Encrypt, t1.elapsed());
                Ok((out.frame, 0))
            }
            TrackCodec::Decrypt(decryptor) => {
                let t0 = Instant::now();
                let out = decryptor.decrypt_frame(frame)?;
                timer.add_stage_time(Stage::Decrypt, t0.elapsed());
                Ok((out.frame, out.ratchet_steps))
            }
        }
    }
}

/// Per-track transform: codec, filler guard and failure budget for one
/// media track.
///
/// Frames are processed strictly one at a time. Once a fatal error fires
/// the pipeline is closed for good: every later call returns
/// [`TrackError::Closed`] without touching the codec.
#[derive(Debug)]
pub struct TrackPipeline {
    config: TrackConfig,
    codec: Option<TrackCodec>,
    sif_guard: SifGuard,
    tolerance: FailureTolerance,
    events: EventEmitter,
    counters: TelemetryCounters,
    timer: TelemetryTimer,
    /// `SifBudgetExceeded` already reported for the current filler run.
    sif_warned: bool,
}

impl TrackPipeline {
    pub fn new(config: TrackConfig, provider: Arc<dyn KeyProvider>, events: EventEmitter) -> Self {
        let codec = match config.direction {
            Direction::Encrypt => TrackCodec::Encrypt {
                encryptor: FrameEncryptor::with_shared_counter(&config.participant, config.frame_counter.clone()),
                provider,
            },
            Direction::Decrypt => TrackCodec::Decrypt(FrameDecryptor::new(&config.participant, provider)),
        };

        Self {
            sif_guard: SifGuard::new(config.sif),
            tolerance: FailureTolerance::new(config.failure_tolerance),
            codec: Some(codec),
            events,
            counters: TelemetryCounters::default(),
            timer: TelemetryTimer::new(),
            sif_warned: false,
            config,
        }
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.codec.is_none()
    }

    pub fn sif_guard(&self) -> &SifGuard {
        &self.sif_guard
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.tolerance.consecutive()
    }

    pub fn process(&mut self, frame: Frame) -> Result<FrameOutcome, TrackError> {
        self.process_at(frame, Instant::now())
    }

    /// Same as [`process`](Self::process) with an explicit clock for the
    /// filler guard.
    pub fn process_at(&mut self, frame: Frame, now: Instant) -> Result<FrameOutcome, TrackError> {
        let Some(codec) = self.codec.as_mut() else {
            return Err(TrackError::Closed);
        };

        if frame.is_filler() {
            return Ok(self.admit_filler(frame, now));
        }

        let len_in = frame.data.len();
        match codec.apply(&self.config.participant, &frame, &mut self.timer) {
            Ok((out, ratchet_steps)) => {
                self.tolerance.record_success();
                self.sif_guard.record_user_frame();
                self.sif_warned = false;
                self.counters.add_frame(out.kind, len_in, out.data.len());
                self.counters.add_ratchet_steps(ratchet_steps);
                Ok(FrameOutcome::Forward(out))
            }
            Err(e) => self.on_codec_error(e),
        }
    }

    fn admit_filler(&mut self, frame: Frame, now: Instant) -> FrameOutcome {
        if self.sif_guard.is_sif_allowed_at(now) {
            self.sif_guard.record_sif_at(now);
            let len = frame.data.len();
            self.counters.add_frame(frame.kind, len, len);
            return FrameOutcome::Forward(frame);
        }

        let consecutive = self.sif_guard.consecutive_sif_count();
        let elapsed_ms = self.sif_guard.run_elapsed_at(now).as_millis() as u64;
        self.counters.add_sif_drop();

        if !self.sif_warned {
            self.sif_warned = true;
            warn!(
                participant = %self.config.participant,
                track = %self.config.track_id,
                consecutive,
                elapsed_ms,
                "filler budget exceeded, dropping filler frames"
            );
            self.events.emit(E2eeEvent::SifBudgetExceeded {
                participant: self.config.participant.clone(),
                track_id: self.config.track_id.clone(),
                consecutive,
                elapsed_ms,
            });
        }

        FrameOutcome::Dropped(DropReason::SifBudgetExceeded { consecutive, elapsed_ms })
    }

    fn on_codec_error(&mut self, err: FrameWorkerError) -> Result<FrameOutcome, TrackError> {
        let track_id = self.config.track_id.clone();

        if err.is_fatal() {
            error!(participant = %self.config.participant, track = %track_id, error = %err, "fatal codec error, closing track");
            self.close();
            return Err(match err {
                FrameWorkerError::KeyUnavailable { participant } => TrackError::KeyUnavailable { track_id, participant },
                source => TrackError::Fatal { track_id, source },
            });
        }

        self.counters.add_failure(err.is_decryption_failure());
        let failures = self.tolerance.record_failure();
        warn!(
            participant = %self.config.participant,
            track = %track_id,
            failures,
            limit = self.tolerance.limit(),
            error = %err,
            "frame dropped"
        );

        if self.tolerance.exceeded() {
            error!(participant = %self.config.participant, track = %track_id, failures, "failure tolerance exceeded, closing track");
            self.events.emit(E2eeEvent::ToleranceExceeded {
                participant: self.config.participant.clone(),
                track_id: track_id.clone(),
                failures,
            });
            self.close();
            return Err(TrackError::ToleranceExceeded { track_id, failures, last: err });
        }

        Ok(FrameOutcome::Dropped(DropReason::Frame(err)))
    }

    /// Clear filler accounting after an explicit recovery.
    pub fn reset_sif(&mut self) {
        self.sif_guard.reset();
        self.sif_warned = false;
    }

    /// Tear the track down. Releases the key provider handle and clears the
    /// filler guard. Idempotent.
    pub fn close(&mut self) {
        if self.codec.take().is_some() {
            debug!(participant = %self.config.participant, track = %self.config.track_id, "track closed");
            self.reset_sif();
            self.timer.finish();
        }
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::from(&self.counters, &self.timer)
    }

    /// Lazy transform over `source`. Drops are skipped; the stream ends when
    /// the source ends or after yielding the first fatal error.
    pub fn transform<I>(self, source: I) -> TransformStream<I::IntoIter>
    where
        I: IntoIterator<Item = Frame>,
    {
        TransformStream { pipeline: self, source: source.into_iter(), done: false }
    }

    /// Drive `source` through the pipeline into `sink` until either ends.
    ///
    /// A sink error stops the run but leaves the track open, so the caller
    /// may resume with another sink. The frame the sink refused is lost.
    /// Reaching the end of `source` closes the track.
    pub fn run<I, S>(&mut self, source: I, sink: &mut S) -> Result<TelemetrySnapshot, TrackError>
    where
        I: IntoIterator<Item = Frame>,
        S: FrameSink + ?Sized,
    {
        for frame in source {
            if let FrameOutcome::Forward(out) = self.process(frame)? {
                let t0 = Instant::now();
                let pushed = sink.push(out);
                self.timer.add_stage_time(Stage::Sink, t0.elapsed());
                pushed?;
            }
        }

        self.close();
        Ok(self.telemetry())
    }
}

/// Pull-based frame stream produced by [`TrackPipeline::transform`].
///
/// Finite and not restartable: once it returns `None` the underlying
/// pipeline is closed.
#[derive(Debug)]
pub struct TransformStream<I> {
    pipeline: TrackPipeline,
    source: I,
    done: bool,
}

impl<I> TransformStream<I> {
    pub fn pipeline(&self) -> &TrackPipeline {
        &self.pipeline
    }

    pub fn into_pipeline(self) -> TrackPipeline {
        self.pipeline
    }
}

impl<I: Iterator<Item = Frame>> Iterator for TransformStream<I> {
    type Item = Result<Frame, TrackError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for frame in self.source.by_ref() {
            match self.pipeline.process(frame) {
                Ok(FrameOutcome::Forward(out)) => return Some(Ok(out)),
                Ok(FrameOutcome::Dropped(_)) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        self.pipeline.close();
        None
    }
}
