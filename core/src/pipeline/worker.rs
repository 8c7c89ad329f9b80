use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::framing::Frame;
use crate::telemetry::TelemetrySnapshot;
use super::track::TrackPipeline;
use super::types::{FrameOutcome, TrackError};

/// At most one frame in flight per direction.
const TRACK_CHANNEL_CAPACITY: usize = 1;

/// Owner's handle on a running track worker.
#[derive(Debug)]
pub struct TrackHandle {
    track_id: String,
    join: JoinHandle<Result<TelemetrySnapshot, TrackError>>,
}

impl TrackHandle {
    pub fn track_id(&self) -> &str {
        &self.track_id
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the worker to stop. Drop the input sender first, or this
    /// blocks until the track fails.
    pub fn join(self) -> Result<TelemetrySnapshot, TrackError> {
        self.join.join().map_err(|_| TrackError::WorkerPanicked)?
    }
}

/// Run `pipeline` on its own thread between two bounded channels.
///
/// Returns the frame input, the processed-frame output and the handle.
/// The worker stops between frames when the input sender is dropped, when
/// the output receiver is dropped, or on a fatal track error. It closes the
/// pipeline on every exit path.
pub fn spawn_track_worker(
    mut pipeline: TrackPipeline,
) -> Result<(Sender<Frame>, Receiver<Frame>, TrackHandle), TrackError> {
    let (in_tx, in_rx) = bounded::<Frame>(TRACK_CHANNEL_CAPACITY);
    let (out_tx, out_rx) = bounded::<Frame>(TRACK_CHANNEL_CAPACITY);
    let track_id = pipeline.config().track_id.clone();

    let join = thread::Builder::new()
        .name(format!("e2ee-track-{track_id}"))
        .spawn(move || run_worker(&mut pipeline, in_rx, out_tx))
        .map_err(TrackError::Spawn)?;

    Ok((in_tx, out_rx, TrackHandle { track_id, join }))
}

fn run_worker(
    pipeline: &mut TrackPipeline,
    rx: Receiver<Frame>,
    tx: Sender<Frame>,
) -> Result<TelemetrySnapshot, TrackError> {
    let track_id = pipeline.config().track_id.clone();
    debug!(track = %track_id, "track worker started");

    for frame in rx.iter() {
        match pipeline.process(frame) {
            Ok(FrameOutcome::Forward(out)) => {
                if tx.send(out).is_err() {
                    warn!(track = %track_id, "output receiver gone, stopping track worker");
                    break;
                }
            }
            Ok(FrameOutcome::Dropped(_)) => {}
            Err(e) => {
                pipeline.close();
                return Err(e);
            }
        }
    }

    pipeline.close();
    debug!(track = %track_id, "track worker finished");
    Ok(pipeline.telemetry())
}
