// Track pipeline: tolerance budget, fatal errors, filler guard wiring, lazy transform and the threaded worker.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crossbeam::channel::{unbounded, Receiver};
    use e2ee_core::constants::DEFAULT_RATCHET_SALT;
    use e2ee_core::crypto::iv_salt_for_participant;
    use e2ee_core::events::{E2eeEvent, EventEmitter};
    use e2ee_core::frame_worker::{encode_frame, FrameWorkerError};
    use e2ee_core::framing::{Frame, FrameError, FrameKind};
    use e2ee_core::keys::{KeyMaterial, KeyProvider, KeySet, RotatingKeyProvider};
    use e2ee_core::options::KeyProviderOptions;
    use e2ee_core::pipeline::{
        spawn_track_worker, Direction, DropReason, FrameOutcome, FrameSink, SinkError, TrackConfig, TrackError,
        TrackPipeline,
    };

    fn audio(n: u8) -> Frame {
        Frame::new(FrameKind::Audio, vec![0x78, n, n, n, n]).with_timestamp(n as u32 * 960)
    }

    fn filler() -> Frame {
        Frame::new(FrameKind::Empty, Vec::new())
    }

    fn provider(options: &KeyProviderOptions) -> Arc<dyn KeyProvider> {
        let p = RotatingKeyProvider::new(options.clone(), EventEmitter::disabled()).unwrap();
        p.set_key("alice", KeyMaterial::new(&[1u8; 32]).unwrap(), None).unwrap();
        Arc::new(p)
    }

    fn pipeline(
        direction: Direction,
        participant: &str,
        options: &KeyProviderOptions,
        provider: Arc<dyn KeyProvider>,
    ) -> (TrackPipeline, Receiver<E2eeEvent>) {
        let (tx, rx) = unbounded();
        let config = TrackConfig::from_options(participant, "audio-0", direction, options);
        (TrackPipeline::new(config, provider, EventEmitter::new(tx)), rx)
    }

    /// Well-formed frame from alice under a key index the provider never saw.
    fn stray_frame(counter: u64) -> Frame {
        let ks = KeySet::derive(7, KeyMaterial::new(&[1u8; 32]).unwrap(), DEFAULT_RATCHET_SALT).unwrap();
        encode_frame(&audio(1), &ks, &iv_salt_for_participant("alice"), counter).unwrap().frame
    }

    /// Accepts `room` frames, then refuses everything.
    struct BoundedSink {
        accepted: Vec<Frame>,
        room: usize,
    }

    impl FrameSink for BoundedSink {
        fn push(&mut self, frame: Frame) -> Result<(), SinkError> {
            if self.accepted.len() == self.room {
                return Err(SinkError("sink full".into()));
            }
            self.accepted.push(frame);
            Ok(())
        }
    }

    fn forwarded(outcome: FrameOutcome) -> Frame {
        match outcome {
            FrameOutcome::Forward(f) => f,
            other => panic!("expected forward, got {:?}", other),
        }
    }

// # ✅ 1. Encrypt -> decrypt through two pipelines

    #[test]
    fn encrypt_then_decrypt_roundtrip() {
        let opts = KeyProviderOptions::default();
        let keys = provider(&opts);
        let (mut tx_track, _) = pipeline(Direction::Encrypt, "alice", &opts, keys.clone());
        let (mut rx_track, _) = pipeline(Direction::Decrypt, "alice", &opts, keys);

        for n in 0..5 {
            let wire = forwarded(tx_track.process(audio(n)).unwrap());
            assert_ne!(wire, audio(n));
            assert_eq!(wire.data[0], 0x78);
            assert_eq!(forwarded(rx_track.process(wire).unwrap()), audio(n));
        }
    }

// # ✅ 2. Tolerance: ten consecutive failures are fatal, the eleventh is never attempted

    #[test]
    fn ten_consecutive_failures_close_the_track() {
        let opts = KeyProviderOptions::default();
        let (mut track, events) = pipeline(Direction::Decrypt, "alice", &opts, provider(&opts));

        for i in 0..9 {
            match track.process(stray_frame(i)).unwrap() {
                FrameOutcome::Dropped(DropReason::Frame(FrameWorkerError::UnknownKeyIndex { index, .. })) => {
                    assert_eq!(index, 7)
                }
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(track.consecutive_failures(), 9);

        match track.process(stray_frame(9)) {
            Err(TrackError::ToleranceExceeded { failures, track_id, .. }) => {
                assert_eq!(failures, 10);
                assert_eq!(track_id, "audio-0");
            }
            other => panic!("expected tolerance exceeded, got {:?}", other),
        }
        assert!(track.is_closed());

        // Eleventh frame is refused without touching the codec
        assert!(matches!(track.process(stray_frame(10)), Err(TrackError::Closed)));
        assert_eq!(track.telemetry().counters.decode_failures, 10);

        let fatal: Vec<E2eeEvent> = events.try_iter().collect();
        assert_eq!(
            fatal,
            vec![E2eeEvent::ToleranceExceeded { participant: "alice".into(), track_id: "audio-0".into(), failures: 10 }]
        );
    }

    #[test]
    fn sparse_failures_are_tolerated_indefinitely() {
        let opts = KeyProviderOptions::default();
        let keys = provider(&opts);
        let (mut tx_track, _) = pipeline(Direction::Encrypt, "alice", &opts, keys.clone());
        let (mut rx_track, _) = pipeline(Direction::Decrypt, "alice", &opts, keys);

        for round in 0..5u64 {
            for i in 0..9 {
                assert!(matches!(rx_track.process(stray_frame(round * 10 + i)), Ok(FrameOutcome::Dropped(_))));
            }
            let good = forwarded(tx_track.process(audio(round as u8)).unwrap());
            assert_eq!(forwarded(rx_track.process(good).unwrap()), audio(round as u8));
            assert_eq!(rx_track.consecutive_failures(), 0);
        }
        assert!(!rx_track.is_closed());
    }

    #[test]
    fn malformed_frames_count_toward_tolerance() {
        let opts = KeyProviderOptions { failure_tolerance: 2, ..KeyProviderOptions::default() };
        let (mut track, _) = pipeline(Direction::Decrypt, "alice", &opts, provider(&opts));
        let short = Frame::new(FrameKind::Key, vec![0u8; 12]);

        match track.process(short.clone()).unwrap() {
            FrameOutcome::Dropped(DropReason::Frame(FrameWorkerError::Malformed(FrameError::TooShort { .. }))) => {}
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(matches!(track.process(short), Err(TrackError::ToleranceExceeded { failures: 2, .. })));
    }

// # ✅ 3. Missing keys are fatal at once

    #[test]
    fn unknown_participant_is_fatal() {
        let opts = KeyProviderOptions::default();
        let (mut track, _) = pipeline(Direction::Decrypt, "mallory", &opts, provider(&opts));

        match track.process(stray_frame(0)) {
            Err(TrackError::KeyUnavailable { participant, .. }) => assert_eq!(participant, "mallory"),
            other => panic!("expected key unavailable, got {:?}", other),
        }
        assert!(matches!(track.process(stray_frame(1)), Err(TrackError::Closed)));
    }

    #[test]
    fn encrypt_without_key_is_fatal() {
        let opts = KeyProviderOptions::default();
        let empty: Arc<dyn KeyProvider> = Arc::new(RotatingKeyProvider::new(opts.clone(), EventEmitter::disabled()).unwrap());
        let (mut track, _) = pipeline(Direction::Encrypt, "alice", &opts, empty);

        let err = track.process(audio(0)).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, TrackError::KeyUnavailable { .. }));
    }

// # ✅ 4. Filler frames go through the guard

    #[test]
    fn filler_over_budget_is_dropped_and_reported_once() {
        let opts = KeyProviderOptions { sif_max_count: 3, ..KeyProviderOptions::default() };
        let (mut track, events) = pipeline(Direction::Encrypt, "alice", &opts, provider(&opts));
        let now = Instant::now();

        for _ in 0..3 {
            assert_eq!(forwarded(track.process_at(filler(), now).unwrap()), filler());
        }
        for _ in 0..2 {
            match track.process_at(filler(), now).unwrap() {
                FrameOutcome::Dropped(DropReason::SifBudgetExceeded { consecutive, .. }) => assert_eq!(consecutive, 3),
                other => panic!("unexpected outcome {:?}", other),
            }
        }
        assert_eq!(events.try_iter().count(), 1);

        // A genuine frame ends the run and re-arms the report
        forwarded(track.process_at(audio(1), now).unwrap());
        assert_eq!(track.sif_guard().consecutive_sif_count(), 0);
        for _ in 0..3 {
            forwarded(track.process_at(filler(), now).unwrap());
        }
        assert!(matches!(track.process_at(filler(), now), Ok(FrameOutcome::Dropped(_))));
        assert_eq!(events.try_iter().count(), 1);

        let t = track.telemetry();
        assert_eq!(t.counters.sif_drops, 3);
        assert_eq!(t.counters.decode_failures, 0);
        assert!(!track.is_closed());
    }

    #[test]
    fn slow_filler_drip_hits_duration_budget() {
        let opts = KeyProviderOptions::default();
        let (mut track, events) = pipeline(Direction::Decrypt, "alice", &opts, provider(&opts));
        let start = Instant::now();

        for i in 0..20u64 {
            forwarded(track.process_at(filler(), start + Duration::from_millis(i * 100)).unwrap());
        }
        let late = track.process_at(filler(), start + Duration::from_millis(2_000)).unwrap();
        match late {
            FrameOutcome::Dropped(DropReason::SifBudgetExceeded { consecutive, elapsed_ms }) => {
                assert_eq!(consecutive, 20);
                assert_eq!(elapsed_ms, 2_000);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        match events.try_recv().unwrap() {
            E2eeEvent::SifBudgetExceeded { participant, consecutive, .. } => {
                assert_eq!(participant, "alice");
                assert_eq!(consecutive, 20);
            }
            other => panic!("unexpected event {:?}", other),
        }

        track.reset_sif();
        assert!(matches!(track.process_at(filler(), start + Duration::from_millis(2_100)), Ok(FrameOutcome::Forward(_))));
    }

// # ✅ 5. Lazy transform and sink driving

    #[test]
    fn transform_is_lazy_and_skips_drops() {
        let opts = KeyProviderOptions { sif_max_count: 1, ..KeyProviderOptions::default() };
        let (track, _) = pipeline(Direction::Encrypt, "alice", &opts, provider(&opts));

        let source = vec![audio(0), filler(), filler(), audio(1)];
        let mut stream = track.transform(source);

        assert!(stream.next().unwrap().is_ok());
        assert_eq!(stream.pipeline().telemetry().counters.frames_audio, 1);

        let rest: Vec<_> = stream.by_ref().collect();
        assert_eq!(rest.len(), 2, "second filler is dropped");
        assert!(stream.next().is_none());
        assert!(stream.pipeline().is_closed());
    }

    #[test]
    fn transform_ends_after_fatal_error() {
        let opts = KeyProviderOptions { failure_tolerance: 1, ..KeyProviderOptions::default() };
        let (track, _) = pipeline(Direction::Decrypt, "alice", &opts, provider(&opts));

        let mut stream = track.transform(vec![stray_frame(0), stray_frame(1), stray_frame(2)]);
        assert!(matches!(stream.next(), Some(Err(TrackError::ToleranceExceeded { .. }))));
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }

    #[test]
    fn run_into_vec_sink() {
        let opts = KeyProviderOptions::default();
        let (mut track, _) = pipeline(Direction::Encrypt, "alice", &opts, provider(&opts));

        let mut sink: Vec<Frame> = Vec::new();
        let snapshot = track.run(vec![audio(0), audio(1), filler(), audio(2)], &mut sink).unwrap();

        assert_eq!(sink.len(), 4);
        assert_eq!(snapshot.counters.frames_audio, 3);
        assert_eq!(snapshot.counters.frames_empty, 1);
        assert_eq!(snapshot.counters.bytes_overhead, 3 * (16 + 21));
        assert!(snapshot.sanity_check());
        assert!(track.is_closed());
    }

    #[test]
    fn sink_error_stops_run_but_keeps_track_open() {
        let opts = KeyProviderOptions::default();
        let keys = provider(&opts);
        let (mut tx_track, _) = pipeline(Direction::Encrypt, "alice", &opts, keys.clone());
        let (mut rx_track, _) = pipeline(Direction::Decrypt, "alice", &opts, keys);

        let mut full = BoundedSink { accepted: Vec::new(), room: 1 };
        let err = tx_track.run(vec![audio(0), audio(1)], &mut full).unwrap_err();
        assert!(matches!(err, TrackError::Sink(_)));
        assert!(!err.is_fatal());
        assert!(!tx_track.is_closed());
        assert_eq!(full.accepted.len(), 1);

        // Same track resumes into a fresh sink
        let mut sink: Vec<Frame> = Vec::new();
        tx_track.run(vec![audio(2)], &mut sink).unwrap();
        assert!(tx_track.is_closed());

        assert_eq!(forwarded(rx_track.process(full.accepted.remove(0)).unwrap()), audio(0));
        assert_eq!(forwarded(rx_track.process(sink.remove(0)).unwrap()), audio(2));
    }

// # ✅ 6. Threaded worker

    #[test]
    fn worker_roundtrip_and_shutdown() {
        let opts = KeyProviderOptions::default();
        let keys = provider(&opts);
        let (enc, _) = pipeline(Direction::Encrypt, "alice", &opts, keys.clone());
        let (dec, _) = pipeline(Direction::Decrypt, "alice", &opts, keys);

        let (enc_in, enc_out, enc_handle) = spawn_track_worker(enc).unwrap();
        let (dec_in, dec_out, dec_handle) = spawn_track_worker(dec).unwrap();
        assert_eq!(enc_handle.track_id(), "audio-0");

        for n in 0..8 {
            enc_in.send(audio(n)).unwrap();
            let wire = enc_out.recv().unwrap();
            dec_in.send(wire).unwrap();
            assert_eq!(dec_out.recv().unwrap(), audio(n));
        }

        drop(enc_in);
        drop(dec_in);
        let enc_stats = enc_handle.join().unwrap();
        let dec_stats = dec_handle.join().unwrap();
        assert_eq!(enc_stats.counters.frames_audio, 8);
        assert_eq!(dec_stats.counters.frames_audio, 8);
    }

    #[test]
    fn worker_surfaces_fatal_error() {
        let opts = KeyProviderOptions { failure_tolerance: 3, ..KeyProviderOptions::default() };
        let (track, events) = pipeline(Direction::Decrypt, "alice", &opts, provider(&opts));
        let (input, _output, handle) = spawn_track_worker(track).unwrap();

        for i in 0..3 {
            let _ = input.send(stray_frame(i));
        }

        assert!(matches!(handle.join(), Err(TrackError::ToleranceExceeded { failures: 3, .. })));
        assert!(input.send(stray_frame(9)).is_err());
        assert!(matches!(events.try_recv(), Ok(E2eeEvent::ToleranceExceeded { .. })));
    }
}
