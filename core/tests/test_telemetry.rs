#[cfg(test)]
mod tests {
    use std::time::Duration;

    use e2ee_core::framing::FrameKind;
    use e2ee_core::telemetry::{Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer};

    #[test]
    fn counters_track_kinds_and_bytes() {
        let mut c = TelemetryCounters::default();
        c.add_frame(FrameKind::Key, 100, 137);
        c.add_frame(FrameKind::Audio, 10, 47);
        c.add_frame(FrameKind::Empty, 0, 0);
        c.add_failure(true);
        c.add_failure(false);
        c.add_sif_drop();
        c.add_ratchet_steps(2);

        assert_eq!(c.frames_forwarded(), 3);
        assert_eq!(c.frames_dropped, 3);
        assert_eq!(c.decode_failures, 1);
        assert_eq!(c.sif_drops, 1);
        assert_eq!(c.ratchet_steps, 2);
        assert_eq!(c.bytes_in, 110);
        assert_eq!(c.bytes_out, 184);
        assert_eq!(c.bytes_overhead, 74);
    }

    #[test]
    fn counters_merge() {
        let mut a = TelemetryCounters::default();
        a.add_frame(FrameKind::Delta, 5, 42);
        let mut b = TelemetryCounters::default();
        b.add_frame(FrameKind::Delta, 5, 42);
        b.add_failure(true);

        a += b;
        assert_eq!(a.frames_delta, 2);
        assert_eq!(a.decode_failures, 1);
        assert_eq!(a.bytes_overhead, 74);
    }

    #[test]
    fn stage_times_accumulate() {
        let mut st = StageTimes::default();
        st.add(Stage::Encrypt, Duration::from_micros(10));
        st.add(Stage::Encrypt, Duration::from_micros(5));
        st.add(Stage::KeyLookup, Duration::from_micros(1));

        assert_eq!(st.get(Stage::Encrypt), Duration::from_micros(15));
        assert_eq!(st.get(Stage::Decrypt), Duration::ZERO);
        assert_eq!(st.total(), Duration::from_micros(16));
        assert_eq!(Stage::KeyLookup.to_string(), "key_lookup");
    }

    #[test]
    fn snapshot_is_consistent_and_serializable() {
        let mut c = TelemetryCounters::default();
        c.add_frame(FrameKind::Audio, 10, 47);

        let mut timer = TelemetryTimer::new();
        std::thread::sleep(Duration::from_millis(2));
        timer.finish();

        let snap = TelemetrySnapshot::from(&c, &timer);
        assert!(snap.sanity_check());
        assert!(snap.frames_per_sec > 0.0);

        let json = snap.to_json().unwrap();
        assert!(json.contains("\"frames_audio\":1"));
    }
}
