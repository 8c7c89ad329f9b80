// Filler-run guard: count budget, duration budget and reset semantics.

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use e2ee_core::options::KeyProviderOptions;
    use e2ee_core::sif_guard::{SifGuard, SifGuardConfig, SifState};

// # ✅ 1. Count budget

    #[test]
    fn count_budget_trips_at_100() {
        let mut guard = SifGuard::default();
        let now = Instant::now();

        for i in 0..100 {
            assert!(guard.is_sif_allowed_at(now), "filler {} should be allowed", i);
            guard.record_sif_at(now);
        }
        assert_eq!(guard.consecutive_sif_count(), 100);
        assert!(!guard.is_sif_allowed_at(now));
    }

    #[test]
    fn user_frame_restores_full_budget() {
        let mut guard = SifGuard::default();
        let now = Instant::now();
        for _ in 0..100 {
            guard.record_sif_at(now);
        }
        assert!(!guard.is_sif_allowed_at(now));

        guard.record_user_frame();
        assert_eq!(guard.state(), SifState::Idle);

        for _ in 0..99 {
            guard.record_sif_at(now);
        }
        assert!(guard.is_sif_allowed_at(now));
        guard.record_sif_at(now);
        assert!(!guard.is_sif_allowed_at(now));
    }

// # ✅ 2. Duration budget

    #[test]
    fn duration_budget_trips_below_count() {
        let mut guard = SifGuard::default();
        let start = Instant::now();
        guard.record_sif_at(start);

        assert!(guard.is_sif_allowed_at(start + Duration::from_millis(1_999)));
        assert!(!guard.is_sif_allowed_at(start + Duration::from_millis(2_000)));
        assert!(!guard.is_sif_allowed_at(start + Duration::from_millis(2_500)));
        assert_eq!(guard.consecutive_sif_count(), 1);
    }

    #[test]
    fn run_start_is_first_filler_not_last() {
        let mut guard = SifGuard::default();
        let start = Instant::now();
        guard.record_sif_at(start);
        guard.record_sif_at(start + Duration::from_millis(1_500));

        assert_eq!(guard.last_sif_at(), Some(start + Duration::from_millis(1_500)));
        assert_eq!(guard.run_elapsed_at(start + Duration::from_millis(2_100)), Duration::from_millis(2_100));
        assert!(!guard.is_sif_allowed_at(start + Duration::from_millis(2_100)));
    }

    #[test]
    fn idle_guard_always_allows() {
        let guard = SifGuard::default();
        assert!(guard.is_sif_allowed());
        assert_eq!(guard.state(), SifState::Idle);
        assert_eq!(guard.run_elapsed_at(Instant::now()), Duration::ZERO);
    }

// # ✅ 3. Reset and bookkeeping

    #[test]
    fn reset_clears_everything() {
        let mut guard = SifGuard::default();
        guard.record_user_frame();
        guard.record_sif();
        assert_eq!(guard.state(), SifState::FillerRun);
        assert_eq!(guard.user_frames_since_sif(), 0);

        guard.reset();
        assert_eq!(guard.state(), SifState::Idle);
        assert_eq!(guard.consecutive_sif_count(), 0);
        assert_eq!(guard.last_sif_at(), None);
    }

    #[test]
    fn user_frames_counted_since_last_filler() {
        let mut guard = SifGuard::default();
        guard.record_sif();
        guard.record_user_frame();
        guard.record_user_frame();
        assert_eq!(guard.user_frames_since_sif(), 2);
        assert!(guard.last_sif_at().is_some());
    }

    #[test]
    fn config_follows_options() {
        let opts = KeyProviderOptions { sif_max_count: 3, sif_max_duration_ms: 50, ..KeyProviderOptions::default() };
        let cfg = SifGuardConfig::from(&opts);
        assert_eq!(cfg, SifGuardConfig { max_count: 3, max_duration: Duration::from_millis(50) });

        let mut guard = SifGuard::new(cfg);
        let now = Instant::now();
        for _ in 0..3 {
            guard.record_sif_at(now);
        }
        assert!(!guard.is_sif_allowed_at(now));
    }
}
