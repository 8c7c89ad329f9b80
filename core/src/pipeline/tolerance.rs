/// Consecutive-failure budget for one track.
///
/// A success resets the streak, so sparse failures are tolerated forever;
/// `limit` consecutive failures trip it.
#[derive(Debug, Clone)]
pub struct FailureTolerance {
    limit: u32,
    consecutive: u32,
    total: u64,
}

impl FailureTolerance {
    pub fn new(limit: u32) -> Self {
        Self { limit: limit.max(1), consecutive: 0, total: 0 }
    }

    /// Returns the streak length including this failure.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive = self.consecutive.saturating_add(1);
        self.total += 1;
        self.consecutive
    }

    pub fn record_success(&mut self) {
        self.consecutive = 0;
    }

    pub fn exceeded(&self) -> bool {
        self.consecutive >= self.limit
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}
