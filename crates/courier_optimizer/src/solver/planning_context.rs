use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use jiff::{SignedDuration, Timestamp};
use serde::Serialize;

/// Cooperative cancellation signal, checked between genetic generations, 2-opt passes and
/// scheduled days.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PlanningStatistics {
    pub routes_built: usize,
    pub two_opt_passes: usize,
    pub improving_swaps: usize,
    pub generations: usize,
    pub charging_stops: usize,
    pub rest_stops: usize,
    pub recoveries: usize,
}

/// Explicit state threaded through every planning call.
#[derive(Debug, Clone)]
pub struct PlanningContext {
    token: CancellationToken,
    statistics: PlanningStatistics,
    started_at: Timestamp,
}

impl Default for PlanningContext {
    fn default() -> Self {
        PlanningContext::new(CancellationToken::default())
    }
}

impl PlanningContext {
    pub fn new(token: CancellationToken) -> Self {
        PlanningContext {
            token,
            statistics: PlanningStatistics::default(),
            started_at: Timestamp::now(),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn statistics(&self) -> &PlanningStatistics {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut PlanningStatistics {
        &mut self.statistics
    }

    pub fn elapsed(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let context = PlanningContext::default();
        let token = context.token().clone();
        assert!(!context.is_cancelled());

        token.cancel();
        assert!(context.is_cancelled());
    }
}
