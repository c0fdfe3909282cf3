//! Query statistics
//!
//! Counts engine invocations and time spent waiting on them, so the cost of a
//! localization can be reported next to its result.

use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone)]
pub struct QueryStats {
    /// Candidate engine invocations
    pub candidate_queries: u64,

    /// Oracle engine invocations
    pub oracle_queries: u64,

    /// Levels of the tree that were compared
    pub levels: u64,

    /// Start of the pass
    pub start_time: Option<Instant>,

    /// Time from start to the last update
    pub elapsed: Duration,
}

impl QueryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_timing(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn update_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
        }
    }

    /// Record one compared level (one candidate and one oracle query)
    pub fn inc_level(&mut self) {
        self.levels += 1;
        self.candidate_queries += 1;
        self.oracle_queries += 1;
    }

    pub fn total_queries(&self) -> u64 {
        self.candidate_queries + self.oracle_queries
    }

    /// Fold another pass into this one
    pub fn merge(&mut self, other: &QueryStats) {
        self.candidate_queries += other.candidate_queries;
        self.oracle_queries += other.oracle_queries;
        self.levels += other.levels;
        self.elapsed += other.elapsed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_levels_and_merges() {
        let mut a = QueryStats::new();
        a.inc_level();
        a.inc_level();
        let mut b = QueryStats::new();
        b.inc_level();
        a.merge(&b);
        assert_eq!(a.levels, 3);
        assert_eq!(a.total_queries(), 6);
    }
}
