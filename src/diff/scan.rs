//! Iterative deepening over perft totals.

use log::info;

use super::{Anomaly, EnginePair, QueryStats};
use crate::board::BoardAdapter;
use crate::error::DiffError;

#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// Totals agreed at every depth up to and including `max_depth`.
    Agreed { max_depth: u32 },
    /// First depth at which the totals differ, with a fresh board rooted at
    /// the scanned position.
    Diverged {
        depth: u32,
        candidate_total: u64,
        oracle_total: u64,
        board: BoardAdapter,
    },
}

#[derive(Debug, Clone)]
pub struct Scan {
    pub outcome: ScanOutcome,
    pub anomalies: Vec<Anomaly>,
    pub stats: QueryStats,
}

pub struct DepthScanner<'p, 'e> {
    pair: &'p EnginePair<'e>,
}

impl<'p, 'e> DepthScanner<'p, 'e> {
    pub fn new(pair: &'p EnginePair<'e>) -> Self {
        Self { pair }
    }

    /// Compare totals at depths `1..=max_depth`, stopping at the first
    /// disagreement.
    pub fn scan(&self, fen: &str) -> Result<Scan, DiffError> {
        // validate the FEN before any engine is spawned
        let board = BoardAdapter::from_fen(fen)?;
        let root = board.root_fen().to_string();
        let max_depth = self.pair.params.max_depth;

        let mut stats = QueryStats::new();
        stats.start_timing();
        let mut anomalies = Vec::new();

        for depth in 1..=max_depth {
            info!("running perft at depth {}", depth);
            let (candidate, oracle) = self.pair.query(&root, depth)?;
            stats.inc_level();
            anomalies.extend(self.pair.anomalies(&root, depth, &candidate, &oracle));

            if candidate.total == oracle.total {
                continue;
            }

            info!(
                "nodes at depth {} are different ({} vs {})",
                depth, candidate.total, oracle.total
            );
            stats.update_timing();
            return Ok(Scan {
                outcome: ScanOutcome::Diverged {
                    depth,
                    candidate_total: candidate.total,
                    oracle_total: oracle.total,
                    board,
                },
                anomalies,
                stats,
            });
        }

        stats.update_timing();
        Ok(Scan {
            outcome: ScanOutcome::Agreed { max_depth },
            anomalies,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;
    use crate::diff::DiffParams;
    use crate::engine::{MoveCounts, PerftEngine};
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Reports fixed totals per depth and remembers the deepest query.
    struct TotalsEngine {
        totals: Vec<u64>,
        deepest: AtomicU32,
    }

    impl TotalsEngine {
        fn new(totals: &[u64]) -> Self {
            Self {
                totals: totals.to_vec(),
                deepest: AtomicU32::new(0),
            }
        }
    }

    impl PerftEngine for TotalsEngine {
        fn name(&self) -> &str {
            "totals"
        }

        fn query(&self, _fen: &str, depth: u32) -> Result<MoveCounts, EngineError> {
            self.deepest.fetch_max(depth, Ordering::SeqCst);
            let total = self.totals[depth as usize - 1];
            Ok(MoveCounts::new(total))
        }
    }

    const TRUE_TOTALS: [u64; 7] = [20, 400, 8902, 197281, 4865609, 119060324, 3195901860];

    #[test]
    fn stops_at_first_differing_depth() {
        let mut buggy = TRUE_TOTALS;
        buggy[5] += 1;
        buggy[6] += 7;
        let candidate = TotalsEngine::new(&buggy);
        let oracle = TotalsEngine::new(&TRUE_TOTALS);
        let pair = EnginePair::new(&candidate, &oracle, DiffParams::new().check_sums(false));

        let scan = DepthScanner::new(&pair).scan(START_FEN).unwrap();
        match scan.outcome {
            ScanOutcome::Diverged {
                depth,
                candidate_total,
                oracle_total,
                board,
            } => {
                assert_eq!(depth, 6);
                assert_eq!(candidate_total, 119060325);
                assert_eq!(oracle_total, 119060324);
                assert_eq!(board.depth(), 0);
                assert_eq!(board.fen(), START_FEN);
            }
            other => panic!("expected divergence, got {:?}", other),
        }
        assert_eq!(candidate.deepest.load(Ordering::SeqCst), 6);
        assert_eq!(scan.stats.levels, 6);
    }

    #[test]
    fn agreement_up_to_the_horizon_is_success() {
        let candidate = TotalsEngine::new(&TRUE_TOTALS);
        let oracle = TotalsEngine::new(&TRUE_TOTALS);
        let params = DiffParams::new().max_depth(4).parallel(false).check_sums(false);
        let pair = EnginePair::new(&candidate, &oracle, params);

        let scan = DepthScanner::new(&pair).scan(START_FEN).unwrap();
        assert!(matches!(scan.outcome, ScanOutcome::Agreed { max_depth: 4 }));
        assert_eq!(oracle.deepest.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn bad_fen_fails_before_any_query() {
        let candidate = TotalsEngine::new(&TRUE_TOTALS);
        let oracle = TotalsEngine::new(&TRUE_TOTALS);
        let pair = EnginePair::new(&candidate, &oracle, DiffParams::new());

        let err = DepthScanner::new(&pair).scan("rnbqkbnr/pppppppp w").unwrap_err();
        assert!(matches!(err, DiffError::Board(_)));
        assert_eq!(candidate.deepest.load(Ordering::SeqCst), 0);
    }
}
