//! Differential perft: depth scan and divergence localization.
//!
//! [`DepthScanner`] finds the shallowest depth at which candidate and oracle
//! totals disagree, [`Localizer`] then walks down the first diverging subtree
//! until the disagreement is pinned to a single move.

pub mod localize;
pub mod params;
pub mod report;
pub mod scan;
pub mod stats;

use std::fmt;
use std::thread;

use log::{debug, warn};

use crate::engine::{MoveCounts, PerftEngine};
use crate::error::{DiffError, EngineError};

pub use self::localize::{Localizer, SearchContext};
pub use self::params::DiffParams;
pub use self::report::{run, Report};
pub use self::scan::{DepthScanner, ScanOutcome};
pub use self::stats::QueryStats;

/// One disagreement between candidate and oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The oracle generates a move the candidate does not.
    MissingMove { label: String },
    /// The candidate generates a move the oracle does not.
    ExtraMove { label: String },
    /// Both generate the move but count its subtree differently.
    CountMismatch {
        label: String,
        candidate: u64,
        oracle: u64,
    },
    /// The candidate reports a move that is illegal in the position.
    IllegalMoveReported { label: String },
}

impl Mismatch {
    pub fn label(&self) -> &str {
        match self {
            Mismatch::MissingMove { label }
            | Mismatch::ExtraMove { label }
            | Mismatch::CountMismatch { label, .. }
            | Mismatch::IllegalMoveReported { label } => label,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::MissingMove { label } => write!(f, "move {} is missing", label),
            Mismatch::ExtraMove { label } => write!(f, "move {} is additional", label),
            Mismatch::CountMismatch {
                label,
                candidate,
                oracle,
            } => write!(
                f,
                "move {} has a different number of nodes ({} vs {})",
                label, candidate, oracle
            ),
            Mismatch::IllegalMoveReported { label } => {
                write!(f, "move {} is not legal in the current position", label)
            }
        }
    }
}

/// A mismatch with the position it was observed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub fen: String,
    /// Perft depth of the query that exposed it
    pub depth: u32,
    /// Moves from the root to `fen`
    pub moves: Vec<String>,
    pub mismatch: Mismatch,
}

/// How a localization ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conclusion {
    Mismatch(Finding),
    /// Every child subtree agreed: the difference only shows in the totals
    /// one level up, or the walk reached depth 0.
    NoFurtherDivergence {
        fen: String,
        depth: u32,
        moves: Vec<String>,
    },
}

/// A query result whose total is not the sum of its moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub engine: String,
    pub fen: String,
    pub depth: u32,
    pub total: u64,
    pub sum: u128,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reported total {} but its moves sum to {} (depth {}, {})",
            self.engine, self.total, self.sum, self.depth, self.fen
        )
    }
}

/// Candidate and oracle queried side by side.
pub struct EnginePair<'a> {
    pub candidate: &'a dyn PerftEngine,
    pub oracle: &'a dyn PerftEngine,
    pub params: DiffParams,
}

impl<'a> EnginePair<'a> {
    pub fn new(
        candidate: &'a dyn PerftEngine,
        oracle: &'a dyn PerftEngine,
        params: DiffParams,
    ) -> Self {
        Self {
            candidate,
            oracle,
            params,
        }
    }

    /// Query both engines at `(fen, depth)`; the candidate's error wins if
    /// both fail.
    pub fn query(&self, fen: &str, depth: u32) -> Result<(MoveCounts, MoveCounts), DiffError> {
        debug!("comparing at depth {}: {}", depth, fen);
        let (candidate, oracle) = if self.params.parallel {
            thread::scope(|s| {
                let handle = s.spawn(|| self.candidate.query(fen, depth));
                let oracle = self.oracle.query(fen, depth);
                let candidate = handle.join().unwrap_or_else(|_| {
                    Err(EngineError::process(
                        self.candidate.name(),
                        "query thread panicked",
                    ))
                });
                (candidate, oracle)
            })
        } else {
            (
                self.candidate.query(fen, depth),
                self.oracle.query(fen, depth),
            )
        };

        let candidate =
            candidate.map_err(|e| DiffError::query(self.candidate.name(), fen, depth, e))?;
        let oracle = oracle.map_err(|e| DiffError::query(self.oracle.name(), fen, depth, e))?;
        Ok((candidate, oracle))
    }

    /// Sum-invariant violations of a pair of results, if checking is on.
    pub fn anomalies(
        &self,
        fen: &str,
        depth: u32,
        candidate: &MoveCounts,
        oracle: &MoveCounts,
    ) -> Vec<Anomaly> {
        if !self.params.check_sums {
            return Vec::new();
        }
        [(self.candidate.name(), candidate), (self.oracle.name(), oracle)]
            .into_iter()
            .filter(|(_, counts)| !counts.is_consistent())
            .map(|(engine, counts)| {
                let anomaly = Anomaly {
                    engine: engine.to_string(),
                    fen: fen.to_string(),
                    depth,
                    total: counts.total,
                    sum: counts.sum(),
                };
                warn!("{}", anomaly);
                anomaly
            })
            .collect()
    }
}
