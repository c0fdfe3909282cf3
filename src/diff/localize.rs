//! Divergence localization.
//!
//! Starting from a position where candidate and oracle totals differ, compare
//! the per-move breakdowns and descend into the first move whose subtree
//! counts disagree. Only one branch is followed per level, so the number of
//! engine queries grows with the depth of the counterexample, not with the
//! branching factor.

use std::ops::{Deref, DerefMut};

use log::{debug, info};

use super::{Anomaly, Conclusion, EnginePair, Finding, Mismatch, QueryStats};
use crate::board::BoardAdapter;
use crate::error::{BoardError, DiffError};

/// Mutable state of one localization walk.
#[derive(Debug)]
pub struct SearchContext {
    pub board: BoardAdapter,
    /// Count mismatches on the path from the root to the current node
    pub trail: Vec<Finding>,
    pub anomalies: Vec<Anomaly>,
    pub stats: QueryStats,
}

impl SearchContext {
    pub fn new(board: BoardAdapter) -> Self {
        Self {
            board,
            trail: Vec::new(),
            anomalies: Vec::new(),
            stats: QueryStats::new(),
        }
    }

    /// Play `label` until the returned guard is dropped.
    pub fn enter(&mut self, label: &str) -> Result<ScopedMove<'_>, BoardError> {
        self.board.push(label)?;
        Ok(ScopedMove { ctx: self })
    }

    fn finding(&self, depth: u32, mismatch: Mismatch) -> Finding {
        Finding {
            fen: self.board.fen(),
            depth,
            moves: self.board.history(),
            mismatch,
        }
    }

    fn no_further_divergence(&self, depth: u32) -> Conclusion {
        Conclusion::NoFurtherDivergence {
            fen: self.board.fen(),
            depth,
            moves: self.board.history(),
        }
    }
}

/// A move held on the walk's board; popped on drop, whichever way the
/// holder exits.
pub struct ScopedMove<'a> {
    ctx: &'a mut SearchContext,
}

impl Deref for ScopedMove<'_> {
    type Target = SearchContext;

    fn deref(&self) -> &SearchContext {
        self.ctx
    }
}

impl DerefMut for ScopedMove<'_> {
    fn deref_mut(&mut self) -> &mut SearchContext {
        self.ctx
    }
}

impl Drop for ScopedMove<'_> {
    fn drop(&mut self) {
        self.ctx.board.pop();
    }
}

/// Result of a complete localization walk.
#[derive(Debug, Clone)]
pub struct Localization {
    pub root_fen: String,
    /// Depth the walk started at
    pub depth: u32,
    pub trail: Vec<Finding>,
    pub conclusion: Conclusion,
    pub anomalies: Vec<Anomaly>,
    pub stats: QueryStats,
}

impl Localization {
    /// Whether the walk ended without attributing the difference to a move.
    pub fn is_unattributed(&self) -> bool {
        matches!(self.conclusion, Conclusion::NoFurtherDivergence { .. })
    }
}

pub struct Localizer<'p, 'e> {
    pair: &'p EnginePair<'e>,
}

impl<'p, 'e> Localizer<'p, 'e> {
    pub fn new(pair: &'p EnginePair<'e>) -> Self {
        Self { pair }
    }

    /// Localize a divergence known to exist at `depth` in the board's current
    /// position. The board is owned by the walk until it returns.
    pub fn run(&self, board: BoardAdapter, depth: u32) -> Result<Localization, DiffError> {
        let root_fen = board.fen();
        let mut ctx = SearchContext::new(board);
        ctx.stats.start_timing();

        let conclusion = self.localize(&mut ctx, depth)?;
        ctx.stats.update_timing();

        Ok(Localization {
            root_fen,
            depth,
            trail: ctx.trail,
            conclusion,
            anomalies: ctx.anomalies,
            stats: ctx.stats,
        })
    }

    /// One level of the walk at the board's current position.
    ///
    /// On return, by any path, the board is back at the position it had on
    /// entry.
    pub fn localize(&self, ctx: &mut SearchContext, depth: u32) -> Result<Conclusion, DiffError> {
        info!("comparing nodes at depth {}", depth);
        if depth == 0 {
            info!("reached depth 0");
            return Ok(ctx.no_further_divergence(depth));
        }

        let fen = ctx.board.fen();
        let (candidate, oracle) = self.pair.query(&fen, depth)?;
        ctx.stats.inc_level();
        let anomalies = self.pair.anomalies(&fen, depth, &candidate, &oracle);
        ctx.anomalies.extend(anomalies);

        // a move the candidate cannot generate outranks everything else
        if let Some((label, _)) = oracle.iter().find(|(label, _)| !candidate.contains(label)) {
            let finding = ctx.finding(
                depth,
                Mismatch::MissingMove {
                    label: label.to_string(),
                },
            );
            info!("{} in {}", finding.mismatch, finding.fen);
            return Ok(Conclusion::Mismatch(finding));
        }

        for (label, child_nodes) in candidate.iter() {
            if !ctx.board.is_legal(label) {
                let finding = ctx.finding(
                    depth,
                    Mismatch::IllegalMoveReported {
                        label: label.to_string(),
                    },
                );
                info!("{} in {}", finding.mismatch, finding.fen);
                return Ok(Conclusion::Mismatch(finding));
            }

            let mut child = ctx.enter(label)?;

            let Some(oracle_nodes) = oracle.get(label) else {
                let finding = child.finding(
                    depth,
                    Mismatch::ExtraMove {
                        label: label.to_string(),
                    },
                );
                info!("{}, position: {}", finding.mismatch, finding.fen);
                return Ok(Conclusion::Mismatch(finding));
            };

            if child_nodes != oracle_nodes {
                let finding = child.finding(
                    depth,
                    Mismatch::CountMismatch {
                        label: label.to_string(),
                        candidate: child_nodes,
                        oracle: oracle_nodes,
                    },
                );
                info!("{}, position: {}", finding.mismatch, finding.fen);
                child.trail.push(finding);
                return self.localize(&mut child, depth - 1);
            }

            debug!("{}: {} nodes on both sides", label, child_nodes);
        }

        info!(
            "no child subtree explains the difference at depth {} ({} vs {})",
            depth, candidate.total, oracle.total
        );
        Ok(ctx.no_further_divergence(depth))
    }
}
