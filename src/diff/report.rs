//! End-to-end pass and its human-readable report.

use std::fmt;

use super::localize::Localization;
use super::scan::ScanOutcome;
use super::{Anomaly, Conclusion, DepthScanner, EnginePair, Localizer, QueryStats};
use crate::error::DiffError;

#[derive(Debug, Clone)]
pub enum Report {
    /// No divergence within the tested horizon.
    Agreed {
        fen: String,
        max_depth: u32,
        anomalies: Vec<Anomaly>,
        stats: QueryStats,
    },
    Diverged {
        fen: String,
        depth: u32,
        candidate_total: u64,
        oracle_total: u64,
        /// Anomalies seen during the depth scan
        anomalies: Vec<Anomaly>,
        localization: Localization,
        stats: QueryStats,
    },
}

impl Report {
    pub fn is_divergent(&self) -> bool {
        matches!(self, Report::Diverged { .. })
    }

    pub fn localization(&self) -> Option<&Localization> {
        match self {
            Report::Diverged { localization, .. } => Some(localization),
            Report::Agreed { .. } => None,
        }
    }
}

/// Scan `fen` and, on a divergence, localize it.
pub fn run(pair: &EnginePair<'_>, fen: &str) -> Result<Report, DiffError> {
    let scan = DepthScanner::new(pair).scan(fen)?;
    match scan.outcome {
        ScanOutcome::Agreed { max_depth } => Ok(Report::Agreed {
            fen: fen.to_string(),
            max_depth,
            anomalies: scan.anomalies,
            stats: scan.stats,
        }),
        ScanOutcome::Diverged {
            depth,
            candidate_total,
            oracle_total,
            board,
        } => {
            let localization = Localizer::new(pair).run(board, depth)?;
            let mut stats = scan.stats;
            stats.merge(&localization.stats);
            Ok(Report::Diverged {
                fen: fen.to_string(),
                depth,
                candidate_total,
                oracle_total,
                anomalies: scan.anomalies,
                localization,
                stats,
            })
        }
    }
}

fn write_moves(f: &mut fmt::Formatter<'_>, moves: &[String]) -> fmt::Result {
    if moves.is_empty() {
        writeln!(f, "Moves: (root)")
    } else {
        writeln!(f, "Moves: {}", moves.join(" "))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Agreed {
                fen,
                max_depth,
                anomalies,
                stats,
            } => {
                writeln!(f, "No divergence up to depth {} for {}", max_depth, fen)?;
                for anomaly in anomalies {
                    writeln!(f, "Warning: {}", anomaly)?;
                }
                write!(
                    f,
                    "{} engine queries in {} ms",
                    stats.total_queries(),
                    stats.elapsed.as_millis()
                )
            }
            Report::Diverged {
                fen,
                depth,
                candidate_total,
                oracle_total,
                anomalies,
                localization,
                stats,
            } => {
                writeln!(
                    f,
                    "Nodes at depth {} are different ({} vs {}) for {}",
                    depth, candidate_total, oracle_total, fen
                )?;
                writeln!(f)?;

                for step in &localization.trail {
                    writeln!(f, "Depth {}: {}", step.depth, step.mismatch)?;
                    writeln!(f, "Position: {}", step.fen)?;
                }
                if !localization.trail.is_empty() {
                    writeln!(f)?;
                }

                match &localization.conclusion {
                    Conclusion::Mismatch(finding) => {
                        writeln!(f, "Divergence: {}", finding.mismatch)?;
                        writeln!(f, "Position: {}", finding.fen)?;
                        writeln!(f, "Depth: {}", finding.depth)?;
                        write_moves(f, &finding.moves)?;
                    }
                    Conclusion::NoFurtherDivergence {
                        fen: at,
                        depth: at_depth,
                        moves,
                    } => match localization.trail.last() {
                        Some(step) => {
                            writeln!(
                                f,
                                "Divergence: {} (no child subtree at depth {} disagrees)",
                                step.mismatch, at_depth
                            )?;
                            writeln!(f, "Position: {}", at)?;
                            write_moves(f, moves)?;
                        }
                        None => {
                            writeln!(
                                f,
                                "Divergence confirmed in aggregate but unattributable: every move \
                                 agrees at depth {}, only the totals differ",
                                at_depth
                            )?;
                            writeln!(f, "Position: {}", at)?;
                        }
                    },
                }

                // the scan and the walk query the root at the same depth
                let mut printed: Vec<&Anomaly> = Vec::new();
                for anomaly in anomalies.iter().chain(&localization.anomalies) {
                    if !printed.contains(&anomaly) {
                        writeln!(f, "Warning: {}", anomaly)?;
                        printed.push(anomaly);
                    }
                }
                write!(
                    f,
                    "{} engine queries in {} ms",
                    stats.total_queries(),
                    stats.elapsed.as_millis()
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;
    use crate::diff::{DiffParams, Mismatch};
    use crate::engine::ReferenceEngine;
    use crate::perft::Faults;

    #[test]
    fn agreeing_engines_report_success() {
        let candidate = ReferenceEngine::new();
        let oracle = ReferenceEngine::new();
        let pair = EnginePair::new(&candidate, &oracle, DiffParams::new().max_depth(2));

        let report = run(&pair, START_FEN).unwrap();
        assert!(!report.is_divergent());
        assert!(report.to_string().starts_with("No divergence up to depth 2"));
    }

    #[test]
    fn divergence_report_names_the_move() {
        let candidate = ReferenceEngine::with_faults("candidate", Faults::none().skip("b8c6"));
        let oracle = ReferenceEngine::new();
        let pair = EnginePair::new(&candidate, &oracle, DiffParams::new().max_depth(3));

        let report = run(&pair, START_FEN).unwrap();
        let localization = report.localization().expect("divergent");
        match &localization.conclusion {
            Conclusion::Mismatch(finding) => {
                assert_eq!(finding.mismatch, Mismatch::MissingMove { label: "b8c6".into() })
            }
            other => panic!("unexpected conclusion {:?}", other),
        }
        let text = report.to_string();
        assert!(text.contains("Nodes at depth 2 are different (380 vs 400)"));
        assert!(text.contains("Divergence: move b8c6 is missing"));
    }

    #[test]
    fn unattributable_divergence_is_spelled_out() {
        let candidate = ReferenceEngine::with_faults("candidate", Faults::none().total_offset(2));
        let oracle = ReferenceEngine::new();
        let pair = EnginePair::new(&candidate, &oracle, DiffParams::new());

        let report = run(&pair, START_FEN).unwrap();
        assert!(report.is_divergent());
        let text = report.to_string();
        assert!(text.contains("unattributable"));
        assert!(text.contains("Warning: candidate reported total 22"));
    }
}
