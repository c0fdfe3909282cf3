//! Engines answering split-perft queries.
//!
//! Every engine turns `(fen, depth)` into a [`MoveCounts`]. The subprocess
//! engines differ only in how they are invoked and in their output grammar.

pub mod candidate;
pub mod oracle;
pub mod process;
pub mod reference;

use crate::error::EngineError;

pub use self::candidate::CandidateEngine;
pub use self::oracle::OracleEngine;
pub use self::reference::ReferenceEngine;

/// Total node count and per-move breakdown of one perft query.
///
/// Moves keep the order the engine printed them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveCounts {
    pub total: u64,
    moves: Vec<(String, u64)>,
}

impl MoveCounts {
    pub fn new(total: u64) -> Self {
        Self {
            total,
            moves: Vec::new(),
        }
    }

    /// Build from a breakdown, rejecting duplicate labels.
    pub fn from_moves(total: u64, moves: Vec<(String, u64)>) -> Result<Self, String> {
        let mut counts = Self::new(total);
        for (label, nodes) in moves {
            counts.insert(label, nodes)?;
        }
        Ok(counts)
    }

    /// Append a move; errors if the label is already present.
    pub fn insert(&mut self, label: String, nodes: u64) -> Result<(), String> {
        if self.contains(&label) {
            return Err(format!("duplicate move label {}", label));
        }
        self.moves.push((label, nodes));
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.moves
            .iter()
            .find(|(m, _)| m == label)
            .map(|&(_, nodes)| nodes)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.moves.iter().map(|(m, n)| (m.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Sum of the breakdown, widened so that garbage counts cannot overflow.
    pub fn sum(&self) -> u128 {
        self.moves.iter().map(|&(_, n)| u128::from(n)).sum()
    }

    /// Whether the total equals the sum of the breakdown.
    pub fn is_consistent(&self) -> bool {
        u128::from(self.total) == self.sum()
    }
}

/// Anything that answers a split-perft query.
pub trait PerftEngine: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &str;

    /// Split perft of `fen` at `depth` (>= 1).
    fn query(&self, fen: &str, depth: u32) -> Result<MoveCounts, EngineError>;
}

/// Parse `<label>: <count>`, splitting at the first `": "`.
pub(crate) fn parse_move_line(line: &str) -> Option<(&str, Result<u64, String>)> {
    let (label, count) = line.trim().split_once(": ")?;
    let label = label.trim();
    let count = count.trim();
    let parsed = count
        .parse::<u64>()
        .map_err(|_| format!("count '{}' for move {} is not a non-negative integer", count, label));
    Some((label, parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_labels_are_rejected() {
        let err = MoveCounts::from_moves(2, vec![("e2e4".into(), 1), ("e2e4".into(), 1)]);
        assert!(err.is_err());
    }

    #[test]
    fn lookups_and_order() {
        let counts =
            MoveCounts::from_moves(5, vec![("g1f3".into(), 3), ("a2a3".into(), 2)]).unwrap();
        assert_eq!(counts.get("a2a3"), Some(2));
        assert_eq!(counts.get("e2e4"), None);
        let labels: Vec<&str> = counts.iter().map(|(m, _)| m).collect();
        assert_eq!(labels, vec!["g1f3", "a2a3"]);
        assert!(counts.is_consistent());
    }

    #[test]
    fn inconsistent_total_is_detected() {
        let counts = MoveCounts::from_moves(6, vec![("g1f3".into(), 3), ("a2a3".into(), 2)]).unwrap();
        assert_eq!(counts.sum(), 5);
        assert!(!counts.is_consistent());
    }

    #[test]
    fn huge_counts_do_not_overflow_the_sum() {
        let counts =
            MoveCounts::from_moves(7, vec![("e2e4".into(), u64::MAX), ("g1f3".into(), 5)]).unwrap();
        assert_eq!(counts.sum(), u128::from(u64::MAX) + 5);
        assert!(!counts.is_consistent());
    }

    #[test]
    fn move_line_parsing() {
        assert_eq!(parse_move_line("e2e4: 20"), Some(("e2e4", Ok(20))));
        assert_eq!(parse_move_line("  a7a8q: 0 "), Some(("a7a8q", Ok(0))));
        assert!(matches!(parse_move_line("e2e4: x"), Some(("e2e4", Err(_)))));
        assert_eq!(parse_move_line("no separator"), None);
    }
}
