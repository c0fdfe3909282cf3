//! Reference perft over shakmaty.
//!
//! Serves as the built-in oracle and, through [`Faults`], as a stand-in for a
//! buggy move generator when exercising the diff tool.

use shakmaty::{Chess, Position};

use crate::board::move_label;

/// Defects injected into the reference generator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Faults {
    /// Moves never generated, anywhere in the tree.
    pub skip_moves: Vec<String>,
    /// Added to the root total of a split perft only.
    pub total_offset: i64,
}

impl Faults {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn skip(mut self, label: &str) -> Self {
        self.skip_moves.push(label.to_string());
        self
    }

    pub fn total_offset(mut self, offset: i64) -> Self {
        self.total_offset = offset;
        self
    }

    /// `sum` shifted by the offset, saturating at both ends of `u64`.
    fn apply_offset(&self, sum: u64) -> u64 {
        sum.saturating_add_signed(self.total_offset)
    }

    fn skips(&self, label: &str) -> bool {
        self.skip_moves.iter().any(|s| s == label)
    }
}

fn generated_moves(pos: &Chess, faults: &Faults) -> Vec<(String, Chess)> {
    pos.legal_moves()
        .into_iter()
        .filter_map(|m| {
            let label = move_label(&m);
            if faults.skips(&label) {
                return None;
            }
            let mut child = pos.clone();
            child.play_unchecked(&m);
            Some((label, child))
        })
        .collect()
}

pub fn perft(pos: &Chess, depth: u32, faults: &Faults) -> u64 {
    if depth == 0 {
        return 1;
    }
    if depth == 1 && faults.skip_moves.is_empty() {
        return pos.legal_moves().len() as u64;
    }

    generated_moves(pos, faults)
        .iter()
        .map(|(_, child)| perft(child, depth - 1, faults))
        .sum()
}

/// Per-move breakdown at the root and the reported total.
///
/// The total includes `faults.total_offset`, so it may disagree with the sum
/// of the breakdown.
pub fn split_perft(pos: &Chess, depth: u32, faults: &Faults) -> (u64, Vec<(String, u64)>) {
    if depth == 0 {
        return (1, Vec::new());
    }

    let move_counts: Vec<(String, u64)> = generated_moves(pos, faults)
        .into_iter()
        .map(|(label, child)| {
            let nodes = perft(&child, depth - 1, faults);
            (label, nodes)
        })
        .collect();

    let sum: u64 = move_counts.iter().map(|(_, n)| n).sum();
    (faults.apply_offset(sum), move_counts)
}
