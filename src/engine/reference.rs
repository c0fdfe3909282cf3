//! In-process shakmaty perft, the default oracle.

use super::{MoveCounts, PerftEngine};
use crate::board::parse_fen;
use crate::error::EngineError;
use crate::perft::{split_perft, Faults};

#[derive(Debug, Clone)]
pub struct ReferenceEngine {
    name: String,
    faults: Faults,
}

impl ReferenceEngine {
    pub fn new() -> Self {
        Self {
            name: "reference".to_string(),
            faults: Faults::none(),
        }
    }

    /// A reference engine with injected defects, standing in for a buggy
    /// generator.
    pub fn with_faults(name: &str, faults: Faults) -> Self {
        Self {
            name: name.to_string(),
            faults,
        }
    }
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PerftEngine for ReferenceEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, fen: &str, depth: u32) -> Result<MoveCounts, EngineError> {
        debug_assert!(depth >= 1, "depth 0 is never queried");
        let pos = parse_fen(fen).map_err(|e| EngineError::process(&self.name, e.to_string()))?;
        let (total, moves) = split_perft(&pos, depth, &self.faults);
        MoveCounts::from_moves(total, moves).map_err(|reason| EngineError::parse(&self.name, 0, reason))
    }
}
