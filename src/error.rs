//! Error types for perftdiff
//!
//! Engine failures and board failures are unrecoverable for the current
//! localization pass; mismatches are not errors and live in [`crate::diff`].

use thiserror::Error;

/// Failure of a single engine query.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine process could not be run or produced no usable output.
    #[error("{engine}: process failure: {reason}")]
    Process { engine: String, reason: String },

    /// The engine output did not match the expected grammar.
    #[error("{engine}: parse failure at line {line}: {reason}")]
    Parse {
        engine: String,
        line: usize,
        reason: String,
    },
}

impl EngineError {
    pub fn process(engine: &str, reason: impl Into<String>) -> Self {
        EngineError::Process {
            engine: engine.to_string(),
            reason: reason.into(),
        }
    }

    pub fn parse(engine: &str, line: usize, reason: impl Into<String>) -> Self {
        EngineError::Parse {
            engine: engine.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("illegal move {label} in position {fen}")]
    IllegalMove { label: String, fen: String },
}

/// Top-level error of a scan or localization pass.
#[derive(Debug, Error)]
pub enum DiffError {
    /// Query failure with enough context to reproduce it by hand.
    #[error("{engine} query failed at depth {depth} for position '{fen}'")]
    Query {
        engine: String,
        fen: String,
        depth: u32,
        #[source]
        source: EngineError,
    },

    #[error(transparent)]
    Board(#[from] BoardError),
}

impl DiffError {
    pub fn query(engine: &str, fen: &str, depth: u32, source: EngineError) -> Self {
        DiffError::Query {
            engine: engine.to_string(),
            fen: fen.to_string(),
            depth,
            source,
        }
    }
}
