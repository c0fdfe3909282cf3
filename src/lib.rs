pub mod board;
pub mod diff;
pub mod engine;
pub mod error;
pub mod perft;
pub mod uci;

pub use diff::{run, DiffParams, EnginePair, Report};
pub use error::{BoardError, DiffError, EngineError};
