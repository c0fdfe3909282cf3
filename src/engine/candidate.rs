//! The move generator under test, run as a split-perft subprocess.
//!
//! Expected stdout: one `<move>: <count>` line per root move followed by a
//! final line whose last `": "`-separated field is the total, e.g.
//!
//! ```text
//! a2a3: 380
//! b2b3: 420
//! ...
//! Nodes searched: 8902
//! ```

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use super::process::{expand_args, Invocation};
use super::{parse_move_line, MoveCounts, PerftEngine};
use crate::error::EngineError;

pub const DEFAULT_ARGS: [&str; 4] = ["--fen", "{fen}", "--depth", "{depth}"];

#[derive(Debug, Clone)]
pub struct CandidateEngine {
    program: PathBuf,
    /// Argument template, `{fen}` and `{depth}` are substituted per query.
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CandidateEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: DEFAULT_ARGS.iter().map(|s| s.to_string()).collect(),
            timeout: None,
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl PerftEngine for CandidateEngine {
    fn name(&self) -> &str {
        "candidate"
    }

    fn query(&self, fen: &str, depth: u32) -> Result<MoveCounts, EngineError> {
        debug_assert!(depth >= 1, "depth 0 is never queried");
        let args = expand_args(&self.args, fen, depth);
        debug!("candidate: {} {:?}", self.program.display(), args);

        let captured = Invocation {
            engine: self.name(),
            program: &self.program,
            args: &args,
            input: None,
            timeout: self.timeout,
        }
        .run()?;

        match parse_split_output(self.name(), &captured.stdout) {
            Ok(counts) => Ok(counts),
            // a crash usually explains the garbage better than the grammar does
            Err(_) if !captured.status.success() => Err(EngineError::process(
                self.name(),
                format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    captured.status,
                    captured.stderr.last().map(String::as_str).unwrap_or("no stderr")
                ),
            )),
            Err(e) => Err(e),
        }
    }
}

/// Parse split-perft output: move lines, then a total line. Blank lines are
/// ignored.
pub fn parse_split_output(engine: &str, lines: &[String]) -> Result<MoveCounts, EngineError> {
    let numbered: Vec<(usize, &str)> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let Some((&(total_line_no, total_line), move_lines)) = numbered.split_last() else {
        return Err(EngineError::parse(engine, 0, "no output"));
    };

    let total = total_line
        .rsplit_once(": ")
        .and_then(|(_, t)| t.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            EngineError::parse(
                engine,
                total_line_no,
                format!("expected '<...>: <total>', got '{}'", total_line),
            )
        })?;

    let mut counts = MoveCounts::new(total);
    for &(line_no, line) in move_lines {
        let (label, nodes) = parse_move_line(line).ok_or_else(|| {
            EngineError::parse(
                engine,
                line_no,
                format!("expected '<move>: <count>', got '{}'", line),
            )
        })?;
        let nodes = nodes.map_err(|reason| EngineError::parse(engine, line_no, reason))?;
        counts
            .insert(label.to_string(), nodes)
            .map_err(|reason| EngineError::parse(engine, line_no, reason))?;
    }
    Ok(counts)
}
