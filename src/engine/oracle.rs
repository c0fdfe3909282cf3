//! The trusted oracle, driven over UCI (`go perft`).
//!
//! The transcript is classified line by line instead of by position:
//! `<move>: <count>` lines are moves, a `Nodes searched` line carries the
//! total and everything else (banners, `info string`s, blank lines) is skipped.
//! Stockfish output looks like
//!
//! ```text
//! Stockfish 16 by the Stockfish developers (see AUTHORS file)
//! a2a3: 380
//! ...
//! h2h4: 421
//!
//! Nodes searched: 8902
//! ```

use std::path::PathBuf;
use std::time::Duration;

use log::debug;

use super::process::Invocation;
use super::{parse_move_line, MoveCounts, PerftEngine};
use crate::error::EngineError;
use crate::uci::perft_script;

const TOTAL_KEYWORD: &str = "Nodes searched";

#[derive(Debug, Clone)]
pub struct OracleEngine {
    program: PathBuf,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl OracleEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
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

impl PerftEngine for OracleEngine {
    fn name(&self) -> &str {
        "oracle"
    }

    fn query(&self, fen: &str, depth: u32) -> Result<MoveCounts, EngineError> {
        debug_assert!(depth >= 1, "depth 0 is never queried");
        let script = perft_script(fen, depth);
        debug!("oracle: {} <<< {:?}", self.program.display(), script);

        let captured = Invocation {
            engine: self.name(),
            program: &self.program,
            args: &self.args,
            input: Some(&script),
            timeout: self.timeout,
        }
        .run()?;

        if captured.transcript.is_empty() {
            return Err(EngineError::process(
                self.name(),
                format!(
                    "{} produced no output (exit {})",
                    self.program.display(),
                    captured.status
                ),
            ));
        }
        parse_transcript(self.name(), &captured.transcript)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Move(&'a str, u64),
    Total(Option<u64>),
    Other,
}

/// UCI move shape: `[a-h][1-8][a-h][1-8][nbrq]?`.
fn is_move_label(label: &str) -> bool {
    let b = label.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && matches!(b[4], b'n' | b'b' | b'r' | b'q'),
        _ => false,
    }
}

fn classify(line: &str) -> Line<'_> {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix(TOTAL_KEYWORD) {
        let total = rest
            .split_whitespace()
            .last()
            .and_then(|t| t.parse::<u64>().ok());
        return Line::Total(total);
    }
    match parse_move_line(line) {
        Some((label, Ok(nodes))) if is_move_label(label) => Line::Move(label, nodes),
        _ => Line::Other,
    }
}

/// Parse a `go perft` transcript into move counts.
pub fn parse_transcript(engine: &str, lines: &[String]) -> Result<MoveCounts, EngineError> {
    let mut moves = Vec::new();
    let mut total = None;

    for (i, line) in lines.iter().enumerate() {
        let line_no = i + 1;
        match classify(line) {
            Line::Move(label, nodes) => moves.push((line_no, label, nodes)),
            Line::Total(Some(t)) => total = Some(t),
            Line::Total(None) => {
                return Err(EngineError::parse(
                    engine,
                    line_no,
                    format!("unreadable total in '{}'", line.trim()),
                ))
            }
            Line::Other => {}
        }
    }

    let total = total.ok_or_else(|| {
        EngineError::parse(engine, lines.len(), format!("no '{}' line", TOTAL_KEYWORD))
    })?;

    let mut counts = MoveCounts::new(total);
    for (line_no, label, nodes) in moves {
        counts
            .insert(label.to_string(), nodes)
            .map_err(|reason| EngineError::parse(engine, line_no, reason))?;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    const STOCKFISH: &str = "Stockfish 16 by the Stockfish developers (see AUTHORS file)
info string NNUE evaluation using nn-5af11540bbfe.nnue enabled
a2a3: 1
b2b3: 1
e1g1: 1
a7a8q: 1

Nodes searched: 4
";

    #[test]
    fn parses_stockfish_transcript() {
        let counts = parse_transcript("oracle", &lines(STOCKFISH)).unwrap();
        assert_eq!(counts.total, 4);
        let labels: Vec<&str> = counts.iter().map(|(m, _)| m).collect();
        assert_eq!(labels, vec!["a2a3", "b2b3", "e1g1", "a7a8q"]);
    }

    #[test]
    fn banner_changes_do_not_matter() {
        let text = "Some Engine 2.0\nby someone\nextra: banner line\ne2e4: 3\nNodes searched: 3\n\n";
        let counts = parse_transcript("oracle", &lines(text)).unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn option_lines_are_not_moves() {
        let text = "Threads: 1\nHash: 16\ne2e4: 1\n\nNodes searched: 1";
        let counts = parse_transcript("oracle", &lines(text)).unwrap();
        let labels: Vec<&str> = counts.iter().map(|(m, _)| m).collect();
        assert_eq!(labels, vec!["e2e4"]);
    }

    #[test]
    fn missing_total_is_a_parse_failure() {
        let err = parse_transcript("oracle", &lines("e2e4: 3\n")).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn duplicates_and_bad_totals_fail() {
        assert!(parse_transcript("oracle", &lines("e2e4: 1\ne2e4: 1\nNodes searched: 2")).is_err());
        assert!(parse_transcript("oracle", &lines("Nodes searched: many")).is_err());
    }

    #[test]
    fn line_classes() {
        assert_eq!(classify("e2e4: 20"), Line::Move("e2e4", 20));
        assert_eq!(classify("e2e4: soon"), Line::Other);
        assert_eq!(classify("Nodes searched: 20"), Line::Total(Some(20)));
        assert_eq!(classify("info string hello: world"), Line::Other);
        assert_eq!(classify("a7a8q: 3"), Line::Move("a7a8q", 3));
        assert_eq!(classify("a7a8k: 3"), Line::Other);
        assert_eq!(classify("i2i4: 3"), Line::Other);
        assert_eq!(classify(""), Line::Other);
    }
}
