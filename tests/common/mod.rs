//! Shared engines for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use perftdiff::engine::{MoveCounts, PerftEngine, ReferenceEngine};
use perftdiff::perft::Faults;
use perftdiff::EngineError;

/// Reference perft whose answers can be overridden per `(fen, depth)`, and
/// which records every query it receives.
pub struct ScriptedEngine {
    name: String,
    inner: ReferenceEngine,
    overrides: HashMap<(String, u32), Result<MoveCounts, String>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedEngine {
    pub fn new(name: &str) -> Self {
        Self::with_faults(name, Faults::none())
    }

    pub fn with_faults(name: &str, faults: Faults) -> Self {
        Self {
            name: name.to_string(),
            inner: ReferenceEngine::with_faults(name, faults),
            overrides: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `(fen, depth)` with `counts` instead of the real perft.
    pub fn answer(mut self, fen: &str, depth: u32, counts: MoveCounts) -> Self {
        self.overrides.insert((fen.to_string(), depth), Ok(counts));
        self
    }

    /// Fail `(fen, depth)` with a process failure.
    pub fn fail(mut self, fen: &str, depth: u32, reason: &str) -> Self {
        self.overrides
            .insert((fen.to_string(), depth), Err(reason.to_string()));
        self
    }

    /// The real answer, for building overrides.
    pub fn truth(&self, fen: &str, depth: u32) -> MoveCounts {
        ReferenceEngine::new().query(fen, depth).expect("reference perft")
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PerftEngine for ScriptedEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn query(&self, fen: &str, depth: u32) -> Result<MoveCounts, EngineError> {
        self.calls.lock().unwrap().push((fen.to_string(), depth));
        match self.overrides.get(&(fen.to_string(), depth)) {
            Some(Ok(counts)) => Ok(counts.clone()),
            Some(Err(reason)) => Err(EngineError::process(&self.name, reason.clone())),
            None => self.inner.query(fen, depth),
        }
    }
}

/// Copy of `counts` with `label` changed to `nodes` (appended if absent) and
/// the total adjusted to match.
pub fn with_move(counts: &MoveCounts, label: &str, nodes: u64) -> MoveCounts {
    let mut moves: Vec<(String, u64)> = counts.iter().map(|(m, n)| (m.to_string(), n)).collect();
    match moves.iter_mut().find(|(m, _)| m == label) {
        Some(entry) => entry.1 = nodes,
        None => moves.push((label.to_string(), nodes)),
    }
    let total = moves.iter().map(|(_, n)| n).sum();
    MoveCounts::from_moves(total, moves).expect("unique labels")
}
