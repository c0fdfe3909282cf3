//! Tracked board for the divergence walk.
//!
//! Wraps a `shakmaty::Chess` position together with the stack of moves played
//! from the root. shakmaty positions have no undo, so the stack keeps the
//! prior positions and `pop` restores them.

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position};

use crate::error::BoardError;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN into a standard-chess position.
pub fn parse_fen(fen: &str) -> Result<Chess, BoardError> {
    let invalid = |reason: String| BoardError::InvalidFen {
        fen: fen.to_string(),
        reason,
    };
    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{}", e)))?;
    parsed
        .into_position::<Chess>(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{}", e)))
}

/// FEN of a position, en passant square only when a capture is legal.
pub fn position_fen(pos: &Chess) -> String {
    Fen::from_setup(pos.clone().into_setup(EnPassantMode::Legal)).to_string()
}

/// UCI label of a move in standard castling notation (e.g. "e1g1").
pub fn move_label(m: &Move) -> String {
    m.to_uci(CastlingMode::Standard).to_string()
}

/// Find the legal move matching a UCI label, if any.
pub fn find_legal_move(pos: &Chess, label: &str) -> Option<Move> {
    pos.legal_moves().into_iter().find(|m| move_label(m) == label)
}

#[derive(Debug, Clone)]
pub struct BoardAdapter {
    root_fen: String,
    current: Chess,
    /// (position before the move, label of the move)
    stack: Vec<(Chess, String)>,
}

impl BoardAdapter {
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let current = parse_fen(fen)?;
        Ok(Self {
            root_fen: position_fen(&current),
            current,
            stack: Vec::new(),
        })
    }

    /// Normalized FEN of the root position.
    pub fn root_fen(&self) -> &str {
        &self.root_fen
    }

    pub fn fen(&self) -> String {
        position_fen(&self.current)
    }

    pub fn position(&self) -> &Chess {
        &self.current
    }

    pub fn is_legal(&self, label: &str) -> bool {
        find_legal_move(&self.current, label).is_some()
    }

    /// Labels of the moves played from the root, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.stack.iter().map(|(_, label)| label.clone()).collect()
    }

    /// Number of moves on the history stack.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn push(&mut self, label: &str) -> Result<(), BoardError> {
        let m = find_legal_move(&self.current, label).ok_or_else(|| BoardError::IllegalMove {
            label: label.to_string(),
            fen: self.fen(),
        })?;
        let mut next = self.current.clone();
        next.play_unchecked(&m);
        let prev = std::mem::replace(&mut self.current, next);
        self.stack.push((prev, label.to_string()));
        Ok(())
    }

    /// Undo the last move, returning its label. `None` at the root.
    pub fn pop(&mut self) -> Option<String> {
        let (prev, label) = self.stack.pop()?;
        self.current = prev;
        Some(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_position_round_trips() {
        let board = BoardAdapter::from_fen(START_FEN).expect("valid FEN");
        assert_eq!(board.fen(), START_FEN);
        assert_eq!(board.root_fen(), START_FEN);
        assert_eq!(board.depth(), 0);
    }

    #[test]
    fn invalid_fen_is_rejected() {
        let err = BoardAdapter::from_fen("not a fen").unwrap_err();
        assert!(matches!(err, BoardError::InvalidFen { .. }));
    }

    #[test]
    fn push_and_pop_restore_position() {
        let mut board = BoardAdapter::from_fen(START_FEN).unwrap();
        board.push("e2e4").unwrap();
        board.push("e7e5").unwrap();
        assert_eq!(board.history(), vec!["e2e4", "e7e5"]);
        assert_eq!(
            board.fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
        );
        assert_eq!(board.pop().as_deref(), Some("e7e5"));
        assert_eq!(board.pop().as_deref(), Some("e2e4"));
        assert_eq!(board.pop(), None);
        assert_eq!(board.fen(), START_FEN);
    }

    #[test]
    fn illegal_moves_are_refused() {
        let mut board = BoardAdapter::from_fen(START_FEN).unwrap();
        assert!(!board.is_legal("a1a1"));
        assert!(!board.is_legal("e2e5"));
        assert!(!board.is_legal("garbage"));
        assert!(board.is_legal("g1f3"));
        assert!(board.push("e2e5").is_err());
        assert_eq!(board.depth(), 0);
    }

    #[test]
    fn castling_uses_standard_notation() {
        let mut board =
            BoardAdapter::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert!(board.is_legal("e1g1"));
        assert!(board.is_legal("e1c1"));
        board.push("e1g1").unwrap();
        assert_eq!(board.fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
    }
}
