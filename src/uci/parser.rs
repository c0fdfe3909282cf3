//! UCI command subset spoken to perft oracles.
//!
//! Covers the script an oracle is fed (`position`, `go perft`, `quit`) in both
//! directions: rendering it for a subprocess and parsing it in the reference
//! engine binary.

use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    Position {
        /// `None` means `startpos`
        fen: Option<String>,
        moves: Vec<String>,
    },
    GoPerft {
        depth: u32,
    },
    Quit,
    Unknown(String),
}

/// Parse a UCI command from a string (simple tokenizer)
pub fn parse_uci_command(line: &str) -> UciCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return UciCommand::Unknown("".to_string());
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "quit" => UciCommand::Quit,
        "position" => {
            // position [fen <fenstring> | startpos ]  moves <move1> ...
            let mut fen: Option<String> = None;
            let mut i = 2usize;
            match parts.get(1) {
                Some(&"startpos") => {}
                Some(&"fen") => {
                    let mut fen_parts = Vec::new();
                    while i < parts.len() && parts[i] != "moves" {
                        fen_parts.push(parts[i]);
                        i += 1;
                    }
                    fen = Some(fen_parts.join(" "));
                }
                _ => return UciCommand::Unknown(trimmed.to_string()),
            }
            let moves = match parts[i.min(parts.len())..].split_first() {
                Some((&"moves", rest)) => rest.iter().map(|m| m.to_string()).collect(),
                _ => Vec::new(),
            };
            UciCommand::Position { fen, moves }
        }
        "go" => match (parts.get(1), parts.get(2).and_then(|d| d.parse::<u32>().ok())) {
            (Some(&"perft"), Some(depth)) => UciCommand::GoPerft { depth },
            _ => UciCommand::Unknown(trimmed.to_string()),
        },
        _ => UciCommand::Unknown(trimmed.to_string()),
    }
}

impl fmt::Display for UciCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciCommand::Uci => write!(f, "uci"),
            UciCommand::IsReady => write!(f, "isready"),
            UciCommand::Position { fen, moves } => {
                match fen {
                    Some(fen) => write!(f, "position fen {}", fen)?,
                    None => write!(f, "position startpos")?,
                }
                if !moves.is_empty() {
                    write!(f, " moves {}", moves.join(" "))?;
                }
                Ok(())
            }
            UciCommand::GoPerft { depth } => write!(f, "go perft {}", depth),
            UciCommand::Quit => write!(f, "quit"),
            UciCommand::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// The command script that makes an oracle print a split perft and exit.
pub fn perft_script(fen: &str, depth: u32) -> String {
    let commands = [
        UciCommand::Position {
            fen: Some(fen.to_string()),
            moves: Vec::new(),
        },
        UciCommand::GoPerft { depth },
        UciCommand::Quit,
    ];
    let mut script = String::new();
    for cmd in &commands {
        script.push_str(&cmd.to_string());
        script.push('\n');
    }
    script
}
