pub mod parser;

pub use parser::{parse_uci_command, perft_script, UciCommand};
