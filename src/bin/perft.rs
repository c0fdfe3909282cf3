//! Reference split perft over shakmaty.
//!
//! Speaks both protocols perftdiff understands: the candidate grammar
//! (`--fen F --depth D`) and UCI `go perft` on stdin (`--uci`). Faults can be
//! injected to stand in for a buggy move generator.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{info, warn};
use shakmaty::Chess;

use perftdiff::board::{parse_fen, BoardAdapter, START_FEN};
use perftdiff::perft::{split_perft, Faults};
use perftdiff::uci::{parse_uci_command, UciCommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from(START_FEN))]
    fen: String,

    #[arg(short, long, default_value_t = 4)]
    depth: u32,

    /// Read UCI commands from stdin instead
    #[arg(long)]
    uci: bool,

    /// Never generate this move (repeatable)
    #[arg(long = "skip-move")]
    skip_moves: Vec<String>,

    /// Added to the reported root total
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    total_offset: i64,

    /// Sleep before answering
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,
}

fn print_split(out: &mut impl Write, pos: &Chess, depth: u32, faults: &Faults) -> io::Result<()> {
    let start = Instant::now();
    let (nodes, move_counts) = split_perft(pos, depth, faults);
    let duration = start.elapsed();

    for (mv, count) in &move_counts {
        writeln!(out, "{}: {}", mv, count)?;
    }
    writeln!(out)?;
    writeln!(out, "Nodes searched: {}", nodes)?;
    out.flush()?;

    info!(
        "perft({}) = {} nodes ({} ms, {:.2} Mnps)",
        depth,
        nodes,
        duration.as_millis(),
        nodes as f64 / (duration.as_micros().max(1) as f64)
    );
    Ok(())
}

fn uci_loop(faults: &Faults, delay: Duration) -> io::Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "perftdiff reference perft (shakmaty)")?;
    out.flush()?;

    // cleared by a rejected `position` so that `go perft` cannot answer for
    // a stale one
    let mut pos = Some(Chess::default());
    for line in stdin.lock().lines() {
        match parse_uci_command(&line?) {
            UciCommand::Uci => {
                writeln!(out, "id name perftdiff-perft")?;
                writeln!(out, "uciok")?;
            }
            UciCommand::IsReady => writeln!(out, "readyok")?,
            UciCommand::Position { fen, moves } => {
                pos = None;
                let fen = fen.unwrap_or_else(|| START_FEN.to_string());
                let mut board = match BoardAdapter::from_fen(&fen) {
                    Ok(board) => board,
                    Err(e) => {
                        writeln!(out, "info string {}", e)?;
                        continue;
                    }
                };
                if let Some(e) = moves.iter().find_map(|m| board.push(m).err()) {
                    writeln!(out, "info string {}", e)?;
                    continue;
                }
                pos = Some(board.position().clone());
            }
            UciCommand::GoPerft { depth } => match &pos {
                Some(pos) => {
                    thread::sleep(delay);
                    print_split(&mut out, pos, depth, faults)?;
                }
                None => writeln!(out, "info string no valid position, go perft ignored")?,
            },
            UciCommand::Quit => break,
            UciCommand::Unknown(cmd) if cmd.is_empty() => {}
            UciCommand::Unknown(cmd) => writeln!(out, "Unknown command: '{}'.", cmd)?,
        }
        out.flush()?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let faults = Faults {
        skip_moves: args.skip_moves,
        total_offset: args.total_offset,
    };
    let delay = Duration::from_millis(args.delay_ms);

    let result = if args.uci {
        uci_loop(&faults, delay)
    } else {
        match parse_fen(&args.fen) {
            Ok(pos) => {
                thread::sleep(delay);
                print_split(&mut io::stdout().lock(), &pos, args.depth, &faults)
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        // a closed pipe just means the reader went away
        if e.kind() != io::ErrorKind::BrokenPipe {
            warn!("perft: {}", e);
            std::process::exit(1);
        }
    }
}
