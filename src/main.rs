//! perftdiff: compare a candidate perft against an oracle and localize the
//! first divergence.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use perftdiff::diff::params::{DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_SECS};
use perftdiff::engine::{CandidateEngine, OracleEngine, PerftEngine, ReferenceEngine};
use perftdiff::{run, DiffParams, EnginePair};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// FEN string of the position to test
    fen: String,

    /// Move generator under test
    #[arg(long, env = "PERFTDIFF_CANDIDATE")]
    candidate: PathBuf,

    /// Candidate argument template, {fen} and {depth} are substituted
    /// [default: --fen {fen} --depth {depth}]
    #[arg(long = "candidate-arg", allow_hyphen_values = true)]
    candidate_args: Vec<String>,

    /// UCI oracle supporting `go perft` (built-in shakmaty perft if omitted)
    #[arg(long, env = "PERFTDIFF_ORACLE")]
    oracle: Option<PathBuf>,

    /// Extra arguments for the oracle process
    #[arg(long = "oracle-arg", allow_hyphen_values = true)]
    oracle_args: Vec<String>,

    #[arg(short = 'd', long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: u32,

    /// Per-query time limit in seconds, 0 disables it
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Query candidate and oracle one after the other
    #[arg(long)]
    sequential: bool,

    /// Do not warn about totals that differ from the sum of their moves
    #[arg(long)]
    no_sum_check: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let params = DiffParams::new()
        .max_depth(args.max_depth)
        .timeout_secs(args.timeout_secs)
        .parallel(!args.sequential)
        .check_sums(!args.no_sum_check);

    let mut candidate = CandidateEngine::new(args.candidate).timeout(params.timeout);
    if !args.candidate_args.is_empty() {
        candidate = candidate.args(args.candidate_args);
    }

    let oracle: Box<dyn PerftEngine> = match args.oracle {
        Some(path) => Box::new(
            OracleEngine::new(path)
                .args(args.oracle_args)
                .timeout(params.timeout),
        ),
        None => Box::new(ReferenceEngine::new()),
    };

    let pair = EnginePair::new(&candidate, oracle.as_ref(), params);
    match run(&pair, &args.fen) {
        Ok(report) => {
            println!("{}", report);
            if report.is_divergent() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("perftdiff: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::from(2)
        }
    }
}
