//! Time-bounded subprocess execution for engine queries.
//!
//! Output is read on background threads and funnelled through a channel so
//! that a hung engine can be detected with `recv_timeout` and killed.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Everything a finished engine process printed.
#[derive(Debug)]
pub struct Captured {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    /// stdout and stderr interleaved in arrival order
    pub transcript: Vec<String>,
    pub status: ExitStatus,
}

/// A single engine invocation.
pub struct Invocation<'a> {
    pub engine: &'a str,
    pub program: &'a Path,
    pub args: &'a [String],
    /// Written to the child's stdin, which is then closed.
    pub input: Option<&'a str>,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

fn spawn_reader<R: Read + Send + 'static>(source: R, stream: Stream, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(&['\n', '\r'][..]).to_string();
                    if tx.send((stream, line)).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("kill failed (process already gone?): {}", e);
    }
    let _ = child.wait();
}

impl Invocation<'_> {
    fn timed_out(&self, child: &mut Child) -> EngineError {
        kill(child);
        let limit = self.timeout.map(|t| t.as_secs_f64()).unwrap_or_default();
        EngineError::process(
            self.engine,
            format!("{} timed out after {:.1}s and was killed", self.program.display(), limit),
        )
    }

    /// Run the program to completion and capture its output.
    pub fn run(&self) -> Result<Captured, EngineError> {
        let started = Instant::now();
        let deadline = self.timeout.map(|t| started + t);

        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(if self.input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::process(
                    self.engine,
                    format!("failed to spawn {}: {}", self.program.display(), e),
                )
            })?;

        let (tx, rx) = mpsc::channel();
        match (child.stdout.take(), child.stderr.take()) {
            (Some(out), Some(err)) => {
                spawn_reader(out, Stream::Stdout, tx.clone());
                spawn_reader(err, Stream::Stderr, tx);
            }
            _ => {
                kill(&mut child);
                return Err(EngineError::process(self.engine, "failed to capture engine output"));
            }
        }

        // Written from a thread so that a child which never reads stdin
        // cannot block us before the deadline is checked.
        let writer = match (self.input, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => {
                let text = text.to_string();
                Some(thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut transcript = Vec::new();
        loop {
            let next = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.timed_out(&mut child));
                    }
                    rx.recv_timeout(deadline - now)
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match next {
                Ok((stream, line)) => {
                    match stream {
                        Stream::Stdout => stdout.push(line.clone()),
                        Stream::Stderr => stderr.push(line.clone()),
                    }
                    transcript.push(line);
                }
                Err(RecvTimeoutError::Timeout) => return Err(self.timed_out(&mut child)),
                // both pipes closed
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(self.timed_out(&mut child));
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    kill(&mut child);
                    return Err(EngineError::process(
                        self.engine,
                        format!("failed to wait for {}: {}", self.program.display(), e),
                    ));
                }
            }
        };

        if let Some(handle) = writer {
            match handle.join() {
                Ok(Err(e)) => warn!("{}: could not write engine input: {}", self.engine, e),
                Err(_) => warn!("{}: stdin writer thread panicked", self.engine),
                Ok(Ok(())) => {}
            }
        }

        debug!(
            "{}: {} exited with {} after {} ms ({} lines)",
            self.engine,
            self.program.display(),
            status,
            started.elapsed().as_millis(),
            transcript.len()
        );

        Ok(Captured {
            stdout,
            stderr,
            transcript,
            status,
        })
    }
}

/// Substitute `{fen}` and `{depth}` in an argument template.
pub fn expand_args(template: &[String], fen: &str, depth: u32) -> Vec<String> {
    let depth = depth.to_string();
    template
        .iter()
        .map(|arg| arg.replace("{fen}", fen).replace("{depth}", &depth))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_expanded() {
        let template: Vec<String> = ["--fen", "{fen}", "--depth={depth}"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let args = expand_args(&template, "8/8/8/8/8/8/8/K1k5 w - - 0 1", 4);
        assert_eq!(args, vec!["--fen", "8/8/8/8/8/8/8/K1k5 w - - 0 1", "--depth=4"]);
    }

    #[test]
    fn missing_program_is_a_process_failure() {
        let args: Vec<String> = Vec::new();
        let invocation = Invocation {
            engine: "candidate",
            program: Path::new("/nonexistent/perft-engine"),
            args: &args,
            input: None,
            timeout: Some(Duration::from_secs(1)),
        };
        let err = invocation.run().unwrap_err();
        assert!(matches!(err, EngineError::Process { .. }));
    }
}
