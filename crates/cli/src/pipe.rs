//! Pipe mode: one JSON request per input line, one JSON response per output line.
//!
//! Blank lines and lines starting with `#` are skipped. A line that is not
//! UTF-8 gets a `fail` response like any other malformed request. Each
//! response is flushed before the next request is read, so a driver can hold
//! the pipe open and interleave requests with responses.

use std::io::{self, BufRead, Write};

use mopstore_executor::{Error, Executor, Response};
use tracing::debug;

use crate::format::format_response;

/// Serve stdin/stdout until EOF. Returns the process exit code.
pub fn run_pipe(executor: &Executor) -> i32 {
    let stdin = io::stdin();
    let stdout = io::stdout();
    match serve(executor, stdin.lock(), stdout.lock()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("mopstore: pipe I/O error: {}", e);
            1
        }
    }
}

/// Serve requests from `input` until EOF, writing responses to `output`.
///
/// Returns 1 if any request was rejected as `fail`, 0 otherwise.
pub fn serve<R: BufRead, W: Write>(executor: &Executor, mut input: R, mut output: W) -> io::Result<i32> {
    let mut exit_code = 0;
    let mut served = 0u64;
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                executor.handle_line(trimmed)
            }
            Err(e) => Response::fail(Error::invalid_input(format!(
                "request line is not valid UTF-8: {}",
                e
            ))),
        };
        if matches!(response, Response::Fail { .. }) {
            exit_code = 1;
        }
        writeln!(output, "{}", format_response(&response))?;
        output.flush()?;
        served += 1;
    }

    debug!(target: "mopstore::executor", served, "Pipe closed");
    Ok(exit_code)
}
