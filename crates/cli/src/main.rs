//! mopstore CLI: a line-protocol target for correctness workloads.
//!
//! Modes:
//! - **Pipe mode** (default): `mopstore [pipe]` reads one JSON batch request
//!   per stdin line and writes one JSON response per stdout line
//! - **pragma**: `mopstore pragma [--json]` prints the properties report
//! - **list**: `mopstore list <table>` prints every committed row
//!
//! Logs go to stderr (filtered by `RUST_LOG`) so stdout stays machine-readable.

mod commands;
mod format;
mod pipe;

use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use mopstore_executor::{Database, Executor, TableKind};

use commands::{build_cli, DATA_DIR_ENV, DEFAULT_DATA_DIR};
use format::{format_properties, format_row};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();

    let executor = match open_executor(&matches) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("mopstore: {}", e);
            process::exit(1);
        }
    };

    let exit_code = match matches.subcommand() {
        Some(("pragma", sub)) => {
            println!("{}", format_properties(&executor.properties(), sub.get_flag("json")));
            0
        }
        Some(("list", sub)) => run_list(&executor, sub),
        _ => pipe::run_pipe(&executor),
    };

    // process::exit skips destructors
    if let Err(e) = executor.database().shutdown() {
        eprintln!("mopstore: shutdown failed: {}", e);
        process::exit(1);
    }
    process::exit(exit_code);
}

fn open_executor(matches: &clap::ArgMatches) -> Result<Executor, String> {
    let db = if matches.get_flag("memory") {
        Database::ephemeral()
    } else {
        let path = resolve_data_dir(
            matches.get_one::<String>("data-dir").map(String::as_str),
            std::env::var(DATA_DIR_ENV).ok(),
        );
        Database::open(&path)
            .map_err(|e| format!("failed to open {}: {}", path.display(), e))?
    };

    let executor = Executor::new(db);
    Ok(match matches.get_one::<u64>("busy-timeout") {
        Some(ms) => executor.with_busy_timeout(Duration::from_millis(*ms)),
        None => executor,
    })
}

/// `--data-dir`, then `$MOPSTORE_DATA_DIR`, then the default.
fn resolve_data_dir(flag: Option<&str>, env: Option<String>) -> PathBuf {
    match (flag, env) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(dir)) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}

fn run_list(executor: &Executor, sub: &clap::ArgMatches) -> i32 {
    let table = match sub.get_one::<String>("table").map(|t| TableKind::from_str(t)) {
        Some(Ok(table)) => table,
        Some(Err(e)) => {
            eprintln!("mopstore: {}", e);
            return 1;
        }
        None => {
            eprintln!("mopstore: missing table");
            return 1;
        }
    };

    match executor.list(table) {
        Ok(rows) => {
            for row in &rows {
                println!("{}", format_row(row));
            }
            0
        }
        Err(e) => {
            eprintln!("mopstore: {}", e);
            1
        }
    }
}
