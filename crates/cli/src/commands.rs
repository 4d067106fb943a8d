//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "MOPSTORE_DATA_DIR";

/// Data directory used when neither the flag nor the variable is set
pub const DEFAULT_DATA_DIR: &str = "./mopstore-data";

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("mopstore")
        .about("Micro-operation transaction store target for correctness testing")
        .subcommand_required(false)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("Data directory (default: $MOPSTORE_DATA_DIR or ./mopstore-data)")
                .global(true),
        )
        .arg(
            Arg::new("memory")
                .long("memory")
                .help("Ephemeral in-memory store, no disk")
                .action(ArgAction::SetTrue)
                .conflicts_with("data-dir")
                .global(true),
        )
        .arg(
            Arg::new("busy-timeout")
                .long("busy-timeout")
                .help("Writer-lock wait in milliseconds (overrides mopstore.toml)")
                .value_parser(clap::value_parser!(u64))
                .global(true),
        )
        .subcommand(build_pipe())
        .subcommand(build_pragma())
        .subcommand(build_list())
}

fn build_pipe() -> Command {
    Command::new("pipe")
        .about("Read one JSON batch request per stdin line, write one response line each (default)")
}

fn build_pragma() -> Command {
    Command::new("pragma")
        .about("Print store properties")
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output")
                .action(ArgAction::SetTrue),
        )
}

fn build_list() -> Command {
    Command::new("list")
        .about("Print every row of a table, one JSON object per line")
        .arg(
            Arg::new("table")
                .required(true)
                .value_parser(["lww", "append", "set"]),
        )
}
