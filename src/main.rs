//! quarterclose CLI entry point
//!
//! Parses arguments, dispatches, prints errors to stderr, and exits
//! non-zero on failure. All logic lives in the CLI module.

use quarterclose::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
