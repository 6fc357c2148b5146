//! Entrypoint for the `poortego` console.
//!
//! The streams stay unlocked: background jobs log to stderr from their own
//! threads while the input loop runs.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    poortego_console::run(std::env::args_os(), &mut stdout, &mut stderr)
}
