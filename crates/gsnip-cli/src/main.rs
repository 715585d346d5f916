//! CLI entrypoint for the gsnip snippet client.
//!
//! The binary delegates to [`gsnip_cli::run`] with the process streams.

use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    gsnip_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}
