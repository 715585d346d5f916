//! Command-line client runtime for gsnip.
//!
//! The runtime parses arguments, builds one [`Request`], exchanges it with the
//! daemon over the configured socket, and renders the [`Reply`]. IO streams
//! are injected so tests can drive the whole flow in memory.

use std::ffi::OsString;
use std::fs;
use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use gsnip_config::Config;
use gsnip_protocol::{Reply, Request};

mod cli;
mod errors;
mod transport;


use cli::{Cli, CliCommand};
use errors::AppError;

/// Runs the client and returns the process exit code.
///
/// Successful reply bodies go to `stdout`. Daemon failures and local errors
/// are reported on `stderr` with a failing exit code.
pub fn run<I, T, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    R: Read,
    W: Write,
    E: Write,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };
    match execute(cli, stdin, stdout) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(stderr, "gsnip: {error}");
            if error.is_daemon_not_running() {
                let _ = writeln!(stderr, "gsnip: is gsnipd running?");
            }
            ExitCode::FAILURE
        }
    }
}

fn execute<R: Read, W: Write>(
    cli: Cli,
    stdin: &mut R,
    stdout: &mut W,
) -> Result<ExitCode, AppError> {
    let config = Config::from(cli.config);
    let request = build_request(&cli.command, stdin)?;
    let raw = transport::exchange(config.daemon_socket(), &request.encode())?;
    let reply = Reply::decode(&raw);
    if !reply.is_success() {
        return Err(AppError::DaemonFailure {
            command: cli.command.label(),
        });
    }
    write_body(stdout, reply.body()).map_err(AppError::WriteOutput)?;
    Ok(ExitCode::SUCCESS)
}

fn build_request<R: Read>(command: &CliCommand, stdin: &mut R) -> Result<Request, AppError> {
    let body = match command {
        CliCommand::Find { name } | CliCommand::Delete { name } => name.clone(),
        CliCommand::Insert { file } => {
            let text = match file {
                Some(path) => fs::read_to_string(path).map_err(|source| {
                    AppError::ReadInputFile {
                        path: path.clone(),
                        source,
                    }
                })?,
                None => {
                    let mut text = String::new();
                    stdin
                        .read_to_string(&mut text)
                        .map_err(AppError::ReadStdin)?;
                    text
                }
            };
            if text.trim().is_empty() {
                return Err(AppError::EmptyInsert);
            }
            text
        }
        CliCommand::List | CliCommand::Reload => String::new(),
    };
    Ok(Request::new(command.operation(), body))
}

/// Writes a reply body, terminating it with a newline when it lacks one.
fn write_body<W: Write>(stdout: &mut W, body: &[u8]) -> std::io::Result<()> {
    if body.is_empty() {
        return Ok(());
    }
    stdout.write_all(body)?;
    if !body.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()
}

fn report_usage<W: Write, E: Write>(error: &clap::Error, stdout: &mut W, stderr: &mut E) -> ExitCode {
    let rendered = error.render().to_string();
    let written = if error.use_stderr() {
        stderr.write_all(rendered.as_bytes())
    } else {
        stdout.write_all(rendered.as_bytes())
    };
    if written.is_err() {
        return ExitCode::FAILURE;
    }
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}
