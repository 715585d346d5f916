use std::io::{self, Write};
use std::process::ExitCode;

use gsnip_config::ConfigError;
use gsnipd::{LaunchError, run_daemon};

fn main() -> ExitCode {
    match run_daemon() {
        Ok(()) => ExitCode::SUCCESS,
        Err(LaunchError::Config {
            source: ConfigError::Cli(error),
        }) => report_usage(&error),
        Err(error) => {
            eprintln!("gsnipd: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Prints clap output (help and version included) and maps it to clap's
/// exit code, or to failure when it cannot be written.
fn report_usage(error: &clap::Error) -> ExitCode {
    let rendered = error.render().to_string();
    let written = if error.use_stderr() {
        io::stderr().lock().write_all(rendered.as_bytes())
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(rendered.as_bytes())
            .and_then(|()| stdout.flush())
    };
    if written.is_err() {
        return ExitCode::FAILURE;
    }
    u8::try_from(error.exit_code()).map_or(ExitCode::FAILURE, ExitCode::from)
}
