//! Context-sensitive command console for recording projects and entities.
//!
//! The console keeps a stack of contexts. The root `Core` context is always
//! present; creating a project, targeting an entity or selecting a command
//! module pushes a deeper context whose commands shadow those beneath it.
//! Every line typed by the operator is routed to the topmost context that
//! knows the command, and the prompt always reflects the context on top.
//!
//! The binary entrypoint delegates to [`run`], which splits configuration
//! flags from console flags, bootstraps telemetry and the record store, and
//! then either executes `--execute` lines or starts the interactive editor.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

pub mod args;
mod bootstrap;
mod cli;
mod config;
pub mod dispatch;
mod driver;
mod errors;
mod health;
pub mod interface;
pub mod jobs;
pub mod modules;
mod output;
pub mod prompt;
mod repl;
pub mod store;
pub mod table;
mod telemetry;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Console, OrthoConfigLoader, StaticConfigLoader, bootstrap_with,
};
pub use driver::{Driver, Settings};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use output::Output;
pub use telemetry::{TelemetryError, TelemetryHandle};

use cli::Cli;
use config::split_config_arguments;
use errors::AppError;

/// Runs the console using the provided arguments and output streams.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader, &StructuredHealthReporter)
}

/// Runs the console with substituted configuration and health collaborators.
#[must_use]
pub fn run_with_loader<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(&split.cli_arguments) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => {
            let _ = write!(stderr, "{}", AppError::CliUsage(error));
            return ExitCode::FAILURE;
        }
    };

    let console = match bootstrap_with(loader, &split.config_arguments, reporter) {
        Ok(console) => console,
        Err(error) => {
            let _ = writeln!(stderr, "{}", AppError::from(error));
            return ExitCode::FAILURE;
        }
    };
    let (config, driver, degraded) = console.into_parts();
    if let Some(error) = degraded {
        let mut output = Output::new(&mut *stdout);
        output.error(format!(
            "Persistence unavailable ({error}); records are kept in memory for this session"
        ));
        output.flush();
    }

    let result = if cli.execute.is_empty() {
        repl::run_interactive(
            driver,
            config.history_path().map(|path| path.as_path()),
            cli.quiet,
            stdout,
        )
    } else {
        repl::run_batch(driver, &cli.execute, stdout);
        Ok(())
    };
    reporter.console_stopped();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
