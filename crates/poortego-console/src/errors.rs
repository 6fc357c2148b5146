//! Errors that end the console process.

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::bootstrap::BootstrapError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    #[error("line editor failed: {0}")]
    Editor(#[from] ReadlineError),
}
