//! Console flags parsed by clap. Configuration flags are handled separately
//! by `ortho_config`; see [`crate::config`].

use clap::Parser;

/// Context-sensitive console for recording projects and entities.
#[derive(Parser, Debug)]
#[command(name = "poortego", version)]
pub(crate) struct Cli {
    /// Runs the line non-interactively; repeat to run several in order.
    #[arg(
        short = 'x',
        long = "execute",
        value_name = "LINE",
        allow_hyphen_values = true
    )]
    pub(crate) execute: Vec<String>,
    /// Suppresses the start-up banner in interactive mode.
    #[arg(long)]
    pub(crate) quiet: bool,
}
