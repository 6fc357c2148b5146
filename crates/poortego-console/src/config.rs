//! Separation of configuration flags from console flags.
//!
//! Configuration flags go to `ortho_config`; everything else goes to clap.
//! Flags may appear in any order, so both sides are filtered out of the
//! whole argument list.

use std::ffi::{OsStr, OsString};

/// Flags recognised by the configuration loader.
///
/// Keep in sync with the fields of `poortego_config::Config`.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--log-filter",
    "--log-format",
    "--store-path",
    "--history-path",
    "--protected-job",
    "--online-window-secs",
    "--autosave-secs",
];

/// Console flags whose value must never be mistaken for a configuration flag.
const CONSOLE_VALUE_FLAGS: &[&str] = &["--execute", "-x"];

/// Arguments partitioned between the two parsers. Both keep the program name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Destination {
    Config { needs_value: bool },
    Cli { needs_value: bool },
}

fn classify(argument: &OsStr) -> Destination {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        Destination::Config {
            needs_value: !inline_value,
        }
    } else {
        Destination::Cli {
            needs_value: CONSOLE_VALUE_FLAGS.contains(&flag) && !inline_value,
        }
    }
}

/// Partitions `args` (program name first) between the two parsers.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ArgumentSplit::default();
    };
    let mut split = ArgumentSplit {
        config_arguments: vec![program.clone()],
        cli_arguments: vec![program.clone()],
    };

    let mut remaining = rest.iter();
    while let Some(argument) = remaining.next() {
        let (target, needs_value) = match classify(argument) {
            Destination::Config { needs_value } => (&mut split.config_arguments, needs_value),
            Destination::Cli { needs_value } => (&mut split.cli_arguments, needs_value),
        };
        target.push(argument.clone());
        if needs_value && let Some(value) = remaining.next() {
            target.push(value.clone());
        }
    }
    split
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case::empty(&[], &[], &[])]
    #[case::program_only(&["poortego"], &["poortego"], &["poortego"])]
    #[case::config_then_execute(
        &["poortego", "--store-path", "/tmp/s.json", "--execute", "jobs"],
        &["poortego", "--store-path", "/tmp/s.json"],
        &["poortego", "--execute", "jobs"]
    )]
    #[case::execute_then_config(
        &["poortego", "-x", "show projects", "--log-filter=debug"],
        &["poortego", "--log-filter=debug"],
        &["poortego", "-x", "show projects"]
    )]
    #[case::execute_value_looks_like_flag(
        &["poortego", "--execute", "--store-path"],
        &["poortego"],
        &["poortego", "--execute", "--store-path"]
    )]
    #[case::unknown_flags_go_to_clap(
        &["poortego", "--bogus"],
        &["poortego"],
        &["poortego", "--bogus"]
    )]
    fn partitions_arguments(
        #[case] args: &[&str],
        #[case] config: &[&str],
        #[case] cli: &[&str],
    ) {
        let split = split_config_arguments(&os(args));
        if args.is_empty() {
            assert_eq!(split, ArgumentSplit::default());
            return;
        }
        assert_eq!(split.config_arguments, os(config));
        assert_eq!(split.cli_arguments, os(cli));
    }
}
