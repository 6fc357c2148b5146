//! Flag-style argument parsing shared by every console command.
//!
//! Commands declare the flags they recognise once, as an [`ArgumentSpec`], and
//! walk the tokenised arguments with [`ArgumentSpec::parse`]. Tokens that are
//! not declared flags, including unknown `-x` style tokens, are reported as
//! positionals so handlers can decide what to do with them.

use std::fmt::Write as _;
use std::ops::ControlFlow;

/// One recognised flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    /// Flag token including its dash, for example `-k`.
    pub flag: &'static str,
    /// Whether the following token is consumed as the flag's value.
    pub takes_value: bool,
    /// One-line description rendered by [`ArgumentSpec::usage`].
    pub description: &'static str,
}

impl FlagSpec {
    /// Declares a boolean switch.
    #[must_use]
    pub const fn switch(flag: &'static str, description: &'static str) -> Self {
        Self {
            flag,
            takes_value: false,
            description,
        }
    }

    /// Declares a flag that consumes the next token.
    #[must_use]
    pub const fn valued(flag: &'static str, description: &'static str) -> Self {
        Self {
            flag,
            takes_value: true,
            description,
        }
    }
}

/// Token produced while walking an argument list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedArg<'a> {
    /// A declared flag. `value` is `None` for switches and for valued flags
    /// that appear as the final token.
    Flag {
        flag: &'static str,
        index: usize,
        value: Option<&'a str>,
    },
    /// Any other token.
    Positional { index: usize, value: &'a str },
}

/// Declarative set of flags understood by a command.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentSpec {
    flags: &'static [FlagSpec],
}

/// Flags for commands whose only option is `-h`.
pub const BARE_OPTIONS: ArgumentSpec = ArgumentSpec::new(&[FlagSpec::switch("-h", "Help.")]);

impl ArgumentSpec {
    /// Wraps a static flag table.
    #[must_use]
    pub const fn new(flags: &'static [FlagSpec]) -> Self {
        Self { flags }
    }

    fn lookup(&self, token: &str) -> Option<&'static FlagSpec> {
        self.flags.iter().find(|spec| spec.flag == token)
    }

    /// Walks `args`, invoking `callback` for each flag or positional.
    ///
    /// Returning [`ControlFlow::Break`] from the callback stops the walk and
    /// the break value is returned.
    pub fn parse<'a, B, F>(&self, args: &'a [String], mut callback: F) -> Option<B>
    where
        F: FnMut(ParsedArg<'a>) -> ControlFlow<B>,
    {
        let mut index = 0;
        while let Some(token) = args.get(index).map(String::as_str) {
            let parsed = match self.lookup(token) {
                Some(spec) if spec.takes_value => {
                    let value = args.get(index + 1).map(String::as_str);
                    let parsed = ParsedArg::Flag {
                        flag: spec.flag,
                        index,
                        value,
                    };
                    index += 1;
                    parsed
                }
                Some(spec) => ParsedArg::Flag {
                    flag: spec.flag,
                    index,
                    value: None,
                },
                None => ParsedArg::Positional {
                    index,
                    value: token,
                },
            };
            index += 1;
            if let ControlFlow::Break(value) = callback(parsed) {
                return Some(value);
            }
        }
        None
    }

    /// Returns `true` when `args` contains the declared switch `flag`.
    #[must_use]
    pub fn has_switch(&self, args: &[String], flag: &str) -> bool {
        self.parse(args, |parsed| match parsed {
            ParsedArg::Flag { flag: seen, .. } if seen == flag => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        })
        .is_some()
    }

    /// Declared flag names, used for tab completion.
    pub fn flags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.flags.iter().map(|spec| spec.flag)
    }

    /// Renders an `OPTIONS:` block describing each flag, sorted by name.
    #[must_use]
    pub fn usage(&self) -> String {
        let mut specs: Vec<&FlagSpec> = self.flags.iter().collect();
        specs.sort_by_key(|spec| spec.flag);

        let labels: Vec<String> = specs
            .iter()
            .map(|spec| {
                if spec.takes_value {
                    format!("{} <opt>", spec.flag)
                } else {
                    spec.flag.to_owned()
                }
            })
            .collect();
        let width = labels.iter().map(String::len).max().unwrap_or(0);

        let mut output = String::from("OPTIONS:\n\n");
        for (label, spec) in labels.iter().zip(specs) {
            let _ = writeln!(output, "    {label:<width$}  {}", spec.description);
        }
        output
    }
}
