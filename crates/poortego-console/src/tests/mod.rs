//! Test suites for the console crate.

mod completion;
mod navigation;
mod support;
