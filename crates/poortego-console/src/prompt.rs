//! Prompt rendering.
//!
//! The context segment is a pure function of the stack and the focus, so
//! every transition can recompute it instead of patching strings.

use crate::dispatch::{Dispatcher, DispatcherStack};
use crate::interface::Focus;

const PROGRAM: &str = "poortego";
const BOLD_RED: &str = "\x1b[1;31m";
const RESET: &str = "\x1b[0m";

/// Renders the context segment for the top of `stack`.
#[must_use]
pub fn render(stack: &DispatcherStack, focus: &Focus) -> String {
    match stack.top() {
        Dispatcher::Core => String::new(),
        Dispatcher::Project => focus
            .project()
            .map(|project| format!("({})", project.name))
            .unwrap_or_default(),
        Dispatcher::Target => target_segment(focus),
        Dispatcher::Command => match focus.command() {
            Some(command) => format!("{} {}", target_segment(focus), command.module.name),
            None => target_segment(focus),
        },
    }
}

fn target_segment(focus: &Focus) -> String {
    focus
        .target()
        .map(|target| format!("({}) [{}]", target.address, target.id))
        .unwrap_or_default()
}

/// Builds the full editor prompt around a context segment.
#[must_use]
pub fn line(context: &str, ansi: bool) -> String {
    if context.is_empty() {
        format!("{PROGRAM} > ")
    } else if ansi {
        format!("{PROGRAM} {BOLD_RED}{context}{RESET} > ")
    } else {
        format!("{PROGRAM} {context} > ")
    }
}
