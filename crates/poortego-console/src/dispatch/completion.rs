//! Tab completion derived from the active contexts.
//!
//! The first token completes against every command name on the stack. Later
//! tokens are delegated to the provider registered by the context that owns
//! the command. Malformed input degrades to no candidates.

use crate::driver::Driver;

/// Candidates for the token that ends at the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// Byte offset where the partial token starts.
    pub start: usize,
    /// Sorted, de-duplicated replacements for the partial token.
    pub candidates: Vec<String>,
}

/// Completes `line` at byte offset `pos`.
#[must_use]
pub fn complete(driver: &Driver, line: &str, pos: usize) -> Completion {
    let pos = pos.min(line.len());
    let Some(before) = line.get(..pos) else {
        return Completion {
            start: pos,
            candidates: Vec::new(),
        };
    };

    let start = before
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(index, ch)| index + ch.len_utf8());
    let partial = &before[start..];
    let words: Vec<String> = before[..start]
        .split_whitespace()
        .map(str::to_owned)
        .collect();

    let mut candidates: Vec<String> = match words.split_first() {
        None => driver
            .dispatcher_stack()
            .iter_top_down()
            .flat_map(|dispatcher| dispatcher.commands().names())
            .map(str::to_owned)
            .collect(),
        Some((command, rest)) => driver
            .dispatcher_stack()
            .iter_top_down()
            .find(|dispatcher| dispatcher.commands().contains(command))
            .and_then(|owner| owner.completion(command))
            .map(|provider| provider(driver, rest))
            .unwrap_or_default(),
    };

    candidates.retain(|candidate| candidate.starts_with(partial));
    candidates.sort_unstable();
    candidates.dedup();
    Completion { start, candidates }
}
