//! Target context, entered through `target <id>` or `review <id>`.

use crate::driver::Driver;
use crate::interface::{format_timestamp, now_unix, reachability};
use crate::modules::{catalogue, find};
use crate::output::Output;
use crate::store::RecordKind;
use crate::table::Table;

use super::context::{CompletionProvider, Dispatcher, Handler};
use super::errors::CommandError;
use super::root::wants_help;
use super::table::{CommandEntry, CommandTable};

pub(super) const COMMANDS: CommandTable = CommandTable::new(&[
    CommandEntry::new("commands", "List command modules for the target"),
    CommandEntry::new("info", "Show details about the targeted entity"),
    CommandEntry::new("select", "Select a command module to run against the target"),
]);

pub(super) fn handler(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "commands" => cmd_commands,
        "info" => cmd_info,
        "select" => cmd_select,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn completion(name: &str) -> Option<CompletionProvider> {
    match name {
        "select" => Some(complete_select),
        _ => None,
    }
}

pub(super) fn unwind(driver: &mut Driver) -> Result<(), CommandError> {
    if let Some(removed) = driver.remove_dispatcher(Dispatcher::Target.name())? {
        removed.release(driver.focus_mut());
    }
    driver.update_prompt("");
    Ok(())
}

pub(super) fn cmd_commands(
    _driver: &mut Driver,
    output: &mut Output<'_>,
    args: &[String],
) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("List the command modules that can run against the target");
        return Ok(());
    }
    let mut table = Table::new(["Module", "Description"]).with_title("Command modules");
    for module in catalogue() {
        table.push_row([module.name, module.description]);
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}

pub(super) fn cmd_info(
    driver: &mut Driver,
    output: &mut Output<'_>,
    args: &[String],
) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Show everything recorded about the targeted entity");
        return Ok(());
    }
    let target = driver
        .focus()
        .target()
        .ok_or_else(|| CommandError::domain_state("No entity is targeted."))?;
    let record = driver
        .store()
        .get(RecordKind::Entity, target.id)?
        .ok_or_else(|| CommandError::domain_state(format!("Entity {} no longer exists.", target.id)))?;

    let state = reachability(&record, now_unix(), driver.settings().online_window_secs());
    let last_seen = record
        .field("last_seen")
        .and_then(|seen| seen.parse::<u64>().ok())
        .map(format_timestamp)
        .unwrap_or_else(|| "never".to_owned());

    let mut table = Table::new(["Field", "Value"]).with_title(format!("Entity {}", record.name));
    table.push_row(["id".to_owned(), record.id.to_string()]);
    table.push_row(["state".to_owned(), state.as_str().to_owned()]);
    table.push_row(["last_seen".to_owned(), last_seen]);
    for (field, value) in &record.fields {
        if field != "last_seen" {
            table.push_row([field.clone(), value.clone()]);
        }
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}

fn cmd_select(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    let Some(name) = args.first().filter(|name| *name != "-h") else {
        output.line("Usage: select <module>");
        output.line("");
        output.line("Selects a command module; see `commands` for the list.");
        return Ok(());
    };
    let module = find(name)
        .ok_or_else(|| CommandError::domain_state(format!("No command module named '{name}'.")))?;

    if driver.dispatcher_enstacked(Dispatcher::Command.name()) {
        driver.remove_dispatcher(Dispatcher::Command.name())?;
    }
    driver.focus_mut().select_command(module);
    driver.enstack(Dispatcher::Command)?;
    driver.refresh_prompt();
    output.good(format!("Selected module {}", module.name));
    Ok(())
}

fn complete_select(_driver: &Driver, words: &[String]) -> Vec<String> {
    if words.is_empty() {
        catalogue()
            .iter()
            .map(|module| module.name.to_owned())
            .collect()
    } else {
        Vec::new()
    }
}
