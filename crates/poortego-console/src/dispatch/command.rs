//! Command context: a module selected against the targeted entity.

use tracing::{info, warn};

use crate::driver::Driver;
use crate::jobs::JOBS_TARGET;
use crate::modules::ModuleRun;
use crate::output::Output;
use crate::store::RecordKind;
use crate::table::Table;

use super::context::{CompletionProvider, Dispatcher, Handler};
use super::errors::CommandError;
use super::root::wants_help;
use super::table::{CommandEntry, CommandTable};

pub(super) const COMMANDS: CommandTable = CommandTable::new(&[
    CommandEntry::new("cmdinfo", "Show the selected module's options"),
    CommandEntry::new("execute", "Run the selected module as a background job"),
    CommandEntry::new("param", "Set or show module parameters"),
]);

pub(super) fn handler(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "cmdinfo" => cmd_cmdinfo,
        "execute" => cmd_execute,
        "param" => cmd_param,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn completion(name: &str) -> Option<CompletionProvider> {
    match name {
        "param" => Some(complete_param),
        _ => None,
    }
}

pub(super) fn unwind(driver: &mut Driver) -> Result<(), CommandError> {
    if let Some(removed) = driver.remove_dispatcher(Dispatcher::Command.name())? {
        removed.release(driver.focus_mut());
    }
    driver.refresh_prompt();
    Ok(())
}

fn no_module() -> CommandError {
    CommandError::domain_state("No command module is selected.")
}

pub(super) fn cmd_cmdinfo(
    driver: &mut Driver,
    output: &mut Output<'_>,
    args: &[String],
) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Show the selected module's options and current values");
        return Ok(());
    }
    let command = driver.focus().command().ok_or_else(no_module)?;
    output.line("");
    output.line(format!("{}: {}", command.module.name, command.module.description));
    output.line("");

    let mut table = Table::new(["Option", "Required", "Value", "Description"]);
    for option in command.module.options {
        table.push_row([
            option.name,
            if option.required { "yes" } else { "no" },
            command.params.get(option.name).map_or("", String::as_str),
            option.description,
        ]);
    }
    output.block(table.render());
    output.line("");
    Ok(())
}

fn cmd_param(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.line("Usage: param [<option> [value]]");
        output.line("");
        output.line("Without arguments lists every value; with an option shows or sets it.");
        return Ok(());
    }
    let command = driver.focus_mut().command_mut().ok_or_else(no_module)?;
    match args {
        [] => {
            let mut table = Table::new(["Option", "Value"]);
            for (name, value) in &command.params {
                table.push_row([name.as_str(), value.as_str()]);
            }
            output.line("");
            output.block(table.render());
            output.line("");
        }
        [name] => match command.params.get(name) {
            Some(value) => output.line(format!("{name} => {value}")),
            None => output.status(format!("{name} is not set")),
        },
        [name, value @ ..] => {
            let option = command.module.option(name).ok_or_else(|| {
                CommandError::domain_state(format!(
                    "Module {} has no option '{name}'.",
                    command.module.name
                ))
            })?;
            let value = value.join(" ");
            output.line(format!("{} => {value}", option.name));
            command.params.insert(option.name.to_owned(), value);
        }
    }
    Ok(())
}

fn complete_param(driver: &Driver, words: &[String]) -> Vec<String> {
    match (words, driver.focus().command()) {
        ([], Some(command)) => command
            .module
            .options
            .iter()
            .map(|option| option.name.to_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn cmd_execute(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Run the selected module against the target in the background");
        return Ok(());
    }
    let command = driver.focus().command().cloned().ok_or_else(no_module)?;
    let missing = command.module.missing_options(&command.params);
    if !missing.is_empty() {
        return Err(CommandError::domain_state(format!(
            "Missing required options: {}",
            missing.join(", ")
        )));
    }
    let target_id = driver
        .focus()
        .target()
        .map(|target| target.id)
        .ok_or_else(|| CommandError::domain_state("No entity is targeted."))?;
    let record = driver
        .store()
        .get(RecordKind::Entity, target_id)?
        .ok_or_else(|| CommandError::domain_state(format!("Entity {target_id} no longer exists.")))?;

    let store = driver.store_handle();
    let module = command.module;
    let params = command.params;
    let job_name = format!("module:{}", module.name);
    let id = driver.jobs_mut().spawn_reporting(job_name.clone(), move |cancel| {
        let run = ModuleRun {
            target: &record,
            params: &params,
            store: store.as_ref(),
            cancel: &cancel,
        };
        let report = match module.run(&run) {
            Ok(summary) => {
                info!(target: JOBS_TARGET, module = module.name, %summary, "module finished");
                summary
            }
            Err(error) => {
                warn!(target: JOBS_TARGET, module = module.name, %error, "module failed");
                format!("failed: {error}")
            }
        };
        Some(report)
    })?;
    output.good(format!("Started job {id}: {job_name}"));
    Ok(())
}
