//! Project context, entered through `create project <name>`.

use crate::driver::Driver;
use crate::output::Output;
use crate::store::schema::schema;
use crate::store::{Record, RecordKind};
use crate::table::Table;

use super::context::{CompletionProvider, Dispatcher, Handler};
use super::errors::CommandError;
use super::root::{complete_help, describe, wants_help};
use super::table::{CommandEntry, CommandTable};

pub(super) const COMMANDS: CommandTable = CommandTable::new(&[
    CommandEntry::new("?", "Help menu for the project context"),
    CommandEntry::new("entities", "List entities recorded in this project"),
    CommandEntry::new("help", "Help menu for the project context"),
    CommandEntry::new("info", "Show project details"),
    CommandEntry::new("set", "Set a project field"),
    CommandEntry::new("unset", "Clear a project field"),
]);

pub(super) fn handler(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "?" | "help" => cmd_help,
        "entities" => cmd_entities,
        "info" => cmd_info,
        "set" => cmd_set,
        "unset" => cmd_unset,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn completion(name: &str) -> Option<CompletionProvider> {
    match name {
        "?" | "help" => Some(complete_help),
        "set" | "unset" => Some(complete_field),
        _ => None,
    }
}

pub(super) fn unwind(driver: &mut Driver) -> Result<(), CommandError> {
    let popped = driver.destack()?;
    popped.release(driver.focus_mut());
    driver.update_prompt("");
    Ok(())
}

fn focused(driver: &Driver) -> Result<Record, CommandError> {
    let project = driver
        .focus()
        .project()
        .ok_or_else(|| CommandError::domain_state("No project is selected."))?;
    driver
        .store()
        .get(RecordKind::Project, project.id)?
        .ok_or_else(|| CommandError::domain_state(format!("Project {} no longer exists.", project.id)))
}

fn cmd_help(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    match args.first().map(String::as_str) {
        Some("-h") => {
            output.line("Usage: help [command]");
            Ok(())
        }
        Some(command) => describe(driver, output, command),
        None => {
            output.line("");
            output.block(
                Dispatcher::Project
                    .commands()
                    .render("Project Commands"),
            );
            output.line("");
            output.line("Core commands such as back, show and jobs remain available.");
            Ok(())
        }
    }
}

fn cmd_info(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Show the selected project's fields");
        return Ok(());
    }
    let record = focused(driver)?;
    let mut table = Table::new(["Field", "Value"]).with_title(format!("Project {}", record.name));
    table.push_row(["id".to_owned(), record.id.to_string()]);
    for field in schema(RecordKind::Project).fields {
        table.push_row([*field, record.field(field).unwrap_or_default()]);
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}

fn cmd_set(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    let [field, value @ ..] = args else {
        set_help(output);
        return Ok(());
    };
    if field == "-h" || value.is_empty() {
        set_help(output);
        return Ok(());
    }
    let record = focused(driver)?;
    let value = value.join(" ");
    driver
        .store()
        .set_field(RecordKind::Project, record.id, field, &value)?;
    output.good(format!("{field} => {value}"));
    Ok(())
}

fn set_help(output: &mut Output<'_>) {
    output.line("Usage: set <field> <value>");
    output.line("");
    output.line(format!(
        "Fields: {}",
        schema(RecordKind::Project).fields.join(", ")
    ));
}

fn cmd_unset(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    let Some(field) = args.first().filter(|field| *field != "-h") else {
        output.line("Usage: unset <field>");
        return Ok(());
    };
    let record = focused(driver)?;
    if driver
        .store()
        .clear_field(RecordKind::Project, record.id, field)?
    {
        output.good(format!("Cleared {field}"));
    } else {
        output.status(format!("{field} was not set"));
    }
    Ok(())
}

fn complete_field(_driver: &Driver, words: &[String]) -> Vec<String> {
    if words.is_empty() {
        schema(RecordKind::Project)
            .fields
            .iter()
            .map(|field| (*field).to_owned())
            .collect()
    } else {
        Vec::new()
    }
}

fn cmd_entities(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("List entities created while this project was selected");
        return Ok(());
    }
    let project = focused(driver)?;
    let project_id = project.id.to_string();
    let mut table = Table::new(["Id", "Name", "Address"]).with_title(format!(
        "Entities in {}",
        project.name
    ));
    for record in driver.store().list(RecordKind::Entity)? {
        if record.field("project_id") == Some(project_id.as_str()) {
            table.push_row([
                record.id.to_string(),
                record.name.clone(),
                record.field("address").unwrap_or_default().to_owned(),
            ]);
        }
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}
