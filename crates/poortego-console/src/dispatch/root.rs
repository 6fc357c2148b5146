//! Core context: the root of every session.

use std::ops::ControlFlow;

use crate::args::{ArgumentSpec, BARE_OPTIONS, FlagSpec, ParsedArg};
use crate::driver::Driver;
use crate::interface::{
    ProjectFocus, Reachability, TargetFocus, entities, format_timestamp, now_unix,
    reachable_entity,
};
use crate::output::Output;
use crate::store::{Record, RecordKind};
use crate::table::Table;

use super::context::{CompletionProvider, Dispatcher, Handler};
use super::errors::CommandError;
use super::table::{CommandEntry, CommandTable};
use super::{command, target};

pub(super) const COMMANDS: CommandTable = CommandTable::new(&[
    CommandEntry::new("?", "Help menu"),
    CommandEntry::new("back", "Move back from the current context"),
    CommandEntry::new("create", "Create something"),
    CommandEntry::new("exit", "Exit the console"),
    CommandEntry::new("help", "Help menu"),
    CommandEntry::new("jobs", "Print information about or terminate jobs"),
    CommandEntry::new("offline", "List previously seen entities"),
    CommandEntry::new("online", "List currently online entities"),
    CommandEntry::new("quit", "Exit the console"),
    CommandEntry::new("review", "Review an offline entity"),
    CommandEntry::new("show", "Display entities, projects, jobs or context details"),
    CommandEntry::new("target", "Target an online entity"),
]);

const JOBS_OPTIONS: ArgumentSpec = ArgumentSpec::new(&[
    FlagSpec::switch("-h", "Help."),
    FlagSpec::switch("-l", "List jobs."),
    FlagSpec::valued("-k", "Terminate the job."),
]);

const CREATABLE: &[(&str, &str)] = &[
    ("project", "create project <name>"),
    ("entity", "create entity <name> [address]"),
];

const SHOW_CATEGORIES: &[(&str, &str)] = &[
    ("entities", "Currently online entities (alias: online)"),
    ("offline", "Previously seen entities"),
    ("projects", "Every recorded project"),
    ("jobs", "Background jobs"),
    ("commands", "Command modules for the target (requires a target)"),
    ("info", "Details about the target (requires a target)"),
    ("cmdinfo", "Options of the selected module (requires a module)"),
];

pub(super) fn handler(name: &str) -> Option<Handler> {
    let handler: Handler = match name {
        "?" | "help" => cmd_help,
        "back" => cmd_back,
        "create" => cmd_create,
        "exit" | "quit" => cmd_exit,
        "jobs" => cmd_jobs,
        "offline" => cmd_offline,
        "online" => cmd_online,
        "review" => cmd_review,
        "show" => cmd_show,
        "target" => cmd_target,
        _ => return None,
    };
    Some(handler)
}

pub(super) fn completion(name: &str) -> Option<CompletionProvider> {
    let provider: CompletionProvider = match name {
        "?" | "help" => complete_help,
        "create" => complete_create,
        "jobs" => complete_jobs,
        "review" => complete_review,
        "show" => complete_show,
        "target" => complete_target,
        _ => return None,
    };
    Some(provider)
}

pub(super) fn wants_help(args: &[String]) -> bool {
    BARE_OPTIONS.has_switch(args, "-h")
}

/// Prints one command table per active context, top first.
pub(super) fn list_commands(driver: &Driver, output: &mut Output<'_>) {
    for dispatcher in driver.dispatcher_stack().iter_top_down() {
        output.line("");
        output.block(
            dispatcher
                .commands()
                .render(&format!("{} Commands", dispatcher.name())),
        );
    }
    output.line("");
}

/// Shows the help of one command by routing `<command> -h`.
pub(super) fn describe(
    driver: &mut Driver,
    output: &mut Output<'_>,
    command: &str,
) -> Result<(), CommandError> {
    if driver.dispatcher_stack().resolve(command).is_none() {
        return Err(CommandError::unknown_command(command));
    }
    driver.run_single(&format!("{command} -h"), output);
    Ok(())
}

fn cmd_help(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    match args.first().map(String::as_str) {
        Some("-h") => {
            output.line("Usage: help [command]");
            output.line("");
            output.line("Lists the commands of every active context, or shows one command's help.");
            Ok(())
        }
        Some(command) => describe(driver, output, command),
        None => {
            list_commands(driver, output);
            Ok(())
        }
    }
}

pub(super) fn complete_help(driver: &Driver, words: &[String]) -> Vec<String> {
    if !words.is_empty() {
        return Vec::new();
    }
    driver
        .dispatcher_stack()
        .iter_top_down()
        .flat_map(|dispatcher| dispatcher.commands().names())
        .map(str::to_owned)
        .collect()
}

fn cmd_back(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Move back one step");
        return Ok(());
    }
    let current = driver.current_dispatcher();
    current.unwind(driver)
}

fn cmd_exit(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if wants_help(args) {
        output.status("Exit the console, stopping every running job");
        return Ok(());
    }
    driver.stop();
    Ok(())
}

fn cmd_create(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    let [kind, rest @ ..] = args else {
        create_help(output);
        return Ok(());
    };
    if kind == "-h" || rest.is_empty() {
        create_help(output);
        return Ok(());
    }
    match kind.as_str() {
        "project" => create_project(driver, output, &rest.join(" ")),
        "entity" => {
            let [name, address @ ..] = rest else {
                create_help(output);
                return Ok(());
            };
            create_entity(driver, output, name, address.first().map(String::as_str))
        }
        _ => Err(CommandError::invalid_parameter("create")),
    }
}

fn create_help(output: &mut Output<'_>) {
    output.status("Create something (if not exists)");
    let mut table = Table::new(["Kind", "Usage"]);
    for (kind, usage) in CREATABLE {
        table.push_row([*kind, *usage]);
    }
    output.line("");
    output.block(table.render());
    output.line("");
}

fn create_project(
    driver: &mut Driver,
    output: &mut Output<'_>,
    name: &str,
) -> Result<(), CommandError> {
    let record = driver.store().find_or_create(RecordKind::Project, name)?;
    if record.field("created_at").is_none() {
        driver.store().set_field(
            RecordKind::Project,
            record.id,
            "created_at",
            &format_timestamp(now_unix()),
        )?;
    }

    driver.unwind_to_root()?;
    driver.focus_mut().set_project(ProjectFocus {
        id: record.id,
        name: record.name.clone(),
    });
    driver.enstack(Dispatcher::Project)?;
    driver.refresh_prompt();
    output.good(format!("Project '{}' selected (id {})", record.name, record.id));
    Ok(())
}

fn create_entity(
    driver: &mut Driver,
    output: &mut Output<'_>,
    name: &str,
    address: Option<&str>,
) -> Result<(), CommandError> {
    let store = driver.store();
    let record = store.find_or_create(RecordKind::Entity, name)?;
    store.set_field(
        RecordKind::Entity,
        record.id,
        "last_seen",
        &now_unix().to_string(),
    )?;
    if let Some(address) = address {
        store.set_field(RecordKind::Entity, record.id, "address", address)?;
    }
    if let Some(project) = driver.focus().project() {
        store.set_field(
            RecordKind::Entity,
            record.id,
            "project_id",
            &project.id.to_string(),
        )?;
    }
    output.good(format!("Entity '{}' recorded (id {})", record.name, record.id));
    Ok(())
}

fn complete_create(_driver: &Driver, words: &[String]) -> Vec<String> {
    if words.is_empty() {
        CREATABLE.iter().map(|(kind, _)| (*kind).to_owned()).collect()
    } else {
        Vec::new()
    }
}

fn cmd_jobs(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() {
        list_jobs(driver, output);
        output.line("Try: jobs -h");
        return Ok(());
    }

    JOBS_OPTIONS.parse(args, |parsed| match parsed {
        ParsedArg::Flag {
            flag: "-k",
            value: Some(id),
            ..
        } => {
            stop_job(driver, output, id);
            ControlFlow::Continue(())
        }
        ParsedArg::Flag { flag: "-l", .. } => {
            list_jobs(driver, output);
            ControlFlow::Continue(())
        }
        ParsedArg::Flag { .. } => {
            jobs_help(output);
            ControlFlow::Break(())
        }
        ParsedArg::Positional { .. } => {
            jobs_help(output);
            ControlFlow::Break(())
        }
    });
    Ok(())
}

fn jobs_help(output: &mut Output<'_>) {
    output.line("Usage: jobs [options]");
    output.line("");
    output.block(JOBS_OPTIONS.usage());
}

fn stop_job(driver: &mut Driver, output: &mut Output<'_>, id: &str) {
    let Some(job) = driver.jobs().get(id) else {
        output.error("no such job");
        return;
    };
    if job.name == driver.settings().protected_job() {
        output.line(format!(
            "Refusing to stop job {id} ({}): it stops when the console exits",
            job.name
        ));
        return;
    }
    output.line(format!("Stopping job: {id}..."));
    if let Err(error) = driver.jobs_mut().stop(id) {
        output.error(error.to_string());
    }
}

fn list_jobs(driver: &mut Driver, output: &mut Output<'_>) {
    let mut table = Table::new(["Id", "Job Name", "State"]);
    for job in driver.jobs_mut().list() {
        let state = if job.running { "running" } else { "finished" };
        table.push_row([job.id.to_string(), job.name, state.to_owned()]);
    }
    output.line("");
    output.block(table.render());
    output.line("");

    let finished = driver.jobs().finished();
    if finished.is_empty() {
        return;
    }
    let mut table = Table::new(["Id", "Job Name", "Result"]).with_title("Finished jobs");
    for job in finished {
        table.push_row([job.id.to_string(), job.name, job.result.unwrap_or_default()]);
    }
    output.block(table.render());
    output.line("");
}

fn complete_jobs(driver: &Driver, words: &[String]) -> Vec<String> {
    if words.last().is_some_and(|word| word == "-k") {
        driver
            .jobs()
            .snapshot()
            .into_iter()
            .map(|job| job.id.to_string())
            .collect()
    } else {
        JOBS_OPTIONS.flags().map(str::to_owned).collect()
    }
}

fn cmd_online(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if !args.is_empty() {
        output.line("Usage: online [-h]");
        output.line("");
        output.line(format!(
            "Lists entities seen within the last {} seconds.",
            driver.settings().online_window_secs()
        ));
        return Ok(());
    }
    list_entities(driver, output, Reachability::Online)
}

fn cmd_offline(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if !args.is_empty() {
        output.line("Usage: offline [-h]");
        output.line("");
        output.line("Lists entities that have not been seen recently.");
        return Ok(());
    }
    list_entities(driver, output, Reachability::Offline)
}

fn list_entities(
    driver: &Driver,
    output: &mut Output<'_>,
    wanted: Reachability,
) -> Result<(), CommandError> {
    let records = entities(
        driver.store(),
        wanted,
        now_unix(),
        driver.settings().online_window_secs(),
    )?;
    let title = match wanted {
        Reachability::Online => "Currently online entities",
        Reachability::Offline => "Previously seen entities",
    };
    let mut table = Table::new(["Id", "Name", "Address"]).with_title(title);
    for record in &records {
        table.push_row([
            record.id.to_string(),
            record.name.clone(),
            record.field("address").unwrap_or_default().to_owned(),
        ]);
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}

fn cmd_target(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    match args {
        [id, ..] if !wants_help(args) => focus_entity(driver, output, id, Reachability::Online),
        _ => {
            output.line("Usage: target <id>");
            output.line("");
            output.line("Targets an online entity; see `online` for candidates.");
            Ok(())
        }
    }
}

fn cmd_review(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    match args {
        [id, ..] if !wants_help(args) => focus_entity(driver, output, id, Reachability::Offline),
        _ => {
            output.line("Usage: review <id>");
            output.line("");
            output.line("Reviews an offline entity; see `offline` for candidates.");
            Ok(())
        }
    }
}

fn focus_entity(
    driver: &mut Driver,
    output: &mut Output<'_>,
    raw_id: &str,
    wanted: Reachability,
) -> Result<(), CommandError> {
    let record = reachable_entity(
        driver.store(),
        raw_id,
        wanted,
        now_unix(),
        driver.settings().online_window_secs(),
    )?
    .ok_or_else(|| {
        CommandError::domain_state(format!(
            "Entity does not appear to be {}..",
            wanted.as_str()
        ))
    })?;

    driver.unwind_to_root()?;
    driver
        .focus_mut()
        .set_target(TargetFocus::from_record(&record, wanted));
    driver.enstack(Dispatcher::Target)?;
    driver.refresh_prompt();
    output.good(format!(
        "Targeting entity {} ({}), {}",
        record.id,
        record.name,
        wanted.as_str()
    ));
    Ok(())
}

fn entity_ids(driver: &Driver, wanted: Reachability) -> Vec<String> {
    entities(
        driver.store(),
        wanted,
        now_unix(),
        driver.settings().online_window_secs(),
    )
    .map(|records| records.iter().map(|record| record.id.to_string()).collect())
    .unwrap_or_default()
}

fn complete_target(driver: &Driver, words: &[String]) -> Vec<String> {
    if words.is_empty() {
        entity_ids(driver, Reachability::Online)
    } else {
        Vec::new()
    }
}

fn complete_review(driver: &Driver, words: &[String]) -> Vec<String> {
    if words.is_empty() {
        entity_ids(driver, Reachability::Offline)
    } else {
        Vec::new()
    }
}

fn cmd_show(driver: &mut Driver, output: &mut Output<'_>, args: &[String]) -> Result<(), CommandError> {
    if args.is_empty() || wants_help(args) {
        show_help(output);
        return Ok(());
    }

    for category in args {
        match category.as_str() {
            "entities" | "online" => list_entities(driver, output, Reachability::Online)?,
            "offline" => list_entities(driver, output, Reachability::Offline)?,
            "projects" => show_projects(driver, output)?,
            "jobs" => list_jobs(driver, output),
            "commands" | "info" if !driver.dispatcher_enstacked(Dispatcher::Target.name()) => {
                output.error("No entity is targeted, try target -h for more information.");
            }
            "commands" => target::cmd_commands(driver, output, &[])?,
            "info" => target::cmd_info(driver, output, &[])?,
            "cmdinfo" if !driver.dispatcher_enstacked(Dispatcher::Command.name()) => {
                output.error("No command module is selected, try select -h for more information.");
            }
            "cmdinfo" => command::cmd_cmdinfo(driver, output, &[])?,
            _ => output.error(CommandError::invalid_parameter("show").to_string()),
        }
    }
    Ok(())
}

fn show_help(output: &mut Output<'_>) {
    output.line("Usage: show <category> [category...]");
    output.line("");
    let mut table = Table::new(["Category", "Description"]);
    for (category, description) in SHOW_CATEGORIES {
        table.push_row([*category, *description]);
    }
    output.block(table.render());
    output.line("");
}

fn show_projects(driver: &Driver, output: &mut Output<'_>) -> Result<(), CommandError> {
    let projects: Vec<Record> = driver.store().list(RecordKind::Project)?;
    let mut table = Table::new(["Id", "Name", "Owner", "Created"]).with_title("Projects");
    for project in &projects {
        table.push_row([
            project.id.to_string(),
            project.name.clone(),
            project.field("owner").unwrap_or_default().to_owned(),
            project.field("created_at").unwrap_or_default().to_owned(),
        ]);
    }
    output.line("");
    output.block(table.render());
    output.line("");
    Ok(())
}

fn complete_show(driver: &Driver, words: &[String]) -> Vec<String> {
    if !words.is_empty() {
        return Vec::new();
    }
    let mut categories = vec!["entities", "offline", "online", "projects", "jobs"];
    if driver.dispatcher_enstacked(Dispatcher::Target.name()) {
        categories.extend(["commands", "info"]);
    }
    if driver.dispatcher_enstacked(Dispatcher::Command.name()) {
        categories.push("cmdinfo");
    }
    categories.into_iter().map(str::to_owned).collect()
}
