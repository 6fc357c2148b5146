//! Handler-level tests driven through the router.

use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use super::support::{self, run, seed_entity, spawn_idle_job};
use crate::dispatch::{Dispatcher, RouteOutcome};
use crate::driver::Driver;
use crate::prompt;
use crate::store::{RecordId, RecordKind};

#[fixture]
fn driver() -> Driver {
    support::driver()
}

/// Driver with an online entity already targeted.
fn targeted(driver: &mut Driver) -> RecordId {
    let id = seed_entity(driver, "web", "10.0.0.5", true);
    let (outcome, text) = run(driver, &format!("target {id}"));
    assert_eq!(outcome, RouteOutcome::Handled, "{text}");
    id
}

#[rstest]
fn creating_the_same_project_twice_reuses_the_record(mut driver: Driver) {
    run(&mut driver, "create project alpha");
    run(&mut driver, "back");
    let (outcome, text) = run(&mut driver, "create project alpha");

    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains("id 1"), "{text}");
    let projects = driver.store().list(RecordKind::Project).expect("list");
    assert_eq!(projects.len(), 1);
    assert!(projects[0].field("created_at").is_some());
}

#[rstest]
fn create_without_a_name_prints_usage(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "create project");
    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains("create project <name>"));
    assert_eq!(driver.current_dispatcher(), Dispatcher::Core);
}

#[rstest]
fn create_rejects_unknown_kinds(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "create widget w1");
    assert_eq!(outcome, RouteOutcome::Failed);
    assert_eq!(
        text,
        "[-] Invalid parameter, try create -h for more information.\n"
    );
}

#[rstest]
fn entities_created_in_a_project_are_listed_there(mut driver: Driver) {
    run(&mut driver, "create project alpha");
    run(&mut driver, "create entity gateway 192.168.1.1");
    run(&mut driver, "back");
    run(&mut driver, "create entity stray");
    run(&mut driver, "create project alpha");

    let (_, text) = run(&mut driver, "entities");
    assert!(text.contains("gateway"), "{text}");
    assert!(text.contains("192.168.1.1"), "{text}");
    assert!(!text.contains("stray"), "{text}");
}

#[rstest]
fn project_fields_can_be_set_and_cleared(mut driver: Driver) {
    run(&mut driver, "create project alpha");

    let (_, text) = run(&mut driver, "set owner blue team");
    assert_eq!(text, "[+] owner => blue team\n");
    let (_, text) = run(&mut driver, "info");
    assert!(text.contains("blue team"), "{text}");

    let (_, text) = run(&mut driver, "unset owner");
    assert_eq!(text, "[+] Cleared owner\n");
    let (_, text) = run(&mut driver, "unset owner");
    assert_eq!(text, "[*] owner was not set\n");
}

#[rstest]
fn project_commands_are_unknown_at_the_root(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "set owner someone");
    assert_eq!(outcome, RouteOutcome::Unknown);
    assert_eq!(text, "[-] Unknown command: set.\n");
}

#[rstest]
#[case::core("create", "Create something")]
#[case::jobs("jobs", "Usage: jobs [options]")]
fn help_for_one_command_routes_its_help_flag(
    mut driver: Driver,
    #[case] command: &str,
    #[case] expected: &str,
) {
    let (outcome, text) = run(&mut driver, &format!("help {command}"));
    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains(expected), "{text}");
}

#[rstest]
fn help_for_an_unknown_command_fails_once(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "help bogus");
    assert_eq!(outcome, RouteOutcome::Failed);
    assert_eq!(text, "[-] Unknown command: bogus.\n");
}

#[rstest]
fn root_help_lists_every_active_context_top_first(mut driver: Driver) {
    targeted(&mut driver);
    let (_, text) = run(&mut driver, "help");
    let target = text.find("Target Commands").expect("target table");
    let core = text.find("Core Commands").expect("core table");
    assert!(target < core);
}

#[rstest]
fn target_commands_are_gated_by_show(mut driver: Driver) {
    let (_, text) = run(&mut driver, "show info");
    assert!(text.contains("No entity is targeted"), "{text}");

    targeted(&mut driver);
    let (_, text) = run(&mut driver, "show info commands");
    assert!(text.contains("10.0.0.5"), "{text}");
    assert!(text.contains("fingerprint"), "{text}");
}

#[rstest]
fn show_rejects_unknown_categories(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "show everything");
    assert_eq!(outcome, RouteOutcome::Handled);
    assert_eq!(
        text,
        "[-] Invalid parameter, try show -h for more information.\n"
    );
}

#[rstest]
fn show_lists_projects_and_entities(mut driver: Driver) {
    seed_entity(&driver, "web", "10.0.0.5", true);
    seed_entity(&driver, "db", "10.0.0.9", false);
    run(&mut driver, "create project alpha");

    let (_, text) = run(&mut driver, "show projects entities offline");
    assert!(text.contains("alpha"));
    let online = text.find("Currently online entities").expect("online table");
    let offline = text.find("Previously seen entities").expect("offline table");
    assert!(text[online..offline].contains("web"));
    assert!(text[offline..].contains("db"));
    assert!(!text[online..offline].contains("db"));
}

#[rstest]
fn selecting_an_unknown_module_keeps_the_target(mut driver: Driver) {
    targeted(&mut driver);
    let (outcome, text) = run(&mut driver, "select portscan");
    assert_eq!(outcome, RouteOutcome::Failed);
    assert_eq!(text, "[*] No command module named 'portscan'.\n");
    assert_eq!(driver.dispatcher_stack().names(), vec!["Core", "Target"]);
}

#[rstest]
fn selecting_again_replaces_the_module(mut driver: Driver) {
    targeted(&mut driver);
    run(&mut driver, "select fingerprint");
    let (outcome, _) = run(&mut driver, "select annotate");

    assert_eq!(outcome, RouteOutcome::Handled);
    assert_eq!(
        driver.dispatcher_stack().names(),
        vec!["Core", "Target", "Command"]
    );
    assert!(driver.prompt().ends_with("annotate"));
}

#[rstest]
fn params_are_validated_against_the_module(mut driver: Driver) {
    targeted(&mut driver);
    run(&mut driver, "select annotate");

    let (outcome, text) = run(&mut driver, "param colour red");
    assert_eq!(outcome, RouteOutcome::Failed);
    assert!(text.starts_with("[*] "), "{text}");

    let (_, text) = run(&mut driver, "param note needs patching");
    assert_eq!(text, "note => needs patching\n");
    let (_, text) = run(&mut driver, "param note");
    assert_eq!(text, "note => needs patching\n");
}

#[rstest]
fn execute_requires_every_required_option(mut driver: Driver) {
    targeted(&mut driver);
    run(&mut driver, "select annotate");

    let (outcome, text) = run(&mut driver, "execute");
    assert_eq!(outcome, RouteOutcome::Failed);
    assert_eq!(text, "[*] Missing required options: note\n");
    assert!(driver.jobs().is_empty());
}

#[rstest]
fn execute_runs_the_module_as_a_job(mut driver: Driver) {
    let id = targeted(&mut driver);
    run(&mut driver, "select annotate");
    run(&mut driver, "param note patched");

    let (outcome, text) = run(&mut driver, "execute");
    assert_eq!(outcome, RouteOutcome::Handled);
    assert_eq!(text, "[+] Started job 0: module:annotate\n");

    wait_for_jobs(&mut driver);
    let record = driver
        .store()
        .get(RecordKind::Entity, id)
        .expect("get")
        .expect("entity");
    assert_eq!(record.field("notes"), Some("patched"));
    driver.shutdown();
}

#[rstest]
fn finished_module_results_are_listed(mut driver: Driver) {
    targeted(&mut driver);
    run(&mut driver, "select fingerprint");
    run(&mut driver, "param fields address");
    run(&mut driver, "execute");

    wait_for_jobs(&mut driver);
    let (outcome, text) = run(&mut driver, "jobs -l");
    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains("Finished jobs"), "{text}");
    assert!(text.contains("module:fingerprint"), "{text}");
    assert!(text.contains("address=10.0.0.5"), "{text}");
    driver.shutdown();
}

/// Polls until every job has finished and been pruned.
fn wait_for_jobs(driver: &mut Driver) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !driver.jobs_mut().list().is_empty() {
        assert!(Instant::now() < deadline, "job never finished");
        thread::sleep(Duration::from_millis(10));
    }
}

#[rstest]
fn jobs_lists_running_jobs(mut driver: Driver) {
    spawn_idle_job(&mut driver, "sweep");
    let (_, text) = run(&mut driver, "jobs");
    assert!(text.contains("sweep"), "{text}");
    assert!(text.ends_with("Try: jobs -h\n"), "{text}");
    driver.shutdown();
}

#[rstest]
fn jobs_kill_without_an_id_prints_help(mut driver: Driver) {
    let (outcome, text) = run(&mut driver, "jobs -k");
    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains("Usage: jobs [options]"), "{text}");
}

#[rstest]
#[case::jobs_positional("jobs bogus", "Usage: jobs [options]")]
#[case::jobs_unknown_flag("jobs -x", "Usage: jobs [options]")]
#[case::online_extra("online bogus", "Usage: online [-h]")]
#[case::offline_extra("offline bogus", "Usage: offline [-h]")]
fn unexpected_arguments_print_the_command_help(
    mut driver: Driver,
    #[case] line: &str,
    #[case] usage: &str,
) {
    seed_entity(&driver, "web", "10.0.0.5", true);
    let (outcome, text) = run(&mut driver, line);
    assert_eq!(outcome, RouteOutcome::Handled);
    assert!(text.contains(usage), "{text}");
    assert!(!text.contains("web"), "{text}");
}

#[rstest]
fn quit_is_an_alias_for_exit(mut driver: Driver) {
    run(&mut driver, "quit");
    assert!(!driver.is_running());
}

/// Lines the exhaustive walk draws from. `{entity}` is replaced by the id of
/// an online entity and `{stale}` by an offline one.
const VOCABULARY: &[&str] = &[
    "",
    "create project alpha",
    "back",
    "target {entity}",
    "review {stale}",
    "target {stale}",
    "select fingerprint",
    "bogus",
    "help",
    "jobs -k 7",
];

fn check_invariants(driver: &Driver, line: &str) {
    let names = driver.dispatcher_stack().names();
    assert_eq!(names.first(), Some(&"Core"), "root lost after {line:?}");
    let unique: HashSet<_> = names.iter().collect();
    assert_eq!(unique.len(), names.len(), "duplicate context after {line:?}");
    assert!(
        !(names.contains(&"Project") && names.contains(&"Target")),
        "project and target both active after {line:?}"
    );
    if names.contains(&"Command") {
        assert_eq!(names.last(), Some(&"Command"));
        assert!(names.contains(&"Target"));
    }
    assert_eq!(
        driver.prompt(),
        prompt::render(driver.dispatcher_stack(), driver.focus()),
        "prompt out of step after {line:?}"
    );
}

#[test]
fn every_short_session_keeps_the_stack_consistent() {
    for first in VOCABULARY {
        for second in VOCABULARY {
            for third in VOCABULARY {
                let mut driver = support::driver();
                let online = seed_entity(&driver, "web", "10.0.0.5", true);
                let offline = seed_entity(&driver, "db", "10.0.0.9", false);
                for template in [first, second, third] {
                    let line = template
                        .replace("{entity}", &online.to_string())
                        .replace("{stale}", &offline.to_string());
                    let stack = driver.dispatcher_stack().names();
                    let prompt = driver.prompt().to_owned();

                    let (outcome, text) = run(&mut driver, &line);

                    if matches!(outcome, RouteOutcome::Unknown | RouteOutcome::Empty) {
                        assert_eq!(driver.dispatcher_stack().names(), stack, "{line:?}");
                        assert_eq!(driver.prompt(), prompt, "{line:?}");
                    }
                    if outcome == RouteOutcome::Unknown {
                        assert_eq!(text.lines().count(), 1, "{line:?}: {text}");
                    }
                    check_invariants(&driver, &line);
                }
            }
        }
    }
}
