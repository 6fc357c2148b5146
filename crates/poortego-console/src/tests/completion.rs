//! Tab completion against live driver state.

use rstest::{fixture, rstest};

use super::support::{self, run, seed_entity, spawn_idle_job};
use crate::dispatch::{Completion, complete};
use crate::driver::Driver;

#[fixture]
fn driver() -> Driver {
    support::driver()
}

fn candidates(driver: &Driver, line: &str) -> Vec<String> {
    complete(driver, line, line.len()).candidates
}

#[rstest]
fn first_token_completes_root_commands(driver: Driver) {
    assert_eq!(candidates(&driver, "ex"), vec!["exit"]);
    assert_eq!(candidates(&driver, "o"), vec!["offline", "online"]);
}

#[rstest]
fn first_token_offers_the_union_of_active_contexts(mut driver: Driver) {
    assert!(candidates(&driver, "se").is_empty());

    run(&mut driver, "create project alpha");
    let offered = candidates(&driver, "");
    for command in ["set", "unset", "entities", "back", "jobs"] {
        assert!(offered.iter().any(|c| c == command), "missing {command}");
    }
    let helps = offered.iter().filter(|c| *c == "help").count();
    assert_eq!(helps, 1, "shadowed names are offered once");
}

#[rstest]
fn later_tokens_use_the_owning_provider(mut driver: Driver) {
    let id = seed_entity(&driver, "web", "10.0.0.5", true);
    assert_eq!(candidates(&driver, "create p"), vec!["project"]);
    assert_eq!(candidates(&driver, "target "), vec![id.to_string()]);

    run(&mut driver, &format!("target {id}"));
    assert_eq!(
        candidates(&driver, "select "),
        vec!["annotate", "fingerprint"]
    );
    run(&mut driver, "select annotate");
    assert_eq!(candidates(&driver, "param n"), vec!["note"]);
}

#[rstest]
fn shadowed_help_still_completes_command_names(mut driver: Driver) {
    assert_eq!(candidates(&driver, "help e"), vec!["exit"]);
    run(&mut driver, "create project alpha");
    assert_eq!(candidates(&driver, "help e"), vec!["entities", "exit"]);
}

#[rstest]
fn show_only_offers_categories_for_active_contexts(mut driver: Driver) {
    assert!(!candidates(&driver, "show ").contains(&"info".to_owned()));
    let id = seed_entity(&driver, "web", "10.0.0.5", true);
    run(&mut driver, &format!("target {id}"));
    assert_eq!(candidates(&driver, "show i"), vec!["info"]);
}

#[rstest]
fn job_ids_complete_after_the_kill_flag(mut driver: Driver) {
    spawn_idle_job(&mut driver, "sweep");
    assert_eq!(candidates(&driver, "jobs -k "), vec!["0"]);
    driver.shutdown();
}

#[rstest]
fn start_marks_the_partial_token(driver: Driver) {
    let completion = complete(&driver, "create  pro", 11);
    assert_eq!(
        completion,
        Completion {
            start: 8,
            candidates: vec!["project".to_owned()],
        }
    );
}

#[rstest]
fn the_cursor_bounds_the_completed_text(driver: Driver) {
    let completion = complete(&driver, "exit", 2);
    assert_eq!(completion.start, 0);
    assert_eq!(completion.candidates, vec!["exit"]);
}

#[rstest]
fn commands_without_providers_offer_nothing(driver: Driver) {
    assert!(candidates(&driver, "exit ").is_empty());
    assert!(candidates(&driver, "bogus ").is_empty());
}

#[rstest]
#[case::past_the_end("jobs", 40)]
#[case::inside_multibyte("créer", 2)]
#[case::after_multibyte("créer ", 7)]
#[case::only_spaces("    ", 2)]
#[case::punctuation("!?;", 3)]
#[case::empty("", 0)]
fn odd_positions_degrade_quietly(driver: Driver, #[case] line: &str, #[case] pos: usize) {
    let completion = complete(&driver, line, pos);
    assert!(completion.start <= line.len());
}
