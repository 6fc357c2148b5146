//! Input loops: the interactive line editor and non-interactive execution.

use std::cell::RefCell;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::rc::Rc;

use camino::Utf8Path;
use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::debug;

use crate::dispatch::complete;
use crate::driver::Driver;
use crate::errors::AppError;
use crate::health::LIFECYCLE_TARGET;
use crate::output::Output;
use crate::prompt;

/// Line editor helper that completes against the live driver.
///
/// Completion runs while the loop is blocked in `readline`, so the driver is
/// never mutably borrowed at that point; if it were, completion would simply
/// offer nothing.
pub(crate) struct ConsoleHelper {
    driver: Rc<RefCell<Driver>>,
}

impl ConsoleHelper {
    pub(crate) fn new(driver: Rc<RefCell<Driver>>) -> Self {
        Self { driver }
    }
}

impl Completer for ConsoleHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Self::Candidate>)> {
        let Ok(driver) = self.driver.try_borrow() else {
            return Ok((pos, Vec::new()));
        };
        let completion = complete(&driver, line, pos);
        Ok((completion.start, completion.candidates))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}

/// Runs `lines` in order, stopping early on `exit`.
pub(crate) fn run_batch<W: Write>(mut driver: Driver, lines: &[String], stdout: &mut W) {
    for line in lines {
        let mut output = Output::new(&mut *stdout);
        driver.run_single(line, &mut output);
        output.flush();
        if !driver.is_running() {
            break;
        }
    }
    driver.shutdown();
}

/// Runs the interactive read/route loop until `exit`, end of input, or an
/// editor failure.
pub(crate) fn run_interactive<W: Write>(
    driver: Driver,
    history: Option<&Utf8Path>,
    quiet: bool,
    stdout: &mut W,
) -> Result<(), AppError> {
    let driver = Rc::new(RefCell::new(driver));
    let mut editor: Editor<ConsoleHelper, DefaultHistory> = Editor::new()?;
    editor.set_helper(Some(ConsoleHelper::new(Rc::clone(&driver))));
    if let Some(path) = history
        && let Err(error) = editor.load_history(path)
    {
        debug!(target: LIFECYCLE_TARGET, path = %path, %error, "no history loaded");
    }

    if !quiet {
        let mut output = Output::new(&mut *stdout);
        output.line("poortego console. Type help for the commands of the current context.");
        output.flush();
    }

    let ansi = io::stdout().is_terminal();
    let outcome = loop {
        let prompt_text = prompt::line(driver.borrow().prompt(), ansi);
        let line = match editor.readline(&prompt_text) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break Ok(()),
            Err(error) => break Err(AppError::Editor(error)),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let mut session = driver.borrow_mut();
        let mut output = Output::new(&mut *stdout);
        session.run_single(&line, &mut output);
        output.flush();
        if !session.is_running() {
            break Ok(());
        }
    };

    if let Some(path) = history {
        save_history(&mut editor, path);
    }
    driver.borrow_mut().shutdown();
    outcome
}

fn save_history(editor: &mut Editor<ConsoleHelper, DefaultHistory>, path: &Utf8Path) {
    if let Some(parent) = path.parent()
        && let Err(error) = fs::create_dir_all(parent)
    {
        debug!(target: LIFECYCLE_TARGET, path = %parent, %error, "history directory unavailable");
        return;
    }
    if let Err(error) = editor.save_history(path) {
        debug!(target: LIFECYCLE_TARGET, path = %path, %error, "history not saved");
    }
}
