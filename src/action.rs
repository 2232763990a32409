//! What happens to a file once its condition is met.
//!
//! Until the operator picks one of the "all" commands every match is
//! confirmed individually. After that the chosen action is applied to every
//! remaining match without asking again, for the rest of the run.

use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::*;
use dialoguer::{theme::ColorfulTheme, Input};

use crate::colors;
use crate::ops::{FileOps, OpError};

/// Run-scoped escalation state. Only ever moves away from `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Escalation {
    #[default]
    None,
    Delete,
    Move,
}

/// Operator answer for one matching file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    DeleteOne,
    DeleteAll,
    MoveOne,
    MoveAll,
    Skip,
    Quit,
}

impl Choice {
    /// Parse a command as typed at the prompt. Case matters: `d` deletes one
    /// file, `D` deletes every match from here on.
    ///
    /// Anything else is `None`, never a skip; only an empty answer or `s`
    /// leaves the file alone.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "d" => Some(Choice::DeleteOne),
            "D" => Some(Choice::DeleteAll),
            "m" => Some(Choice::MoveOne),
            "M" => Some(Choice::MoveAll),
            "" | "s" => Some(Choice::Skip),
            "q" | "quit" | "exit" => Some(Choice::Quit),
            _ => None,
        }
    }
}

/// Single-character commands, printed once before processing starts.
pub const LEGEND: &[(&str, &str)] = &[
    ("d", "delete this file"),
    ("D", "delete this and every following match"),
    ("m", "move this file to the destination directory"),
    ("M", "move this and every following match"),
    ("enter", "skip to the next file"),
    ("q", "quit"),
];

pub fn print_legend() {
    println!("{}", "Commands:".bold().color(colors::HEADER));
    for (key, meaning) in LEGEND {
        println!("  {:>5} = {}", key.bold(), meaning);
    }
    println!();
}

/// Asks the operator what to do with a matching file.
pub trait Prompter {
    fn choose(&mut self, file: &Path) -> Result<Choice>;
}

/// Prompts on the terminal. An unknown answer is reported and asked again
/// rather than taken as a skip.
pub struct ConsolePrompter {
    theme: ColorfulTheme,
}

impl ConsolePrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for ConsolePrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for ConsolePrompter {
    fn choose(&mut self, _file: &Path) -> Result<Choice> {
        loop {
            let answer: String = Input::with_theme(&self.theme)
                .with_prompt("Action on this file [d|D|m|M|enter=skip|q]")
                .allow_empty(true)
                .interact_text()?;

            if let Some(choice) = Choice::parse(&answer) {
                return Ok(choice);
            }
            println!("{} Unknown command '{}'", "⚠️".yellow(), answer);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Delete,
    Move,
}

/// Result of handling one matching file.
#[derive(Debug)]
pub enum Outcome {
    Deleted,
    Moved(PathBuf),
    Skipped,
    Failed(Action, OpError),
    Quit,
}

/// Decides, per matching file, whether to prompt or auto-apply, and
/// carries the action out.
pub struct ActionController<O, P> {
    state: Escalation,
    ops: O,
    prompter: P,
    destination: PathBuf,
}

impl<O: FileOps, P: Prompter> ActionController<O, P> {
    pub fn new(ops: O, prompter: P, destination: impl Into<PathBuf>) -> Self {
        Self {
            state: Escalation::None,
            ops,
            prompter,
            destination: destination.into(),
        }
    }

    pub fn state(&self) -> Escalation {
        self.state
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Handle one file whose condition is met.
    ///
    /// A failed delete or move is reported in the outcome and leaves the
    /// escalation state as it is.
    ///
    /// # Errors
    ///
    /// Only a failure to read the operator's answer is an error.
    pub fn handle_match(&mut self, file: &Path) -> Result<Outcome> {
        let action = match self.state {
            Escalation::Delete => Action::Delete,
            Escalation::Move => Action::Move,
            Escalation::None => match self.prompter.choose(file)? {
                Choice::DeleteOne => Action::Delete,
                Choice::DeleteAll => {
                    self.escalate(Escalation::Delete);
                    Action::Delete
                }
                Choice::MoveOne => Action::Move,
                Choice::MoveAll => {
                    self.escalate(Escalation::Move);
                    Action::Move
                }
                Choice::Skip => return Ok(Outcome::Skipped),
                Choice::Quit => return Ok(Outcome::Quit),
            },
        };

        Ok(self.apply(action, file))
    }

    fn escalate(&mut self, to: Escalation) {
        tracing::debug!(from = ?self.state, to = ?to, "escalating");
        self.state = to;
    }

    fn apply(&self, action: Action, file: &Path) -> Outcome {
        match action {
            Action::Delete => match self.ops.delete(file) {
                Ok(()) => Outcome::Deleted,
                Err(e) => Outcome::Failed(action, e),
            },
            Action::Move => match self.ops.move_into(file, &self.destination) {
                Ok(target) => Outcome::Moved(target),
                Err(e) => Outcome::Failed(action, e),
            },
        }
    }
}
