//! Line-driven terminal view over [`TodoController`].
//!
//! # Responsibility
//! - Parse one input line into a view action.
//! - Render the controller state after every action.
//!
//! # Invariants
//! - Rows are addressed by their displayed 1-based position.
//! - The view never talks to storage except through the controller.

use colored::Colorize;
use std::io::{BufRead, Write};
use todo_core::{TodoController, TodoRepository, VoiceOutcome};

const HEADER: &str = "TODO App";
const HELP: &str = "type text + Enter to submit | Enter alone submits the draft | \
:edit N  :delete N  :cancel  :mic  :reload  :help  :quit | start with :: to enter text beginning with ':'";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Replace the draft with this text, then submit.
    Enter(String),
    /// Submit the current draft unchanged.
    SubmitDraft,
    Edit(usize),
    Delete(usize),
    CancelEdit,
    Mic,
    Reload,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ViewCommand {
    let line = line.trim_end_matches(['\n', '\r']);
    if let Some(literal) = line.strip_prefix("::") {
        return ViewCommand::Enter(format!(":{literal}"));
    }
    let Some(rest) = line.strip_prefix(':') else {
        if line.trim().is_empty() {
            return ViewCommand::SubmitDraft;
        }
        return ViewCommand::Enter(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    let extra = parts.next();

    let row = |arg: Option<&str>| -> Result<usize, String> {
        let value = arg.ok_or_else(|| format!(":{name} needs a row number"))?;
        match value.parse::<usize>() {
            Ok(row) if row > 0 => Ok(row),
            _ => Err(format!("`{value}` is not a row number")),
        }
    };

    if extra.is_some() {
        return ViewCommand::Invalid(format!("too many arguments for :{name}"));
    }

    match (name, arg) {
        ("e" | "edit", arg) => row(arg).map_or_else(ViewCommand::Invalid, ViewCommand::Edit),
        ("d" | "delete", arg) => row(arg).map_or_else(ViewCommand::Invalid, ViewCommand::Delete),
        ("c" | "cancel", None) => ViewCommand::CancelEdit,
        ("m" | "mic", None) => ViewCommand::Mic,
        ("r" | "reload", None) => ViewCommand::Reload,
        ("h" | "help", None) => ViewCommand::Help,
        ("q" | "quit", None) => ViewCommand::Quit,
        ("", _) => ViewCommand::Invalid("empty command".to_string()),
        (name, None) => ViewCommand::Invalid(format!("unknown command :{name}")),
        (name, Some(_)) => ViewCommand::Invalid(format!(":{name} takes no argument")),
    }
}

/// Renders the whole view as plain text (colors are applied by `colored`
/// and disabled automatically when output is not a terminal).
pub fn render<R: TodoRepository>(controller: &TodoController<R>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", HEADER.bold()));

    if let Some(notice) = controller.last_error() {
        out.push_str(&format!("{} {notice}\n", "!".red().bold()));
    }

    let mic = if controller.has_voice_input() { "  [mic]" } else { "" };
    out.push_str(&format!(
        "> {}  [{}]{mic}\n",
        controller.draft_text(),
        controller.submit_label().blue()
    ));

    if controller.items().is_empty() {
        out.push_str(&format!("  {}\n", "(no items)".dimmed()));
    }
    for (index, item) in controller.items().iter().enumerate() {
        let marker = if controller.editing().is_some_and(|editing| editing.id == item.id) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!(
            "{marker}{:>3}. {}  {}\n",
            index + 1,
            item.text,
            format!("(id {})", item.id).dimmed()
        ));
    }
    out
}

/// Runs the interactive loop until `:quit` or end of input.
pub fn run_session<R, I, O>(
    controller: &mut TodoController<R>,
    input: I,
    mut output: O,
) -> std::io::Result<()>
where
    R: TodoRepository,
    I: BufRead,
    O: Write,
{
    // Failure is already recorded as a notice and rendered below.
    let _ = controller.load();
    write!(output, "{}", render(controller))?;

    for line in input.lines() {
        let command = parse_command(&line?);
        if command == ViewCommand::Quit {
            break;
        }
        if let Some(message) = apply(controller, command) {
            writeln!(output, "{message}")?;
        }
        write!(output, "{}", render(controller))?;
        output.flush()?;
    }
    Ok(())
}

/// Applies one command; returns a one-line hint for the user, if any.
///
/// Storage errors are not returned here; they render from the notice.
fn apply<R: TodoRepository>(
    controller: &mut TodoController<R>,
    command: ViewCommand,
) -> Option<String> {
    match command {
        ViewCommand::Enter(text) => {
            controller.set_draft(text);
            let _ = controller.submit();
            None
        }
        ViewCommand::SubmitDraft => {
            let _ = controller.submit();
            None
        }
        ViewCommand::Edit(row) => match controller.items().get(row - 1).cloned() {
            Some(item) => {
                controller.begin_edit(&item);
                None
            }
            None => Some(format!("no row {row}")),
        },
        ViewCommand::Delete(row) => match controller.items().get(row - 1).map(|item| item.id) {
            Some(id) => {
                // Failures are rendered from the controller's notice.
                let _ = controller.delete(id);
                None
            }
            None => Some(format!("no row {row}")),
        },
        ViewCommand::CancelEdit => {
            controller.cancel_edit();
            None
        }
        ViewCommand::Mic => match controller.voice_capture() {
            VoiceOutcome::Captured | VoiceOutcome::Unavailable => None,
            VoiceOutcome::NoSpeech => Some("no speech recognized".to_string()),
            VoiceOutcome::Failed(message) => Some(format!("voice input failed: {message}")),
        },
        ViewCommand::Reload => {
            let _ = controller.load();
            None
        }
        ViewCommand::Help => Some(HELP.to_string()),
        ViewCommand::Invalid(message) => Some(format!("{message} (:help for commands)")),
        ViewCommand::Quit => None,
    }
}
