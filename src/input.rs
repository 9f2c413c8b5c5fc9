use crate::commands::dispatcher::CommandDispatcher;
use crate::core::error::AssistError;

use console::style;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};

pub type ChatEditor = Editor<ChatHelper, DefaultHistory>;

/// Completes `/commands` at the start of a line and file paths everywhere else.
pub struct ChatHelper {
    filename_completer: FilenameCompleter,
    hinter: HistoryHinter,
    command_registry: CommandDispatcher,
}

impl ChatHelper {
    pub fn new(command_registry: CommandDispatcher) -> Self {
        Self {
            filename_completer: FilenameCompleter::new(),
            hinter: HistoryHinter {},
            command_registry,
        }
    }
}

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if let Some(command_part) = line[..pos].strip_prefix('/') {
            if !command_part.contains(' ') {
                let matches: Vec<Pair> = self
                    .command_registry
                    .get_command_names()
                    .into_iter()
                    .filter(|cmd| cmd.starts_with(command_part))
                    .map(|cmd| Pair {
                        display: cmd.clone(),
                        replacement: cmd,
                    })
                    .collect();
                return Ok((1, matches));
            }
        }

        self.filename_completer.complete(line, pos, ctx)
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {}

impl Validator for ChatHelper {}

/// Line editor with in-memory history only; nothing typed is written to disk.
pub fn create_editor(command_registry: CommandDispatcher) -> Result<ChatEditor, AssistError> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| AssistError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(ChatHelper::new(command_registry)));
    Ok(editor)
}

/// Read one line. `Ok(None)` on Ctrl-C / Ctrl-D.
pub fn read_line(editor: &mut ChatEditor, prompt: &str) -> Result<Option<String>, AssistError> {
    let prompt = if cfg!(windows) {
        prompt.to_string()
    } else {
        style(prompt).bold().cyan().to_string()
    };

    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(line.as_str())
                    .map_err(|e| AssistError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(err) => Err(AssistError::Input(format!("Input error: {}", err))),
    }
}
