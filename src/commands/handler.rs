use super::ChatState;
use super::registry::CommandRegistry;
use crate::core::error::AssistError;
use crate::session::Role;

use console::style;

pub trait CommandHandler: Send + Sync {
    fn execute(&self, state: &mut ChatState, args: &[&str]) -> Result<Option<String>, AssistError>;
    fn help(&self) -> &'static str;
}

pub struct QuitCommand;
pub struct ModelCommand;
pub struct HistoryCommand;
pub struct FormCommand;

pub struct HelpCommand {
    lines: Vec<&'static str>,
}

impl HelpCommand {
    pub fn new(registry: &CommandRegistry) -> Self {
        Self {
            lines: registry.help_lines(),
        }
    }
}

impl CommandHandler for QuitCommand {
    fn execute(&self, state: &mut ChatState, _args: &[&str]) -> Result<Option<String>, AssistError> {
        state.should_continue = false;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/quit - End the session"
    }
}

impl CommandHandler for HelpCommand {
    fn execute(
        &self,
        _state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, AssistError> {
        let mut help_text = vec![style("Available Commands").bold().underlined().to_string()];
        help_text.extend(self.lines.iter().map(|line| style(line).to_string()));
        help_text.push(style(self.help()).to_string());
        help_text.push(format!(
            "Type '{}' to share a text document.",
            crate::prompt::UPLOAD_COMMAND
        ));
        Ok(Some(help_text.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/help - Show available commands"
    }
}

impl CommandHandler for ModelCommand {
    fn execute(&self, state: &mut ChatState, args: &[&str]) -> Result<Option<String>, AssistError> {
        match args.first() {
            None => Ok(Some(format!(
                "Current model: {}",
                state.orchestrator.model()
            ))),
            Some(new_model) => {
                state.orchestrator.set_model(new_model);
                Ok(Some(format!("Model changed to: {}", new_model)))
            }
        }
    }

    fn help(&self) -> &'static str {
        "/model <name> - Show or change the current model"
    }
}

impl CommandHandler for HistoryCommand {
    fn execute(&self, state: &mut ChatState, args: &[&str]) -> Result<Option<String>, AssistError> {
        let count = match args.first() {
            Some(n) => n
                .parse::<usize>()
                .map_err(|_| AssistError::Input(format!("Not a number: {}", n)))?,
            None => 5,
        };

        if state.session.is_empty() {
            return Ok(Some("No messages yet.".to_string()));
        }

        let lines: Vec<String> = state
            .session
            .recent(count)
            .iter()
            .map(|turn| {
                let role = match turn.role() {
                    Role::User => style("You").bold().green(),
                    Role::Assistant => style("Assistant").bold().cyan(),
                };
                format!("{}: {}", role, turn.content())
            })
            .collect();
        Ok(Some(lines.join("\n\n")))
    }

    fn help(&self) -> &'static str {
        "/history [n] - Show the last n messages (default 5)"
    }
}

impl CommandHandler for FormCommand {
    fn execute(&self, state: &mut ChatState, _args: &[&str]) -> Result<Option<String>, AssistError> {
        state.form_requested = true;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/form - Fill in the symptom checker"
    }
}
