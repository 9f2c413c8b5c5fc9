use super::{
    ChatState,
    handler::{FormCommand, HelpCommand, HistoryCommand, ModelCommand, QuitCommand},
    registry::CommandRegistry,
};
use crate::core::error::AssistError;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Run a `/command arg...` line.
    pub fn execute_line(
        &self,
        line: &str,
        state: &mut ChatState,
    ) -> Result<Option<String>, AssistError> {
        let line = line.strip_prefix('/').unwrap_or(line);
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.split_first() {
            Some((command, args)) => self.registry.execute(command, args, state),
            None => Ok(None),
        }
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("quit", QuitCommand);
    registry.register("model", ModelCommand);
    registry.register("history", HistoryCommand);
    registry.register("form", FormCommand);
    // Registered last so it can list everything else.
    let help = HelpCommand::new(&registry);
    registry.register("help", help);

    CommandDispatcher::new(Arc::new(registry))
}
