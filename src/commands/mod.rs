pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::orchestrator::ResponseOrchestrator;
use crate::session::ConversationSession;
pub use dispatcher::create_command_registry;

/// Everything a slash command may look at or change during an interactive session.
pub struct ChatState {
    pub orchestrator: ResponseOrchestrator,
    pub session: ConversationSession,
    pub should_continue: bool,
    pub form_requested: bool,
}

impl ChatState {
    pub fn new(orchestrator: ResponseOrchestrator, session: ConversationSession) -> Self {
        Self {
            orchestrator,
            session,
            should_continue: true,
            form_requested: false,
        }
    }
}
