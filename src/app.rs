use crate::cli::Args;
use crate::commands::{ChatState, dispatcher::CommandDispatcher};
use crate::core::error::AssistError;
use crate::display;
use crate::form::{self, SymptomForm};
use crate::input::{self, ChatEditor};
use crate::orchestrator::{ChatRuntime, FileRequest, ResponseOrchestrator, UploadedFile};
use crate::session::ConversationSession;
use async_trait::async_trait;
use is_terminal::IsTerminal;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::info;

pub struct Application {
    pub args: Args,
    pub orchestrator: ResponseOrchestrator,
    pub command_dispatcher: CommandDispatcher,
}

impl Application {
    pub fn new(
        args: Args,
        orchestrator: ResponseOrchestrator,
        command_dispatcher: CommandDispatcher,
    ) -> Self {
        Self {
            args,
            orchestrator,
            command_dispatcher,
        }
    }

    pub async fn run(self) -> Result<(), AssistError> {
        let piped = if !io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| AssistError::Input(format!("Failed to read from stdin: {}", e)))?;
            Some(buffer)
        } else {
            None
        };

        match compose_query(self.args.query.as_deref(), piped.as_deref()) {
            Some(message) => self.handle_single_message(&message).await,
            None if piped.is_some() => Err(AssistError::Input("No query provided".to_string())),
            None => self.handle_interactive_session().await,
        }
    }

    async fn handle_single_message(self, message: &str) -> Result<(), AssistError> {
        let mut runtime = TerminalRuntime::detached();
        let mut session = ConversationSession::new();
        self.orchestrator
            .handle_message(&mut session, &mut runtime, message)
            .await
    }

    async fn handle_interactive_session(self) -> Result<(), AssistError> {
        let editor = input::create_editor(self.command_dispatcher.clone())?;
        let mut runtime = TerminalRuntime::interactive(editor);

        let session = self.orchestrator.start_session(&mut runtime).await?;
        let mut state = ChatState::new(self.orchestrator, session);
        display::display_notice("Type /help for commands. Press Ctrl+D or type /quit to exit.");

        loop {
            let line = match runtime.read_line("> ")? {
                Some(line) => line,
                None => break,
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('/') {
                match self.command_dispatcher.execute_line(line, &mut state) {
                    Ok(Some(output)) => display::display_command_output(&output),
                    Ok(None) => {}
                    Err(e) => display::display_error(&e.to_string()),
                }

                if !state.should_continue {
                    break;
                }
                if state.form_requested {
                    state.form_requested = false;
                    if let Some(symptom_form) = runtime.collect_form()? {
                        let message = symptom_form.render();
                        display::display_notice(&message);
                        state
                            .orchestrator
                            .handle_message(&mut state.session, &mut runtime, &message)
                            .await?;
                    }
                }
                continue;
            }

            state
                .orchestrator
                .handle_message(&mut state.session, &mut runtime, line)
                .await?;
        }

        info!(turns = state.session.len(), "chat session ended");
        println!("Goodbye. Take care!");
        Ok(())
    }
}

/// Piped stdin first, then the positional query, separated by a blank line.
fn compose_query(query: Option<&str>, piped: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = [piped, query]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// `ChatRuntime` over the terminal. Without an editor (piped input) it cannot ask for files.
pub struct TerminalRuntime {
    editor: Option<ChatEditor>,
    streaming: bool,
    ends_with_newline: bool,
}

impl TerminalRuntime {
    pub fn interactive(editor: ChatEditor) -> Self {
        Self {
            editor: Some(editor),
            streaming: false,
            ends_with_newline: true,
        }
    }

    pub fn detached() -> Self {
        Self {
            editor: None,
            streaming: false,
            ends_with_newline: true,
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>, AssistError> {
        match self.editor.as_mut() {
            Some(editor) => input::read_line(editor, prompt),
            None => Ok(None),
        }
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>, AssistError> {
        Ok(self
            .read_line(&format!("{} ", question))?
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty()))
    }

    /// Walk the user through the symptom checker. `None` when no symptom was given.
    fn collect_form(&mut self) -> Result<Option<SymptomForm>, AssistError> {
        println!("{}", form::catalog_listing());
        display::display_notice(
            "Enter symptoms as codes (e.g. 2.3) or in your own words, separated by commas.",
        );

        let symptoms = self
            .ask("Symptoms:")?
            .map(|answer| SymptomForm::parse_symptoms(&answer))
            .unwrap_or_default();
        if symptoms.is_empty() {
            display::display_notice("No symptoms selected, form discarded.");
            return Ok(None);
        }

        let symptom_form = SymptomForm {
            symptoms,
            age: self.ask("Age:")?,
            height: self.ask("Height:")?,
            weight: self.ask("Weight:")?,
            last_period: self.ask("Last period date:")?,
            additional_info: self.ask("Additional information:")?,
        };
        Ok(Some(symptom_form))
    }
}

fn validate_upload(raw_path: &str, request: &FileRequest) -> Result<UploadedFile, AssistError> {
    let path = PathBuf::from(raw_path.trim().trim_matches(|c: char| c == '"' || c == '\''));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw_path.to_string());

    let metadata = std::fs::metadata(&path)
        .map_err(|e| AssistError::FileProcessing(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(AssistError::FileProcessing(format!(
            "{} is not a file",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !request
        .accepted_extensions
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(&extension))
    {
        return Err(AssistError::FileProcessing(format!(
            "Only {} files are accepted",
            request
                .accepted_extensions
                .iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    if metadata.len() > request.max_size_bytes {
        return Err(AssistError::FileProcessing(format!(
            "{} exceeds the {} MB limit",
            name,
            request.max_size_bytes / (1024 * 1024)
        )));
    }

    Ok(UploadedFile { name, path })
}

#[async_trait(?Send)]
impl ChatRuntime for TerminalRuntime {
    async fn send(&mut self, text: &str) -> Result<(), AssistError> {
        display::display_message(text);
        Ok(())
    }

    async fn stream_token(&mut self, fragment: &str) -> Result<(), AssistError> {
        if !self.streaming {
            display::display_assistant_label();
            self.streaming = true;
        }
        let mut stdout = io::stdout();
        write!(stdout, "{}", fragment)?;
        stdout.flush()?;
        self.ends_with_newline = fragment.ends_with('\n');
        Ok(())
    }

    async fn end_stream(&mut self) -> Result<(), AssistError> {
        if self.streaming && !self.ends_with_newline {
            println!();
        }
        self.streaming = false;
        self.ends_with_newline = true;
        Ok(())
    }

    /// Printed text cannot be taken back, so the partial answer is marked and the replacement
    /// printed in its place.
    async fn update(&mut self, text: &str) -> Result<(), AssistError> {
        display::display_notice("(the answer above was interrupted and has been discarded)");
        display::display_message(text);
        Ok(())
    }

    async fn request_file(
        &mut self,
        request: &FileRequest,
    ) -> Result<Option<UploadedFile>, AssistError> {
        if request.max_files == 0 {
            return Ok(None);
        }
        if self.editor.is_none() {
            return Err(AssistError::FileProcessing(
                "File upload needs an interactive terminal".to_string(),
            ));
        }

        display::display_message(&request.prompt);
        match self.ask("File path (leave empty to cancel):")? {
            Some(raw_path) => validate_upload(&raw_path, request).map(Some),
            None => Ok(None),
        }
    }
}
