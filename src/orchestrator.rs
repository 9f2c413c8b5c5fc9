//! Per-message response flow.
//!
//! Every inbound message is appended to the session, classified, and answered along one of
//! three paths: the structured two-pass pipeline, the free-text path, or the document upload
//! path. Generation and file failures become apology messages; only runtime I/O failures
//! propagate to the caller.

use crate::core::error::{AssistError, ErrorKind};
use crate::extract::{self, StructuredSubmission};
use crate::prompt;
use crate::providers::{GenerationOptions, LLMProvider};
use crate::session::{ConversationSession, Turn};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// How free-text answers are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Streaming,
    SingleShot,
}

/// What the runtime should ask the user for when a document is requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    pub prompt: String,
    pub accepted_extensions: Vec<String>,
    pub max_size_bytes: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub path: PathBuf,
}

/// Outbound side of the hosting chat UI.
///
/// Futures are not required to be `Send`: a runtime drives one session on one task.
#[async_trait(?Send)]
pub trait ChatRuntime {
    /// Deliver one complete assistant message.
    async fn send(&mut self, text: &str) -> Result<(), AssistError>;

    /// Append a fragment to the message currently being streamed.
    async fn stream_token(&mut self, fragment: &str) -> Result<(), AssistError>;

    /// Close the message currently being streamed.
    async fn end_stream(&mut self) -> Result<(), AssistError>;

    /// Replace the content of the most recently streamed message.
    async fn update(&mut self, text: &str) -> Result<(), AssistError>;

    /// Ask the user for a document. `Ok(None)` means nothing was provided.
    async fn request_file(
        &mut self,
        request: &FileRequest,
    ) -> Result<Option<UploadedFile>, AssistError>;
}

/// A failed response, and whether part of it already reached the user.
struct Failure {
    error: AssistError,
    partial_shown: bool,
}

impl From<AssistError> for Failure {
    fn from(error: AssistError) -> Self {
        Self {
            error,
            partial_shown: false,
        }
    }
}

enum Inbound {
    Upload,
    Structured(StructuredSubmission),
    FreeText,
}

fn classify(message: &str) -> Inbound {
    if message.trim().eq_ignore_ascii_case(prompt::UPLOAD_COMMAND) {
        Inbound::Upload
    } else if extract::is_structured(message) {
        Inbound::Structured(extract::extract(message))
    } else {
        Inbound::FreeText
    }
}

pub struct ResponseOrchestrator {
    provider: Box<dyn LLMProvider>,
    mode: ResponseMode,
    history_window: usize,
    max_upload_bytes: u64,
}

impl ResponseOrchestrator {
    pub fn new(
        provider: Box<dyn LLMProvider>,
        mode: ResponseMode,
        history_window: usize,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            provider,
            mode,
            history_window,
            max_upload_bytes,
        }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn set_model(&mut self, model: &str) {
        self.provider.set_model(model);
    }

    /// Greet a new session. The welcome text is the first assistant turn.
    pub async fn start_session<R: ChatRuntime + ?Sized>(
        &self,
        runtime: &mut R,
    ) -> Result<ConversationSession, AssistError> {
        info!(model = %self.model(), "new chat session started");
        let mut session = ConversationSession::new();

        runtime.send(prompt::WELCOME_MESSAGE).await?;
        session.append(Turn::assistant(prompt::WELCOME_MESSAGE));

        runtime.send(prompt::SYMPTOM_CHECKER_INTRO).await?;
        runtime.send(prompt::UPLOAD_HINT).await?;
        Ok(session)
    }

    pub async fn handle_message<R: ChatRuntime + ?Sized>(
        &self,
        session: &mut ConversationSession,
        runtime: &mut R,
        message: &str,
    ) -> Result<(), AssistError> {
        info!(preview = %preview(message), "received user message");
        session.append(Turn::user(message));

        match classify(message) {
            Inbound::Upload => self.respond_upload(session, runtime).await,
            Inbound::Structured(submission) => {
                self.respond_structured(session, runtime, &submission).await
            }
            Inbound::FreeText => self.respond_free_text(session, runtime, message).await,
        }
    }

    async fn respond_structured<R: ChatRuntime + ?Sized>(
        &self,
        session: &mut ConversationSession,
        runtime: &mut R,
        submission: &StructuredSubmission,
    ) -> Result<(), AssistError> {
        debug!(symptoms = submission.symptoms.len(), "structured submission");
        runtime.send(prompt::STRUCTURED_ACK).await?;
        runtime.send(prompt::STRUCTURED_PROGRESS).await?;

        let result = async {
            let draft = self
                .provider
                .get_response(&prompt::structured(submission), &GenerationOptions::draft())
                .await?;
            self.provider
                .get_response(&prompt::rewrite(&draft), &GenerationOptions::rewrite())
                .await
        }
        .await;

        match result {
            Ok(text) => {
                runtime.send(&text).await?;
                session.append(Turn::assistant(text));
                Ok(())
            }
            Err(err) => self.recover(session, runtime, err.into()).await,
        }
    }

    async fn respond_free_text<R: ChatRuntime + ?Sized>(
        &self,
        session: &mut ConversationSession,
        runtime: &mut R,
        message: &str,
    ) -> Result<(), AssistError> {
        let history = session.render_recent(self.history_window);
        let full_prompt = prompt::free_text(&history, message);
        debug!(model = %self.model(), mode = ?self.mode, "calling generation API");

        let result = match self.mode {
            ResponseMode::Streaming => {
                self.stream_to(runtime, &full_prompt, &GenerationOptions::streaming())
                    .await
            }
            ResponseMode::SingleShot => {
                match self
                    .provider
                    .get_response(&full_prompt, &GenerationOptions::single_shot())
                    .await
                {
                    Ok(text) => runtime.send(&text).await.map(|_| text).map_err(Failure::from),
                    Err(err) => Err(err.into()),
                }
            }
        };

        match result {
            Ok(text) => {
                session.append(Turn::assistant(text));
                info!("response sent to user");
                Ok(())
            }
            Err(failure) => self.recover(session, runtime, failure).await,
        }
    }

    async fn respond_upload<R: ChatRuntime + ?Sized>(
        &self,
        session: &mut ConversationSession,
        runtime: &mut R,
    ) -> Result<(), AssistError> {
        let request = FileRequest {
            prompt: prompt::UPLOAD_REQUEST.to_string(),
            accepted_extensions: vec!["txt".to_string()],
            max_size_bytes: self.max_upload_bytes,
            max_files: 1,
        };

        let file = match runtime.request_file(&request).await {
            Ok(Some(file)) => file,
            Ok(None) => {
                info!("file request cancelled");
                return Ok(());
            }
            Err(err) => return self.recover(session, runtime, err.into()).await,
        };

        let content = match read_document(&file, self.max_upload_bytes).await {
            Ok(content) => content,
            Err(err) => return self.recover(session, runtime, err.into()).await,
        };

        let ack = prompt::upload_ack(&file.name, content.chars().count());
        runtime.send(&ack).await?;
        session.append(Turn::assistant(ack));

        // Document analysis is always streamed, whatever the free-text mode.
        match self
            .stream_to(
                runtime,
                &prompt::document_analysis(&content),
                &GenerationOptions::streaming(),
            )
            .await
        {
            Ok(text) => {
                session.append(Turn::assistant(text));
                Ok(())
            }
            Err(failure) => self.recover(session, runtime, failure).await,
        }
    }

    /// Forward fragments as they arrive and return their concatenation.
    async fn stream_to<R: ChatRuntime + ?Sized>(
        &self,
        runtime: &mut R,
        full_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, Failure> {
        let mut stream = self.provider.get_response_stream(full_prompt, options).await?;

        let mut full_response = String::new();
        let mut outcome = Ok(());
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(fragment) if fragment.is_empty() => {}
                Ok(fragment) => {
                    if let Err(err) = runtime.stream_token(&fragment).await {
                        outcome = Err(err);
                        break;
                    }
                    full_response.push_str(&fragment);
                }
                Err(err) => {
                    outcome = Err(err);
                    break;
                }
            }
        }

        runtime.end_stream().await?;
        let partial_shown = !full_response.is_empty();
        outcome
            .map(|_| full_response)
            .map_err(|error| Failure {
                error,
                partial_shown,
            })
    }

    /// Turn a recoverable failure into an assistant apology; propagate the rest.
    ///
    /// A partially streamed answer is replaced by the apology, so what the user ends up seeing
    /// is what the session records.
    async fn recover<R: ChatRuntime + ?Sized>(
        &self,
        session: &mut ConversationSession,
        runtime: &mut R,
        failure: Failure,
    ) -> Result<(), AssistError> {
        let err = failure.error;
        let apology = match err.kind() {
            ErrorKind::Generation => {
                error!(error = %err, "error generating response");
                prompt::generation_apology(&err.to_string())
            }
            ErrorKind::FileProcessing => {
                warn!(error = %err, "could not process uploaded file");
                prompt::file_apology(&err.to_string())
            }
            ErrorKind::Configuration | ErrorKind::Runtime => return Err(err),
        };

        if failure.partial_shown {
            runtime.update(&apology).await?;
        } else {
            runtime.send(&apology).await?;
        }
        session.append(Turn::assistant(apology));
        Ok(())
    }
}

async fn read_document(file: &UploadedFile, max_bytes: u64) -> Result<String, AssistError> {
    let metadata = tokio::fs::metadata(&file.path)
        .await
        .map_err(|e| AssistError::FileProcessing(format!("{}: {}", file.name, e)))?;
    if metadata.len() > max_bytes {
        return Err(AssistError::FileProcessing(format!(
            "{} is {} bytes, the limit is {} bytes",
            file.name,
            metadata.len(),
            max_bytes
        )));
    }

    tokio::fs::read_to_string(&file.path)
        .await
        .map_err(|e| AssistError::FileProcessing(format!("{}: {}", file.name, e)))
}

fn preview(message: &str) -> String {
    let mut preview: String = message.chars().take(30).collect();
    if preview.len() < message.len() {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::TextStream;
    use crate::session::Role;
    use futures::stream;
    use std::collections::VecDeque;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    enum Reply {
        Text(String),
        Fail(String),
        Chunks(Vec<Result<String, String>>),
    }

    /// Provider that replays scripted replies and records every prompt it is given.
    #[derive(Clone)]
    struct ScriptedProvider {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        calls: Arc<Mutex<Vec<(String, GenerationOptions)>>>,
        model: String,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                calls: Arc::new(Mutex::new(Vec::new())),
                model: "test-model".to_string(),
            }
        }

        fn calls(&self) -> Vec<(String, GenerationOptions)> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, prompt: &str, options: &GenerationOptions) -> Reply {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), *options));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected generation call")
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn get_response(
            &self,
            prompt: &str,
            options: &GenerationOptions,
        ) -> Result<String, AssistError> {
            match self.next(prompt, options) {
                Reply::Text(text) => Ok(text),
                Reply::Fail(msg) => Err(AssistError::Api(msg)),
                Reply::Chunks(_) => panic!("scripted a stream for a single-shot call"),
            }
        }

        async fn get_response_stream(
            &self,
            prompt: &str,
            options: &GenerationOptions,
        ) -> Result<TextStream, AssistError> {
            match self.next(prompt, options) {
                Reply::Chunks(chunks) => Ok(stream::iter(
                    chunks
                        .into_iter()
                        .map(|c| c.map_err(AssistError::Network)),
                )
                .boxed()),
                Reply::Fail(msg) => Err(AssistError::Network(msg)),
                Reply::Text(_) => panic!("scripted a single-shot reply for a stream"),
            }
        }

        fn model(&self) -> &str {
            &self.model
        }

        fn set_model(&mut self, model: &str) {
            self.model = model.to_string();
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Sent(String),
        Token(String),
        EndStream,
        Updated(String),
    }

    #[derive(Default)]
    struct RecordingRuntime {
        events: Vec<Event>,
        file: Option<UploadedFile>,
        requests: Vec<FileRequest>,
    }

    impl RecordingRuntime {
        fn sent(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Sent(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn streamed(&self) -> String {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Token(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait(?Send)]
    impl ChatRuntime for RecordingRuntime {
        async fn send(&mut self, text: &str) -> Result<(), AssistError> {
            self.events.push(Event::Sent(text.to_string()));
            Ok(())
        }

        async fn stream_token(&mut self, fragment: &str) -> Result<(), AssistError> {
            self.events.push(Event::Token(fragment.to_string()));
            Ok(())
        }

        async fn end_stream(&mut self) -> Result<(), AssistError> {
            self.events.push(Event::EndStream);
            Ok(())
        }

        async fn update(&mut self, text: &str) -> Result<(), AssistError> {
            self.events.push(Event::Updated(text.to_string()));
            Ok(())
        }

        async fn request_file(
            &mut self,
            request: &FileRequest,
        ) -> Result<Option<UploadedFile>, AssistError> {
            self.requests.push(request.clone());
            Ok(self.file.take())
        }
    }

    fn orchestrator(provider: &ScriptedProvider, mode: ResponseMode) -> ResponseOrchestrator {
        ResponseOrchestrator::new(Box::new(provider.clone()), mode, 5, 2 * 1024 * 1024)
    }

    const FORM: &str = "I'm experiencing the following symptoms: cramps, bloating\n\nAge: 29\nHeight: 165cm\nWeight: 60kg\nLast period date: 2024-05-01\n\nAdditional information: none";

    #[tokio::test]
    async fn session_start_records_welcome_as_first_turn() {
        let provider = ScriptedProvider::new(vec![]);
        let mut runtime = RecordingRuntime::default();
        let session = orchestrator(&provider, ResponseMode::Streaming)
            .start_session(&mut runtime)
            .await
            .unwrap();

        assert_eq!(session.len(), 1);
        assert_eq!(session.recent(1)[0].content(), prompt::WELCOME_MESSAGE);
        assert_eq!(runtime.sent().len(), 3);
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn structured_submission_runs_two_sequential_passes() {
        let provider = ScriptedProvider::new(vec![
            Reply::Text("clinical draft".into()),
            Reply::Text("gentle final answer".into()),
        ]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, FORM)
            .await
            .unwrap();

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].0.contains("Symptoms: cramps, bloating"));
        assert!(calls[0].0.contains("Last menstrual period: 2024-05-01"));
        assert_eq!(calls[0].1, GenerationOptions::draft());
        assert!(calls[1].0.starts_with("clinical draft"));
        assert_eq!(calls[1].1, GenerationOptions::rewrite());

        assert_eq!(
            runtime.sent(),
            vec![
                prompt::STRUCTURED_ACK,
                prompt::STRUCTURED_PROGRESS,
                "gentle final answer"
            ]
        );
        assert_eq!(session.len(), 2);
        assert_eq!(session.recent(2)[0].role(), Role::User);
        assert_eq!(session.recent(1)[0].content(), "gentle final answer");
    }

    #[tokio::test]
    async fn failed_first_pass_skips_the_rewrite() {
        let provider = ScriptedProvider::new(vec![Reply::Fail("boom".into())]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, FORM)
            .await
            .unwrap();

        assert_eq!(provider.calls().len(), 1);
        assert_eq!(
            session.recent(1)[0].content(),
            "Sorry, I encountered an error: API error: boom"
        );
    }

    #[tokio::test]
    async fn streamed_fragments_equal_recorded_turn() {
        let provider = ScriptedProvider::new(vec![Reply::Chunks(vec![
            Ok("Cramps are ".into()),
            Ok(String::new()),
            Ok("common.".into()),
        ])]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, "Why do I get cramps?")
            .await
            .unwrap();

        assert_eq!(runtime.streamed(), "Cramps are common.");
        assert_eq!(runtime.events.last(), Some(&Event::EndStream));
        assert_eq!(session.recent(1)[0].content(), runtime.streamed());
        assert_eq!(provider.calls()[0].1, GenerationOptions::streaming());
    }

    #[tokio::test]
    async fn free_text_prompt_includes_recent_window() {
        let provider = ScriptedProvider::new(vec![Reply::Text("answer".into())]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();
        for i in 0..6 {
            session.append(Turn::assistant(format!("old turn {i}")));
        }

        orchestrator(&provider, ResponseMode::SingleShot)
            .handle_message(&mut session, &mut runtime, "Is spotting normal?")
            .await
            .unwrap();

        let (sent_prompt, options) = &provider.calls()[0];
        assert_eq!(*options, GenerationOptions::single_shot());
        assert!(!sent_prompt.contains("old turn 1"));
        assert!(sent_prompt.contains("old turn 2"));
        assert!(sent_prompt.contains("user: Is spotting normal?"));
        assert!(sent_prompt.contains(prompt::SYSTEM_PROMPT));
        assert_eq!(runtime.sent(), vec!["answer"]);
    }

    #[tokio::test]
    async fn generation_failure_becomes_one_apology_and_session_continues() {
        let provider = ScriptedProvider::new(vec![
            Reply::Fail("connection reset".into()),
            Reply::Chunks(vec![Ok("Back again.".into())]),
        ]);
        let orchestrator = orchestrator(&provider, ResponseMode::Streaming);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator
            .handle_message(&mut session, &mut runtime, "hello")
            .await
            .unwrap();
        assert_eq!(session.len(), 2);
        assert!(
            session.recent(1)[0]
                .content()
                .starts_with("Sorry, I encountered an error: ")
        );

        orchestrator
            .handle_message(&mut session, &mut runtime, "are you there?")
            .await
            .unwrap();
        assert_eq!(session.len(), 4);
        assert_eq!(session.recent(1)[0].content(), "Back again.");
    }

    #[tokio::test]
    async fn failed_rewrite_never_shows_the_draft() {
        let provider = ScriptedProvider::new(vec![
            Reply::Text("clinical draft".into()),
            Reply::Fail("rate limited".into()),
        ]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, FORM)
            .await
            .unwrap();

        assert_eq!(provider.calls().len(), 2);
        let apology = "Sorry, I encountered an error: API error: rate limited";
        assert_eq!(
            runtime.sent(),
            vec![prompt::STRUCTURED_ACK, prompt::STRUCTURED_PROGRESS, apology]
        );
        assert!(session.recent(5).iter().all(|t| t.content() != "clinical draft"));
        assert_eq!(session.len(), 2);
        assert_eq!(session.recent(1)[0].content(), apology);
    }

    #[tokio::test]
    async fn single_shot_failure_sends_one_apology() {
        let provider = ScriptedProvider::new(vec![Reply::Fail("server unavailable".into())]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::SingleShot)
            .handle_message(&mut session, &mut runtime, "Is spotting normal?")
            .await
            .unwrap();

        let apology = "Sorry, I encountered an error: API error: server unavailable";
        assert_eq!(runtime.events, vec![Event::Sent(apology.into())]);
        assert_eq!(session.len(), 2);
        assert_eq!(session.recent(1)[0].content(), apology);
    }

    #[tokio::test]
    async fn mid_stream_failure_replaces_partial_answer() {
        let provider = ScriptedProvider::new(vec![Reply::Chunks(vec![
            Ok("partial".into()),
            Err("stream dropped".into()),
        ])]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, "hello")
            .await
            .unwrap();

        let apology = "Sorry, I encountered an error: Network error: stream dropped";
        assert_eq!(
            runtime.events,
            vec![
                Event::Token("partial".into()),
                Event::EndStream,
                Event::Updated(apology.into()),
            ]
        );
        assert_eq!(session.len(), 2);
        assert_eq!(session.recent(1)[0].content(), apology);
    }

    #[tokio::test]
    async fn failure_before_first_fragment_is_sent_not_updated() {
        let provider = ScriptedProvider::new(vec![Reply::Chunks(vec![Err("reset".into())])]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, "hello")
            .await
            .unwrap();

        assert_eq!(
            runtime.events,
            vec![
                Event::EndStream,
                Event::Sent("Sorry, I encountered an error: Network error: reset".into()),
            ]
        );
    }

    #[tokio::test]
    async fn upload_acknowledges_then_streams_analysis() {
        let mut doc = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(doc, "Ultrasound: small cyst").unwrap();

        let provider = ScriptedProvider::new(vec![Reply::Chunks(vec![
            Ok("The report ".into()),
            Ok("mentions a cyst.".into()),
        ])]);
        let mut runtime = RecordingRuntime {
            file: Some(UploadedFile {
                name: "scan.txt".into(),
                path: doc.path().to_path_buf(),
            }),
            ..Default::default()
        };
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::SingleShot)
            .handle_message(&mut session, &mut runtime, "Upload File")
            .await
            .unwrap();

        assert_eq!(runtime.requests[0].max_size_bytes, 2 * 1024 * 1024);
        assert_eq!(runtime.requests[0].max_files, 1);
        assert_eq!(
            runtime.sent(),
            vec!["I've received your file 'scan.txt'. It contains 22 characters. Let me analyze it."]
        );
        assert!(provider.calls()[0].0.contains("Ultrasound: small cyst"));
        let contents: Vec<&str> = session.recent(3).iter().map(Turn::content).collect();
        assert_eq!(
            contents,
            vec![
                "Upload File",
                "I've received your file 'scan.txt'. It contains 22 characters. Let me analyze it.",
                "The report mentions a cyst."
            ]
        );
    }

    #[tokio::test]
    async fn failed_document_analysis_keeps_ack_and_session_usable() {
        let mut doc = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(doc, "CBC normal").unwrap();

        let provider = ScriptedProvider::new(vec![
            Reply::Fail("quota exceeded".into()),
            Reply::Chunks(vec![Ok("Still here.".into())]),
        ]);
        let orchestrator = orchestrator(&provider, ResponseMode::Streaming);
        let mut runtime = RecordingRuntime {
            file: Some(UploadedFile {
                name: "labs.txt".into(),
                path: doc.path().to_path_buf(),
            }),
            ..Default::default()
        };
        let mut session = ConversationSession::new();

        orchestrator
            .handle_message(&mut session, &mut runtime, "upload file")
            .await
            .unwrap();

        let ack = "I've received your file 'labs.txt'. It contains 10 characters. Let me analyze it.";
        let apology = "Sorry, I encountered an error: Network error: quota exceeded";
        assert_eq!(runtime.sent(), vec![ack, apology]);
        let contents: Vec<&str> = session.recent(2).iter().map(Turn::content).collect();
        assert_eq!(contents, vec![ack, apology]);

        orchestrator
            .handle_message(&mut session, &mut runtime, "thanks")
            .await
            .unwrap();
        assert_eq!(session.len(), 5);
        assert_eq!(session.recent(1)[0].content(), "Still here.");
    }

    #[tokio::test]
    async fn oversized_upload_is_refused_without_generation() {
        let mut doc = tempfile::NamedTempFile::new().unwrap();
        doc.write_all(&[b'a'; 64]).unwrap();

        let provider = ScriptedProvider::new(vec![]);
        let mut runtime = RecordingRuntime {
            file: Some(UploadedFile {
                name: "big.txt".into(),
                path: doc.path().to_path_buf(),
            }),
            ..Default::default()
        };
        let mut session = ConversationSession::new();

        ResponseOrchestrator::new(Box::new(provider.clone()), ResponseMode::Streaming, 5, 16)
            .handle_message(&mut session, &mut runtime, "upload file")
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
        assert_eq!(
            session.recent(1)[0].content(),
            "Sorry, I couldn't process your file: File error: big.txt is 64 bytes, the limit is 16 bytes"
        );
    }

    #[tokio::test]
    async fn cancelled_upload_sends_nothing() {
        let provider = ScriptedProvider::new(vec![]);
        let mut runtime = RecordingRuntime::default();
        let mut session = ConversationSession::new();

        orchestrator(&provider, ResponseMode::Streaming)
            .handle_message(&mut session, &mut runtime, "upload file")
            .await
            .unwrap();

        assert_eq!(runtime.requests.len(), 1);
        assert!(runtime.events.is_empty());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn preview_truncates_long_messages() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(40)), format!("{}...", "x".repeat(30)));
    }
}
