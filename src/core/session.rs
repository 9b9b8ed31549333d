//! Conversation session: history, added file context, and turn
//! orchestration.
//!
//! One session drives the full cycle of a turn: build the outgoing message
//! list, stream the completion, validate the structured payload, hold any
//! proposed file operations for confirmation, apply or discard them, and
//! record the outcome in history. A failed turn is discarded wholesale so
//! the replayed history never contains half a turn.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ResponseFormat, MAX_COMPLETION_TOKENS};
use crate::core::chat_stream::{spawn_stream, StreamMessage};
use crate::core::message::{Message, Role};
use crate::core::schema::{self, AssistantResponse, FileToCreate, FileToEdit, SchemaError};
use crate::diff::{self, DiffLine};
use crate::fsops::{self, ApplyOutcome, ApplyStatus};
use crate::providers::ProviderAdapter;
use crate::utils::fs::{normalize_path, read_local_file};

const SYSTEM_PROMPT: &str = include_str!("../system_prompt.md");

/// Extensions that make a whitespace-separated word look like a file
/// reference worth pulling into context automatically.
const RECOGNIZED_EXTENSIONS: &[&str] = &[
    ".css", ".html", ".js", ".ts", ".py", ".json", ".md", ".rs", ".toml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingModel,
    AwaitingConfirmation,
    Applying,
}

/// File content shared with the model, registered by `/add` or by automatic
/// detection of file references. Keyed by normalized path; the latest
/// registration of a path wins.
#[derive(Debug, Clone)]
pub struct AddedFileContext {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone)]
struct PendingOperations {
    files_to_create: Vec<FileToCreate>,
    files_to_edit: Vec<FileToEdit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Edit,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Edit => "edit",
        }
    }
}

/// Preview of one pending operation: the full-file diff, or a note when the
/// diff could not be computed (the apply step will report the same problem).
#[derive(Debug)]
pub struct OperationPreview {
    pub path: String,
    pub kind: OperationKind,
    pub diff: Vec<DiffLine>,
    pub note: Option<String>,
}

/// Result of a successful `send`.
pub enum SendOutcome {
    /// Message-only turn, already recorded in history.
    Completed {
        response: AssistantResponse,
        warning: Option<String>,
    },
    /// File operations are pending user confirmation.
    AwaitingConfirmation {
        response: AssistantResponse,
        warning: Option<String>,
    },
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("{0}")]
    Provider(String),
    #[error("could not parse the model's structured reply: {0}")]
    Schema(#[from] SchemaError),
    #[error("turn cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
#[error("could not read '{path}': {source}")]
pub struct ContextError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

pub struct ConversationSession {
    adapter: Arc<dyn ProviderAdapter>,
    client: reqwest::Client,
    history: Vec<Message>,
    contexts: Vec<AddedFileContext>,
    pending: Option<PendingOperations>,
    state: SessionState,
}

impl ConversationSession {
    pub fn new(adapter: Arc<dyn ProviderAdapter>) -> Self {
        Self {
            adapter,
            client: reqwest::Client::new(),
            history: Vec::new(),
            contexts: Vec::new(),
            pending: None,
            state: SessionState::Idle,
        }
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn contexts(&self) -> &[AddedFileContext] {
        &self.contexts
    }

    /// Register a file's content for the rest of the session. Errors leave
    /// the context set untouched.
    pub fn add_context(&mut self, path: &str) -> Result<String, ContextError> {
        let normalized = normalize_path(path);
        let content = read_local_file(&normalized).map_err(|source| ContextError {
            path: path.to_string(),
            source,
        })?;
        self.insert_context(normalized.clone(), content);
        Ok(normalized)
    }

    fn insert_context(&mut self, path: String, content: String) {
        if let Some(existing) = self.contexts.iter_mut().find(|c| c.path == path) {
            existing.content = content;
        } else {
            self.contexts.push(AddedFileContext { path, content });
        }
    }

    /// Words in the user message that look like file paths are probed and
    /// pulled into context when readable; unreadable guesses are skipped
    /// silently (only an explicit `/add` errors loudly).
    fn scan_for_file_references(&mut self, user_text: &str) {
        for word in user_text.split_whitespace() {
            let candidate = word.trim_matches(['\'', '"', ',', ';', '(', ')']);
            if candidate.is_empty() {
                continue;
            }
            let looks_like_path = candidate.contains('/')
                || RECOGNIZED_EXTENSIONS
                    .iter()
                    .any(|ext| candidate.ends_with(ext));
            if !looks_like_path {
                continue;
            }

            let normalized = normalize_path(candidate);
            if let Ok(content) = read_local_file(&normalized) {
                debug!(path = %normalized, "pulling referenced file into context");
                self.insert_context(normalized, content);
            }
        }
    }

    /// The ordered message list for one request: system prompt, one context
    /// block per added file, the full history, then the new user message.
    fn build_api_messages(&self, user_text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.contexts.len() + self.history.len() + 2);
        messages.push(ChatMessage {
            role: Role::System.as_str().to_string(),
            content: SYSTEM_PROMPT.trim_end().to_string(),
        });
        for ctx in &self.contexts {
            messages.push(ChatMessage {
                role: Role::System.as_str().to_string(),
                content: format!("Content of file '{}':\n\n{}", ctx.path, ctx.content),
            });
        }
        for msg in &self.history {
            messages.push(msg.to_api());
        }
        messages.push(ChatMessage {
            role: Role::User.as_str().to_string(),
            content: user_text.to_string(),
        });
        messages
    }

    /// Run one turn: stream the completion (chunks go to `on_chunk` for
    /// incremental display), validate the payload, and record the turn.
    ///
    /// On any error the turn is discarded: nothing is appended to history
    /// and the session returns to `Idle`, still usable.
    pub async fn send(
        &mut self,
        user_text: &str,
        mut on_chunk: impl FnMut(&str),
    ) -> Result<SendOutcome, SendError> {
        debug_assert_eq!(self.state, SessionState::Idle);
        self.state = SessionState::AwaitingModel;
        self.scan_for_file_references(user_text);

        let request = ChatRequest {
            model: self.adapter.model().to_string(),
            messages: self.build_api_messages(user_text),
            stream: true,
            response_format: ResponseFormat::json_object(),
            max_completion_tokens: Some(MAX_COMPLETION_TOKENS),
        };

        let mut handle = spawn_stream(self.client.clone(), self.adapter.clone(), request);
        let cancel = handle.cancel.clone();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut full_content = String::new();
        let mut stream_error: Option<String> = None;
        loop {
            tokio::select! {
                message = handle.rx.recv() => match message {
                    Some(StreamMessage::Chunk(content)) => {
                        on_chunk(&content);
                        full_content.push_str(&content);
                    }
                    Some(StreamMessage::Error(err)) => stream_error = Some(err),
                    Some(StreamMessage::End) | None => break,
                },
                _ = &mut ctrl_c => {
                    cancel.cancel();
                    self.state = SessionState::Idle;
                    return Err(SendError::Cancelled);
                }
            }
        }

        if let Some(err) = stream_error {
            self.state = SessionState::Idle;
            return Err(SendError::Provider(err));
        }

        let (response, warning) = match self.parse_payload(&full_content) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };

        self.history.push(Message::user(user_text));
        self.history.push(Message::assistant(response.message.clone()));

        if response.has_file_operations() {
            self.pending = Some(PendingOperations {
                files_to_create: response.files_to_create.clone(),
                files_to_edit: response.files_to_edit.clone(),
            });
            self.state = SessionState::AwaitingConfirmation;
            Ok(SendOutcome::AwaitingConfirmation { response, warning })
        } else {
            self.state = SessionState::Idle;
            Ok(SendOutcome::Completed { response, warning })
        }
    }

    /// Turn the raw streamed body into a typed response, falling back to a
    /// message-only turn whenever the reply text is salvageable.
    fn parse_payload(&self, raw: &str) -> Result<(AssistantResponse, Option<String>), SendError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SendError::Provider(
                "provider returned an empty response".to_string(),
            ));
        }

        let value: serde_json::Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                return Ok((
                    AssistantResponse::message_only(trimmed),
                    Some(
                        "response was not structured JSON; file operations unavailable this turn"
                            .to_string(),
                    ),
                ));
            }
        };

        match schema::validate(value.clone()) {
            Ok(response) => Ok((response, None)),
            Err(err) => match schema::salvage_message(&value) {
                Some(message) => Ok((
                    AssistantResponse::message_only(message),
                    Some(format!(
                        "structured payload invalid ({err}); kept the reply text only"
                    )),
                )),
                None => Err(SendError::Schema(err)),
            },
        }
    }

    /// Full-file diff previews for the pending operations, creates first.
    /// An edit on a path created in the same turn previews against the new
    /// create content, matching the apply order.
    pub fn preview_pending(&self) -> Vec<OperationPreview> {
        let Some(pending) = &self.pending else {
            return Vec::new();
        };

        let mut previews = Vec::new();

        for op in &pending.files_to_create {
            let before = std::fs::read_to_string(&op.path).unwrap_or_default();
            previews.push(OperationPreview {
                path: op.path.clone(),
                kind: OperationKind::Create,
                diff: diff::render(&before, &op.content),
                note: None,
            });
        }

        for op in &pending.files_to_edit {
            let before = pending
                .files_to_create
                .iter()
                .rev()
                .find(|c| c.path == op.path)
                .map(|c| Ok(c.content.clone()))
                .unwrap_or_else(|| read_local_file(&op.path));

            let preview = match before {
                Ok(before) => match fsops::edited_content(&before, op) {
                    Ok(after) => OperationPreview {
                        path: op.path.clone(),
                        kind: OperationKind::Edit,
                        diff: diff::render(&before, &after),
                        note: None,
                    },
                    Err(e) => OperationPreview {
                        path: op.path.clone(),
                        kind: OperationKind::Edit,
                        diff: Vec::new(),
                        note: Some(e.to_string()),
                    },
                },
                Err(e) => OperationPreview {
                    path: op.path.clone(),
                    kind: OperationKind::Edit,
                    diff: Vec::new(),
                    note: Some(format!("cannot read '{}': {e}", op.path)),
                },
            };
            previews.push(preview);
        }

        previews
    }

    /// Apply the pending operations: creates before edits, each in listed
    /// order, every file's result independent. An edit whose same-path
    /// create failed this turn is skipped rather than applied against stale
    /// content. Appends a summary entry to history and returns to `Idle`.
    pub fn apply_pending(&mut self) -> Vec<ApplyOutcome> {
        let Some(pending) = self.pending.take() else {
            return Vec::new();
        };
        self.state = SessionState::Applying;

        let mut outcomes = Vec::new();
        let mut failed_creates: HashSet<&str> = HashSet::new();

        for op in &pending.files_to_create {
            let outcome = fsops::apply_create(op);
            match outcome.status {
                ApplyStatus::Applied => {
                    self.insert_context(normalize_path(&op.path), op.content.clone());
                }
                _ => {
                    failed_creates.insert(op.path.as_str());
                }
            }
            outcomes.push(outcome);
        }

        for op in &pending.files_to_edit {
            if failed_creates.contains(op.path.as_str()) {
                outcomes.push(ApplyOutcome::skipped(
                    &op.path,
                    "create for this path failed; edit not attempted",
                ));
                continue;
            }

            let outcome = fsops::apply_edit(op);
            if outcome.status == ApplyStatus::Applied {
                if let Ok(content) = read_local_file(&op.path) {
                    self.insert_context(normalize_path(&op.path), content);
                }
            }
            outcomes.push(outcome);
        }

        self.history
            .push(Message::assistant(summarize_outcomes(&outcomes)));
        self.state = SessionState::Idle;
        outcomes
    }

    /// Drop the pending operations, keeping the reply text in history.
    /// Returns how many operations were discarded.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self
            .pending
            .take()
            .map(|p| p.files_to_create.len() + p.files_to_edit.len())
            .unwrap_or(0);
        self.state = SessionState::Idle;
        dropped
    }
}

fn summarize_outcomes(outcomes: &[ApplyOutcome]) -> String {
    let mut lines = vec!["File operation results:".to_string()];
    for outcome in outcomes {
        lines.push(format!(
            "- {}: {} ({})",
            outcome.path,
            outcome.status.as_str(),
            outcome.detail
        ));
    }
    lines.join("\n")
}
