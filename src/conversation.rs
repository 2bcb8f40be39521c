//! Conversation state and the submit lifecycle.
//!
//! One [`ConversationController`] owns one [`ConversationState`]. A turn is
//! accepted by [`ConversationController::begin_turn`], which appends the user
//! message and marks the conversation loading, and is finished by
//! [`ConversationController::complete_turn`], which appends exactly one
//! assistant message and clears the loading flag. History is append-only.

use crate::api::{AskRequest, AskResponse, PrimarySource, QaClient};
use crate::error::ApiError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Outcome of one request, as delivered back to the controller
pub type TurnOutcome = Result<AskResponse, ApiError>;

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation history
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Utc>,
    pub primary_source: Option<PrimarySource>,
    pub is_out_of_scope: Option<bool>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content,
            role,
            timestamp: Utc::now(),
            primary_source: None,
            is_out_of_scope: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Assistant message built from a successful answer
    pub fn answer(response: AskResponse) -> Self {
        Self {
            primary_source: response.primary_source,
            is_out_of_scope: response.is_out_of_scope,
            ..Self::assistant(response.answer)
        }
    }

    pub fn is_out_of_scope(&self) -> bool {
        self.is_out_of_scope == Some(true)
    }
}

/// Everything the panel renders from
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    history: Vec<Message>,
    pending_input: String,
    is_loading: bool,
    last_error: Option<String>,
}

impl ConversationState {
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

pub struct ConversationController {
    state: ConversationState,
    client: QaClient,
}

impl ConversationController {
    pub fn new(client: QaClient) -> Self {
        Self {
            state: ConversationState::default(),
            client,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn client(&self) -> &QaClient {
        &self.client
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
    }

    /// Run one full turn. Returns `false` when the submission was rejected.
    pub async fn submit(&mut self, text: &str) -> bool {
        let Some(request) = self.begin_turn(text) else {
            return false;
        };

        let outcome = self.client.ask(&request).await;
        self.complete_turn(outcome);
        true
    }

    /// Accept a submission and return the request to send.
    ///
    /// Blank text, or any text while a turn is in flight, is rejected without
    /// touching the state.
    pub fn begin_turn(&mut self, text: &str) -> Option<AskRequest> {
        if text.trim().is_empty() {
            tracing::debug!("ignoring blank submission");
            return None;
        }
        if self.state.is_loading {
            tracing::debug!("ignoring submission while a request is in flight");
            return None;
        }

        self.state.history.push(Message::user(text));
        self.state.pending_input.clear();
        self.state.is_loading = true;
        self.state.last_error = None;

        tracing::info!(query_len = text.len(), "turn started");
        Some(AskRequest::new(text))
    }

    /// Fold the outcome of the in-flight request into the history.
    pub fn complete_turn(&mut self, outcome: TurnOutcome) {
        if !self.state.is_loading {
            tracing::warn!("turn outcome arrived with no request in flight; dropped");
            return;
        }

        match outcome {
            Ok(response) => {
                if let Some(query_time) = response.query_time {
                    tracing::debug!(query_time, "answer received");
                }
                self.state.history.push(Message::answer(response));
                self.state.last_error = None;
            }
            Err(err) => {
                let text = err.to_string();
                tracing::error!(status = ?err.status(), error = ?err, "turn failed: {}", text);
                self.state.history.push(Message::assistant(text.clone()));
                self.state.last_error = Some(text);
            }
        }

        self.state.is_loading = false;
    }
}
