use crate::conversation::{ConversationController, TurnOutcome};
use crate::error::ApiError;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, SlashCommand,
};
use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use tokio::sync::oneshot;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Close,
    Exit,
}

/// Connects the composer and history view to the controller.
///
/// The request for an accepted turn runs on a spawned task; its outcome comes
/// back through a oneshot channel drained by [`ConversationManager::poll_turn`].
pub struct ConversationManager {
    controller: ConversationController,
    composer: ConversationComposer,
    show_timestamps: bool,
    notice: Option<String>,
    in_flight: Option<oneshot::Receiver<TurnOutcome>>,
}

impl ConversationManager {
    pub fn new(controller: ConversationController, show_timestamps: bool) -> Self {
        Self {
            controller,
            composer: ConversationComposer::new(),
            show_timestamps,
            notice: None,
            in_flight: None,
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        let action = match self.composer.handle_key(key) {
            ComposerResult::Submitted(text) => {
                self.submit(&text);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::Dismissed => ConversationAction::Close,
            ComposerResult::None => ConversationAction::None,
        };

        self.controller.set_pending_input(self.composer.content());
        action
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.paste(text);
        self.controller.set_pending_input(self.composer.content());
    }

    /// Start a turn on a background task if the controller accepts it
    fn submit(&mut self, text: &str) {
        let Some(request) = self.controller.begin_turn(text) else {
            return;
        };

        self.composer.clear();
        self.composer.set_disabled(true);
        self.notice = None;

        let client = self.controller.client().clone();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let outcome = client.ask(&request).await;
            let _ = tx.send(outcome);
        });
        self.in_flight = Some(rx);
    }

    /// Deliver a finished request to the controller (called from the main loop)
    pub fn poll_turn(&mut self) {
        let Some(rx) = self.in_flight.as_mut() else {
            return;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                tracing::error!("request task ended without an outcome");
                Err(ApiError::NoResponse)
            }
        };

        self.in_flight = None;
        self.controller.complete_turn(outcome);
        self.composer.set_disabled(false);
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.composer.set_focus(has_focus);
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Close => ConversationAction::Close,
            SlashCommand::Bye => ConversationAction::Exit,
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
        }
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // History
                Constraint::Length(1), // Notice
                Constraint::Length(3), // Composer
            ])
            .split(area);

        let state = self.controller.state();
        ConversationHistory::new(state.history(), state.is_loading())
            .show_timestamps(self.show_timestamps)
            .render(chunks[0], buf);

        // The help notice takes the row over the last turn's error
        let banner = match (&self.notice, state.last_error()) {
            (Some(notice), _) => Some(Span::styled(notice.clone(), Style::default().fg(Color::Yellow))),
            (None, Some(error)) => Some(Span::styled(format!("⚠ {error}"), Style::default().fg(Color::Red))),
            (None, None) => None,
        };
        if let Some(span) = banner {
            buf.set_line(chunks[1].x, chunks[1].y, &Line::from(span), chunks[1].width);
        }

        (&self.composer).render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::ScriptedTransport;
    use crate::api::QaClient;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::time::Duration;

    fn manager() -> (ConversationManager, std::sync::Arc<ScriptedTransport>) {
        let transport = ScriptedTransport::new();
        let controller = ConversationController::new(QaClient::new(transport.clone()));
        (ConversationManager::new(controller, false), transport)
    }

    fn type_and_submit(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    async fn settle(manager: &mut ConversationManager) {
        for _ in 0..100 {
            manager.poll_turn();
            if !manager.controller().state().is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("turn never completed");
    }

    #[tokio::test]
    async fn typed_question_runs_one_turn() {
        let (mut manager, transport) = manager();
        transport.push_reply(200, r#"{"answer": "A node is a process."}"#);

        assert_eq!(type_and_submit(&mut manager, "What is a node?"), ConversationAction::None);
        assert!(manager.controller().state().is_loading());
        assert_eq!(manager.controller().state().pending_input(), "");

        settle(&mut manager).await;

        let history = manager.controller().state().history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "A node is a process.");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn input_is_locked_while_loading() {
        let (mut manager, transport) = manager();
        transport.push_reply(200, r#"{"answer": "first"}"#);

        type_and_submit(&mut manager, "first");
        type_and_submit(&mut manager, "second");
        settle(&mut manager).await;

        assert_eq!(manager.controller().state().history().len(), 2);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn pending_input_mirrors_composer() {
        let (mut manager, _transport) = manager();
        for c in "draft".chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!(manager.controller().state().pending_input(), "draft");
    }

    #[tokio::test]
    async fn slash_commands_stay_local() {
        let (mut manager, transport) = manager();

        assert_eq!(type_and_submit(&mut manager, "/close"), ConversationAction::Close);
        assert_eq!(type_and_submit(&mut manager, "/q"), ConversationAction::Exit);
        assert_eq!(type_and_submit(&mut manager, "/help"), ConversationAction::None);

        assert!(manager.notice.is_some());
        assert!(manager.controller().state().history().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn dropped_task_still_finishes_the_turn() {
        let (mut manager, _transport) = manager();
        manager.controller.begin_turn("q");
        let (tx, rx) = oneshot::channel::<TurnOutcome>();
        drop(tx);
        manager.in_flight = Some(rx);

        manager.poll_turn();

        let state = manager.controller().state();
        assert!(!state.is_loading());
        assert_eq!(state.history().len(), 2);
        assert_eq!(state.last_error(), Some("Failed to get response. Please try again."));
    }
}
