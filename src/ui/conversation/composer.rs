use crate::ui::conversation::commands::{command_entries, parse_slash_command, CommandEntry, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

pub const PLACEHOLDER: &str = "Ask a question about robotics, ROS 2, or AI...";

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    /// Esc with nothing else to dismiss
    Dismissed,
    None,
}

/// Single-line question input with a slash-command palette.
///
/// The composer never clears itself on submit; the caller clears it once the
/// submission has been accepted.
#[derive(Debug, Clone)]
pub struct ConversationComposer {
    content: String,
    /// Cursor position in chars, not bytes
    cursor: usize,
    has_focus: bool,
    disabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    selected_command: Option<usize>,
}

impl Default for ConversationComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            has_focus: true,
            disabled: false,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Esc => {
                if self.palette_open() {
                    self.close_command_palette();
                    return ComposerResult::None;
                }
                return ComposerResult::Dismissed;
            }
            _ if self.disabled => {}
            KeyCode::Tab if self.palette_open() => self.apply_selected_command(),
            KeyCode::Enter => {
                if self.palette_open() {
                    self.apply_selected_command();
                }
                if self.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                return match parse_slash_command(&self.content) {
                    Some(command) => {
                        self.clear();
                        ComposerResult::Command(command)
                    }
                    None => ComposerResult::Submitted(self.content.clone()),
                };
            }
            KeyCode::Up if self.palette_open() => self.move_command_selection(-1),
            KeyCode::Down if self.palette_open() => self.move_command_selection(1),
            KeyCode::Char(c) => {
                self.insert_char(c);
                self.sync_palette();
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = self.byte_offset(self.cursor);
                    self.content.remove(at);
                    self.sync_palette();
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.char_len() {
                    let at = self.byte_offset(self.cursor);
                    self.content.remove(at);
                    self.sync_palette();
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.char_len()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor; newlines become spaces
    pub fn paste(&mut self, text: &str) {
        if self.disabled {
            return;
        }
        for c in text.chars() {
            self.insert_char(if c == '\n' || c == '\r' { ' ' } else { c });
        }
        self.sync_palette();
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.close_command_palette();
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Disabled while a request is in flight
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    pub fn palette_open(&self) -> bool {
        self.selected_command.is_some()
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map_or(self.content.len(), |(i, _)| i)
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// The palette is shown while the input is a bare `/keyword` prefix
    fn sync_palette(&mut self) {
        let Some(query) = self.content.strip_prefix('/') else {
            self.close_command_palette();
            return;
        };
        if query.contains(char::is_whitespace) {
            self.close_command_palette();
            return;
        }

        let query = query.to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| entry.keyword.starts_with(&query))
            .copied()
            .collect();

        self.selected_command = if self.filtered_commands.is_empty() {
            None
        } else {
            let index = self.selected_command.unwrap_or(0);
            Some(index.min(self.filtered_commands.len() - 1))
        };
    }

    fn close_command_palette(&mut self) {
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self) {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index).copied())
        else {
            return;
        };

        self.content = format!("/{}", entry.command.command());
        self.cursor = self.char_len();
        self.close_command_palette();
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (title, border) = if self.disabled {
            ("⏳ Waiting for the answer...", Style::default().fg(Color::DarkGray))
        } else if self.has_focus {
            ("✏️  Ask the docs", Style::default().fg(Color::Green))
        } else {
            ("✏️  Ask the docs", Style::default().fg(Color::Gray))
        };

        let block = Block::default().borders(Borders::ALL).title(title).style(border);
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.content.is_empty() {
            let placeholder = Line::from(vec![Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
        } else {
            let mut content = self.content.clone();
            if self.has_focus && !self.disabled {
                content.insert(self.byte_offset(self.cursor), '▌');
            }

            // Keep the cursor end visible when the text is wider than the box
            let width = inner_area.width as usize;
            let chars: Vec<char> = content.chars().collect();
            let start = (self.cursor + 1).saturating_sub(width);
            let visible: String = chars.iter().skip(start).take(width).collect();
            let style = if self.disabled {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            buf.set_line(inner_area.x, inner_area.y, &Line::from(Span::styled(visible, style)), inner_area.width);
        }

        if self.palette_open() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height,
            };

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in self.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if self.selected_command == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" — ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);
                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::conversation::commands::SlashCommand;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_without_clearing() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "What is a topic?");

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Submitted("What is a topic?".into()));
        assert_eq!(composer.content(), "What is a topic?");
    }

    #[test]
    fn blank_enter_does_nothing() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerResult::None);
    }

    #[test]
    fn editing_handles_multibyte_text() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "héllo");
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "hélo");

        composer.handle_key(press(KeyCode::Home));
        composer.handle_key(press(KeyCode::Delete));
        assert_eq!(composer.content(), "élo");
    }

    #[test]
    fn disabled_composer_ignores_typing() {
        let mut composer = ConversationComposer::new();
        composer.set_disabled(true);
        type_text(&mut composer, "abc");
        composer.paste("def");
        assert_eq!(composer.content(), "");
        assert_eq!(composer.handle_key(press(KeyCode::Esc)), ComposerResult::Dismissed);
    }

    #[test]
    fn palette_completes_and_runs_command() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "/he");
        assert!(composer.palette_open());

        composer.handle_key(press(KeyCode::Tab));
        assert_eq!(composer.content(), "/help");
        assert!(!composer.palette_open());

        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Command(ParsedCommand { command: SlashCommand::Help }));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn enter_in_palette_runs_completed_command() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "/cl");
        let result = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(result, ComposerResult::Command(ParsedCommand { command: SlashCommand::Close }));
    }

    #[test]
    fn esc_closes_palette_before_dismissing() {
        let mut composer = ConversationComposer::new();
        type_text(&mut composer, "/");
        assert!(composer.palette_open());
        assert_eq!(composer.handle_key(press(KeyCode::Esc)), ComposerResult::None);
        assert_eq!(composer.handle_key(press(KeyCode::Esc)), ComposerResult::Dismissed);
    }

    #[test]
    fn paste_flattens_newlines() {
        let mut composer = ConversationComposer::new();
        composer.paste("line one\nline two");
        assert_eq!(composer.content(), "line one line two");
    }
}
