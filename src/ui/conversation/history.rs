//! Conversation history display component

use crate::conversation::{Message, Role};
use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const OUT_OF_SCOPE_NOTICE: &str = "This content is not related to this book.";

/// Renders the history bottom-anchored, newest last.
pub struct ConversationHistory<'a> {
    messages: &'a [Message],
    is_loading: bool,
    show_timestamps: bool,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [Message], is_loading: bool) -> Self {
        Self {
            messages,
            is_loading,
            show_timestamps: true,
        }
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("🤖 AI Assistant");
        let inner_area = block.inner(area);
        block.render(area, buf);

        let lines = message_lines(self.messages, self.is_loading, inner_area.width, self.show_timestamps);
        let height = inner_area.height as usize;
        let start = lines.len().saturating_sub(height);

        for (i, line) in lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

/// Lines for the whole list; depends only on its arguments.
pub fn message_lines(
    messages: &[Message],
    is_loading: bool,
    width: u16,
    show_timestamps: bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if messages.is_empty() {
        lines.extend(welcome_lines());
    }

    for message in messages {
        lines.extend(render_message(message, width, show_timestamps));
        lines.push(Line::default());
    }

    if is_loading {
        lines.push(Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("● ● ●", Style::default().fg(Color::Yellow)),
        ]));
    }

    lines
}

fn welcome_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "🤖 Hello! I'm your AI Assistant",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(Span::raw(
            "Ask me anything about robotics, ROS 2, or the content in this documentation.",
        )),
        Line::default(),
        Line::from(vec![
            Span::styled("Tip: ", Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
            Span::styled(
                "I'll show you a single relevant source for each answer.",
                Style::default().fg(Color::Gray),
            ),
        ]),
        Line::default(),
    ]
}

/// Render a single message into lines
fn render_message(message: &Message, width: u16, show_timestamps: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let label = match message.role {
        Role::User => "👤 You",
        Role::Assistant => "🤖 Assistant",
    };
    let mut header = vec![Span::styled(label, Style::default().fg(Color::DarkGray))];
    if show_timestamps {
        let time = message.timestamp.with_timezone(&Local).format("%H:%M").to_string();
        header.push(Span::styled(format!(" {time}"), Style::default().fg(Color::DarkGray)));
    }
    lines.push(Line::from(header));

    let content_style = match message.role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Assistant => Style::default().fg(Color::Green),
    };
    for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
        lines.push(Line::from(vec![Span::raw("  "), Span::styled(content_line, content_style)]));
    }

    if message.role == Role::Assistant {
        if let Some(source) = &message.primary_source {
            lines.push(Line::from(vec![
                Span::styled("  Source: ", Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD)),
                Span::styled(
                    source.title.clone(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                ),
                Span::styled(format!(" ({})", source.url), Style::default().fg(Color::DarkGray)),
            ]));
        }
        if message.is_out_of_scope() {
            lines.push(Line::from(Span::styled(
                format!("  {OUT_OF_SCOPE_NOTICE}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            )));
        }
    }

    lines
}

/// Wrap text to fit within the given width, keeping paragraph breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + 1 + word_len > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }
            current_line.push_str(word);
            current_len += word_len;
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AskResponse, PrimarySource};

    fn text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    fn answer(json: &str) -> Message {
        Message::answer(serde_json::from_str::<AskResponse>(json).unwrap())
    }

    #[test]
    fn empty_history_shows_welcome() {
        let rendered = text(&message_lines(&[], false, 80, true)).join("\n");
        assert!(rendered.contains("Hello! I'm your AI Assistant"));
        assert!(rendered.contains("single relevant source"));
    }

    #[test]
    fn citation_is_rendered_for_primary_source() {
        let message = Message {
            primary_source: Some(PrimarySource {
                url: "https://x/y".into(),
                title: "DDS overview".into(),
                chunk_index: 3,
            }),
            ..Message::assistant("ROS 2 uses DDS for transport.")
        };

        let rendered = text(&message_lines(&[message], false, 80, false));
        assert_eq!(rendered[0], "🤖 Assistant");
        assert_eq!(rendered[1], "  ROS 2 uses DDS for transport.");
        assert_eq!(rendered[2], "  Source: DDS overview (https://x/y)");
        assert!(!rendered.iter().any(|l| l.contains(OUT_OF_SCOPE_NOTICE)));
    }

    #[test]
    fn out_of_scope_answer_has_notice_and_no_citation() {
        let message = answer(r#"{"answer": "That is outside my documentation.", "is_out_of_scope": true}"#);
        let rendered = text(&message_lines(&[message], false, 80, false));

        assert!(rendered.iter().any(|l| l.trim() == OUT_OF_SCOPE_NOTICE));
        assert!(!rendered.iter().any(|l| l.contains("Source:")));
    }

    #[test]
    fn user_messages_never_show_assistant_extras() {
        let message = Message {
            is_out_of_scope: Some(true),
            ..Message::user("hello")
        };
        let rendered = text(&message_lines(&[message], false, 80, false));
        assert!(!rendered.iter().any(|l| l.contains(OUT_OF_SCOPE_NOTICE)));
    }

    #[test]
    fn loading_adds_typing_indicator() {
        let history = [Message::user("q")];
        let idle = message_lines(&history, false, 80, true);
        let loading = message_lines(&history, true, 80, true);
        assert_eq!(loading.len(), idle.len() + 1);
        assert!(text(&loading).last().unwrap().contains("● ● ●"));
    }

    #[test]
    fn wrap_respects_width_and_paragraphs() {
        assert_eq!(wrap_text("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap_text("first\n\nsecond", 40), vec!["first", "", "second"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }
}
