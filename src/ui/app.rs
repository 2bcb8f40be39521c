use crate::config::Config;
use crate::events::TuiEvent;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::event::{self, DisableBracketedPaste, EnableBracketedPaste, KeyCode};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame, Terminal,
};
use std::io::{self, Stdout};
use std::time::Duration;

const TICK: Duration = Duration::from_millis(100);
const PANEL_MAX_WIDTH: u16 = 72;

/// Top-level screen: a page with a launcher bar and the toggleable chat panel.
///
/// Hiding the panel never touches the conversation; a pending answer still
/// lands in the history and shows up the next time the panel opens.
pub struct App {
    manager: ConversationManager,
    panel_open: bool,
    should_quit: bool,
}

impl App {
    pub fn new(manager: ConversationManager, panel_open: bool) -> Self {
        let mut app = Self {
            manager,
            panel_open: false,
            should_quit: false,
        };
        app.set_panel_open(panel_open);
        app
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn set_panel_open(&mut self, open: bool) {
        self.panel_open = open;
        self.manager.set_focus(open);
    }

    /// Deliver any finished request
    pub fn tick(&mut self) {
        self.manager.poll_turn();
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Quit => self.should_quit = true,
            TuiEvent::TogglePanel => self.set_panel_open(!self.panel_open),
            TuiEvent::Key(key) if self.panel_open => match self.manager.handle_key(key) {
                ConversationAction::Close => self.set_panel_open(false),
                ConversationAction::Exit => self.should_quit = true,
                ConversationAction::None => {}
            },
            TuiEvent::Key(key) => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.set_panel_open(true),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            TuiEvent::Paste(text) if self.panel_open => self.manager.handle_paste(&text),
            TuiEvent::Resize(width, height) => tracing::debug!(width, height, "terminal resized"),
            TuiEvent::Paste(_) => {}
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(frame.size());

        let page = Paragraph::new(vec![
            Line::from(Span::styled(
                "docchat",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
            Line::default(),
            Line::from("Ask questions about the documentation and get answers with a cited source."),
            Line::from("Press Enter or Ctrl+O to open the assistant, q to quit."),
        ])
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
        frame.render_widget(page, chunks[0]);

        frame.render_widget(self.launcher(), chunks[1]);

        if self.panel_open() {
            let area = panel_area(chunks[0]);
            let buf = frame.buffer_mut();
            Clear.render(area, buf);
            self.manager.render(area, buf);
        }
    }

    fn launcher(&self) -> Paragraph<'static> {
        let button_style = if self.panel_open {
            Style::default().fg(Color::Black).bg(Color::Green)
        } else {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        };

        let mut spans = vec![
            Span::styled(" 💬 Ask the docs ", button_style.add_modifier(Modifier::BOLD)),
            Span::styled("  Ctrl+O toggle · Ctrl+C quit", Style::default().fg(Color::DarkGray)),
        ];
        let state = self.manager.controller().state();
        if !self.panel_open && state.is_loading() {
            spans.push(Span::styled("  ⏳ answer pending", Style::default().fg(Color::Yellow)));
        }
        if !self.panel_open && !state.pending_input().is_empty() {
            spans.push(Span::styled("  ✏️ unsent draft", Style::default().fg(Color::Gray)));
        }

        Paragraph::new(Line::from(spans))
    }
}

/// Panel docked to the right edge of the page
fn panel_area(page: Rect) -> Rect {
    let width = page.width.min(PANEL_MAX_WIDTH);
    Rect {
        x: page.x + page.width - width,
        y: page.y,
        width,
        height: page.height,
    }
}

/// Run the terminal UI until the user quits.
///
/// Must be called from inside a multi-threaded tokio runtime.
pub fn run(config: &Config, manager: ConversationManager) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let mut app = App::new(manager, config.ui.open_on_start);

    let result = event_loop(&mut terminal, &mut app);

    restore_terminal(&mut terminal)?;
    result
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while !app.should_quit() {
        app.tick();
        terminal.draw(|frame| app.render(frame)).context("Failed to draw frame")?;

        // Blocking poll; request tasks run on the other runtime workers
        let ready = tokio::task::block_in_place(|| event::poll(TICK)).context("Failed to poll terminal events")?;
        if ready {
            let raw = event::read().context("Failed to read terminal event")?;
            if let Some(event) = TuiEvent::from_crossterm(raw) {
                app.handle_event(event);
            }
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
