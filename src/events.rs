use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// TUI-specific events (keyboard, paste, resize)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// Show or hide the chat panel
    TogglePanel,

    /// Request to exit the application
    Quit,

    /// Key press for whichever view has focus
    Key(KeyEvent),

    /// Paste event
    Paste(String),

    /// Terminal resize
    Resize(u16, u16),
}

impl TuiEvent {
    /// Map a raw terminal event; returns `None` for events the app ignores
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::from_key(key)),
            Event::Paste(text) => Some(TuiEvent::Paste(text)),
            Event::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
            _ => None,
        }
    }

    fn from_key(key: KeyEvent) -> Self {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => TuiEvent::Quit,
            KeyCode::Char('o') if ctrl => TuiEvent::TogglePanel,
            KeyCode::F(2) => TuiEvent::TogglePanel,
            _ => TuiEvent::Key(key),
        }
    }
}
