//! API key settings modal
//!
//! The key is held only in memory for the lifetime of the process. It is not
//! written to the config file and not attached to outbound requests.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// What the modal wants the owner to do after a key press
#[derive(Debug, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    Close,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsModal {
    api_key: String,
    visible: bool,
    reveal_key: bool,
}

impl SettingsModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
        self.reveal_key = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle_reveal(&mut self) {
        self.reveal_key = !self.reveal_key;
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal_key
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The key as it should appear on screen
    pub fn displayed_key(&self) -> String {
        if self.reveal_key {
            self.api_key.clone()
        } else {
            "•".repeat(self.api_key.chars().count())
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> SettingsAction {
        if key.kind != KeyEventKind::Press {
            return SettingsAction::None;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.close();
                return SettingsAction::Close;
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.toggle_reveal();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.api_key.clear();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.api_key.push(c);
            }
            KeyCode::Backspace => {
                self.api_key.pop();
            }
            _ => {}
        }

        SettingsAction::None
    }

    /// Centered rectangle the modal occupies inside `area`
    fn modal_area(area: Rect) -> Rect {
        let width = area.width.min(60);
        let height = area.height.min(9);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }
}

impl Widget for &SettingsModal {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.visible {
            return;
        }

        let modal = SettingsModal::modal_area(area);
        Clear.render(modal, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title("⚙️  Settings")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(modal);
        block.render(modal, buf);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Min(1),
            ])
            .split(inner);

        buf.set_line(
            rows[0].x,
            rows[0].y,
            &Line::from(Span::styled("API Key", Style::default().add_modifier(Modifier::BOLD))),
            rows[0].width,
        );

        let eye = if self.reveal_key { "🙈 Ctrl+R hide" } else { "👁 Ctrl+R show" };
        let field = Paragraph::new(if self.api_key.is_empty() {
            Line::from(Span::styled("sk-...", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(self.displayed_key())
        })
        .block(Block::default().borders(Borders::ALL).title(eye));
        field.render(rows[1], buf);

        Paragraph::new(vec![
            Line::from(Span::styled(
                "The key stays in memory only and is never sent to the server.",
                Style::default().fg(Color::Gray),
            )),
            Line::from(Span::styled(
                "Esc/Enter close · Ctrl+U clear",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .wrap(Wrap { trim: true })
        .render(rows[2], buf);
    }
}
