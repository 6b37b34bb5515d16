//! Conversation history display component

use crate::events::Role;
use crate::ui::conversation::store::{ConversationStore, Message};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};
use std::cell::Cell;

/// Scroll state for the transcript. Offset counts lines up from the bottom.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    scroll_back: usize,
    show_timestamps: bool,
    last_total_lines: Cell<usize>,
    last_viewport: Cell<usize>,
}

impl ConversationHistory {
    pub fn new(show_timestamps: bool) -> Self {
        Self {
            scroll_back: 0,
            show_timestamps,
            last_total_lines: Cell::new(0),
            last_viewport: Cell::new(0),
        }
    }

    /// Scroll up by a page
    pub fn page_up(&mut self) {
        let page = self.last_viewport.get().max(1);
        let max_back = self.last_total_lines.get().saturating_sub(self.last_viewport.get());
        self.scroll_back = (self.scroll_back + page).min(max_back);
    }

    /// Scroll down by a page
    pub fn page_down(&mut self) {
        let page = self.last_viewport.get().max(1);
        self.scroll_back = self.scroll_back.saturating_sub(page);
    }

    /// Pin the view to the newest message
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_back = 0;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_back == 0
    }

    pub fn view<'a>(&'a self, store: &'a ConversationStore, thinking: String) -> HistoryView<'a> {
        HistoryView {
            history: self,
            store,
            thinking,
        }
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, thinking: &str, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let mut header = vec![
            Span::raw(format!("{} ", message.role.icon())),
            Span::styled(
                message.role.label(),
                self.get_content_style(message.role).add_modifier(Modifier::BOLD),
            ),
        ];
        if self.show_timestamps {
            header.push(Span::styled(
                format!("  {}", message.timestamp.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ));
        }
        lines.push(Line::from(header));

        if message.is_loading {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    thinking.to_string(),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
                ),
            ]));
            return lines;
        }

        for content_line in wrap_text(&message.content, width.saturating_sub(2) as usize) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, self.get_content_style(message.role)),
            ]));
        }

        lines
    }

    /// Get content style based on role
    fn get_content_style(&self, role: Role) -> Style {
        match role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Assistant => Style::default().fg(Color::Green),
        }
    }
}

/// Transcript projection, borrowed for one frame
pub struct HistoryView<'a> {
    history: &'a ConversationHistory,
    store: &'a ConversationStore,
    thinking: String,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation");

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();
        for message in self.store.messages() {
            all_lines.extend(self.history.render_message(message, &self.thinking, inner_area.width));
            all_lines.push(Line::default());
        }
        all_lines.pop();

        let height = inner_area.height as usize;
        let total = all_lines.len();
        self.history.last_total_lines.set(total);
        self.history.last_viewport.set(height);

        // Window ends `scroll_back` lines above the bottom
        let max_back = total.saturating_sub(height);
        let back = self.history.scroll_back.min(max_back);
        let end = total - back;
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if total > height {
            let mut state = ScrollbarState::new(max_back).position(max_back - back);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut state);
        }
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if current_len > 0 && current_len + word_len + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_len = 0;
            }
            if current_len > 0 {
                current_line.push(' ');
                current_len += 1;
            }

            // Hard-split words longer than a whole line
            let mut chars = word.chars().peekable();
            while chars.peek().is_some() {
                if current_len == width {
                    lines.push(std::mem::take(&mut current_line));
                    current_len = 0;
                }
                if let Some(c) = chars.next() {
                    current_line.push(c);
                    current_len += 1;
                }
            }
        }

        lines.push(current_line);
    }

    lines
}
