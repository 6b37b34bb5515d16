use crate::ui::conversation::commands::{
    command_entries, parse_slash_command, CommandEntry, SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{block::Title, Block, Borders, Widget},
};

const MAX_VISIBLE_LINES: u16 = 6;

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerAction {
    /// Enter pressed on non-empty text; the coordinator takes the content
    Submit,
    Command(SlashCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Byte offset, always on a char boundary
    pub cursor_position: usize,
}

/// Conversation composer for user input
#[derive(Clone)]
pub struct ConversationComposer {
    state: TextAreaState,
    placeholder: String,
    enabled: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: TextAreaState::default(),
            placeholder: placeholder.into(),
            enabled: true,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerAction {
        if key.kind != KeyEventKind::Press || !self.enabled {
            return ComposerAction::None;
        }

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                    self.insert_char('\n');
                } else if let Some(command) = parse_slash_command(&self.state.content) {
                    self.clear();
                    return ComposerAction::Command(command);
                } else if self.show_command_palette && self.apply_selected_command() {
                    return ComposerAction::None;
                } else if !self.state.content.trim().is_empty() {
                    self.close_command_palette();
                    return ComposerAction::Submit;
                }
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command();
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerAction::None;
                }
                self.insert_char(c);
                self.sync_command_palette();
            }
            KeyCode::Backspace => {
                if self.backspace() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Delete => {
                if self.delete() {
                    self.sync_command_palette();
                }
            }
            KeyCode::Left => {
                let previous = self.state.content[..self.state.cursor_position].chars().next_back();
                if let Some(c) = previous {
                    self.state.cursor_position -= c.len_utf8();
                }
            }
            KeyCode::Right => {
                let next = self.state.content[self.state.cursor_position..].chars().next();
                if let Some(c) = next {
                    self.state.cursor_position += c.len_utf8();
                }
            }
            KeyCode::Home => {
                self.state.cursor_position = 0;
            }
            KeyCode::End => {
                self.state.cursor_position = self.state.content.len();
            }
            _ => {}
        }

        ComposerAction::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&mut self, c: char) {
        self.state.content.insert(self.state.cursor_position, c);
        self.state.cursor_position += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        let previous = self.state.content[..self.state.cursor_position].chars().next_back();
        match previous {
            Some(c) => {
                self.state.cursor_position -= c.len_utf8();
                self.state.content.remove(self.state.cursor_position);
                true
            }
            None => false,
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.state.cursor_position < self.state.content.len() {
            self.state.content.remove(self.state.cursor_position);
            true
        } else {
            false
        }
    }

    /// Open, refresh or close the palette to match the current text
    fn sync_command_palette(&mut self) {
        let content = &self.state.content;
        let typing_command = content.starts_with('/') && !content.contains(char::is_whitespace);

        if typing_command {
            if !self.show_command_palette {
                self.show_command_palette = true;
                self.selected_command = Some(0);
            }
            self.refresh_command_palette();
            if self.filtered_commands.is_empty() {
                self.close_command_palette();
            }
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.state.content.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        if self.filtered_commands.is_empty() {
            self.selected_command = None;
        } else {
            let index = self.selected_command.unwrap_or(0);
            self.selected_command = Some(index.min(self.filtered_commands.len() - 1));
        }
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let current = self.selected_command.unwrap_or(0) as isize;
        let len = self.filtered_commands.len() as isize;
        let next = (current + delta).rem_euclid(len);
        self.selected_command = Some(next as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        self.state.content = format!("/{}", entry.keyword);
        self.state.cursor_position = self.state.content.len();
        self.close_command_palette();
        true
    }

    /// Take the trimmed text and empty the buffer
    pub fn take_trimmed(&mut self) -> String {
        let content = self.state.content.trim().to_string();
        self.clear();
        content
    }

    /// Get current content
    pub fn content(&self) -> &str {
        &self.state.content
    }

    pub fn is_blank(&self) -> bool {
        self.state.content.trim().is_empty()
    }

    /// Disabled while a request is in flight; edits are ignored
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.close_command_palette();
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    /// Clear content
    pub fn clear(&mut self) {
        self.state.content.clear();
        self.state.cursor_position = 0;
        self.close_command_palette();
    }

    /// Rows needed to show the text plus the border
    pub fn desired_height(&self) -> u16 {
        let lines = self.state.content.split('\n').count() as u16;
        lines.clamp(1, MAX_VISIBLE_LINES) + 2
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let can_send = self.enabled && !self.is_blank();

        let (title, border_style) = if self.enabled {
            ("✏️  Message", Style::default().fg(Color::Green))
        } else {
            ("⏳ Waiting for reply...", Style::default().fg(Color::DarkGray))
        };

        let send_style = if can_send {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title(
                Title::from(Span::styled(" ⏎ Send ", send_style)).alignment(Alignment::Right),
            )
            .border_style(border_style);

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.state.content.clone();
            if self.enabled {
                content.insert(self.state.cursor_position.min(content.len()), '▌');
            }

            let text_style = if self.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            // Keep the tail visible when the text is taller than the box
            let lines: Vec<&str> = content.split('\n').collect();
            let start = lines.len().saturating_sub(inner_area.height as usize);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(vec![Span::styled(*line_text, text_style)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette && !self.filtered_commands.is_empty() {
            let palette_height = (self.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height.min(area.y),
            };

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
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
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

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(composer: &mut ConversationComposer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn enter_submits_non_empty_text() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "hello");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::Submit);
        assert_eq!(composer.take_trimmed(), "hello");
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn enter_on_blank_text_does_nothing() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::None);
        assert_eq!(composer.content(), "   ");
    }

    #[test]
    fn shift_enter_inserts_newline() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "line one");
        let action = composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(action, ComposerAction::None);
        type_str(&mut composer, "two");
        assert_eq!(composer.content(), "line one\ntwo");
        assert_eq!(composer.desired_height(), 4);
    }

    #[test]
    fn alt_enter_inserts_newline() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "a");
        composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT));
        assert_eq!(composer.content(), "a\n");
    }

    #[test]
    fn disabled_composer_ignores_keys() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "draft");
        composer.set_enabled(false);
        type_str(&mut composer, "more");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::None);
        assert_eq!(composer.content(), "draft");
    }

    #[test]
    fn cursor_editing_handles_multibyte_text() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "héllo");
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Left));
        composer.handle_key(press(KeyCode::Backspace));
        assert_eq!(composer.content(), "hllo");
        composer.handle_key(press(KeyCode::Home));
        composer.handle_key(press(KeyCode::Delete));
        assert_eq!(composer.content(), "llo");
        composer.handle_key(press(KeyCode::End));
        type_str(&mut composer, "ü");
        assert_eq!(composer.content(), "lloü");
    }

    #[test]
    fn slash_command_is_returned_and_cleared() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/help");
        let action = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(action, ComposerAction::Command(SlashCommand::Help));
        assert_eq!(composer.content(), "");
    }

    #[test]
    fn slash_prefixed_sentence_is_submitted() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/c is a language, explain pointers");
        assert!(!composer.is_palette_open());
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::Submit);
        assert_eq!(composer.content(), "/c is a language, explain pointers");
    }

    #[test]
    fn palette_completes_selected_command() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/cl");
        assert!(composer.is_palette_open());

        // First Enter completes, second Enter runs
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::None);
        assert_eq!(composer.content(), "/clear");
        assert!(!composer.is_palette_open());

        let action = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(action, ComposerAction::Command(SlashCommand::Clear));
    }

    #[test]
    fn unknown_slash_text_is_submitted_as_prompt() {
        let mut composer = ConversationComposer::new("");
        type_str(&mut composer, "/usr/bin");
        assert!(!composer.is_palette_open());
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), ComposerAction::Submit);
    }
}
