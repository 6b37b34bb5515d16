use crate::config::Config;
use crate::error::AskError;
use crate::ui::conversation::{
    get_help_text, ComposerAction, ConversationComposer, ConversationHistory, ConversationStore,
    MessageId, MessagePatch, SettingsAction, SettingsModal, SlashCommand,
    ThinkingIndicator,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

/// Actions that can be requested by the conversation manager
#[derive(Debug)]
pub enum ConversationAction {
    None,
    /// A prompt was accepted; the caller must run it and report back via `finish`
    Ask(AskTicket),
    Exit,
}

/// One accepted submission awaiting its answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskTicket {
    pub placeholder: MessageId,
    pub generation: u64,
    pub prompt: String,
}

/// How a finished request was reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Resolved,
    Failed,
    /// The conversation was cleared since the ticket was issued
    Discarded,
}

/// Owns the conversation state and coordinates the request lifecycle
pub struct ConversationManager {
    store: ConversationStore,
    history: ConversationHistory,
    composer: ConversationComposer,
    indicator: ThinkingIndicator,
    settings: SettingsModal,
    error: Option<String>,
    in_flight: bool,
    generation: u64,
    endpoint_host: String,
}

impl ConversationManager {
    pub fn new(config: &Config) -> Self {
        Self {
            store: ConversationStore::new(config.greeting.clone()),
            history: ConversationHistory::new(config.ui.show_timestamps),
            composer: ConversationComposer::new("Type a message... (Enter to send, Shift+Enter for a new line)"),
            indicator: ThinkingIndicator::new(),
            settings: SettingsModal::new(),
            error: None,
            in_flight: false,
            generation: 0,
            endpoint_host: config.endpoint_host().to_string(),
        }
    }

    /// Accept the composer text as a new turn.
    ///
    /// Returns `None` without touching any state when the trimmed text is empty
    /// or a request is already in flight.
    pub fn submit(&mut self) -> Option<AskTicket> {
        if self.in_flight {
            tracing::debug!("submission dropped, request already in flight");
            return None;
        }
        if self.composer.is_blank() {
            return None;
        }

        let prompt = self.composer.take_trimmed();
        let user_message = self.store.user_message(prompt.clone());
        let placeholder = self.store.placeholder();
        let placeholder_id = placeholder.id;

        self.store.append(user_message);
        self.store.append(placeholder);
        self.error = None;
        self.set_in_flight(true);
        self.indicator.reset();
        self.history.scroll_to_bottom();

        tracing::info!(
            placeholder = %placeholder_id,
            generation = self.generation,
            prompt_len = prompt.len(),
            "submitting prompt"
        );

        Some(AskTicket {
            placeholder: placeholder_id,
            generation: self.generation,
            prompt,
        })
    }

    /// Reconcile the outcome of a ticket back into the transcript
    pub fn finish(&mut self, ticket: AskTicket, result: Result<String, AskError>) -> Settled {
        if ticket.generation != self.generation {
            tracing::debug!(
                placeholder = %ticket.placeholder,
                generation = ticket.generation,
                current = self.generation,
                "discarding result for a cleared conversation"
            );
            // The stale request was still the one in flight
            self.set_in_flight(false);
            return Settled::Discarded;
        }

        self.set_in_flight(false);
        self.history.scroll_to_bottom();

        match result {
            Ok(answer) => {
                tracing::info!(placeholder = %ticket.placeholder, answer_len = answer.len(), "answer received");
                self.store
                    .replace_by_id(ticket.placeholder, MessagePatch::resolved(answer));
                Settled::Resolved
            }
            Err(error) => {
                tracing::warn!(placeholder = %ticket.placeholder, %error, "request failed");
                self.store.remove_by_id(ticket.placeholder);
                self.error = Some(error.to_string());
                Settled::Failed
            }
        }
    }

    /// Start over with a fresh greeting and no error
    pub fn clear(&mut self) {
        self.store.reset();
        self.error = None;
        // Any answer still on its way belongs to the old conversation; it keeps
        // the in-flight slot until it arrives and is discarded
        self.generation += 1;
        self.history.scroll_to_bottom();
        tracing::info!(generation = self.generation, "conversation cleared");
    }

    fn set_in_flight(&mut self, in_flight: bool) {
        self.in_flight = in_flight;
        self.composer.set_enabled(!in_flight);
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && matches!(key.code, KeyCode::Char('c')) {
            return ConversationAction::Exit;
        }

        if self.settings.is_visible() {
            if self.settings.handle_key(key) == SettingsAction::Close {
                tracing::debug!(key_set = !self.settings.api_key().is_empty(), "settings closed");
            }
            return ConversationAction::None;
        }

        match key.code {
            KeyCode::Char('l') if ctrl => {
                self.clear();
                return ConversationAction::None;
            }
            KeyCode::Char('s') if ctrl => {
                self.settings.open();
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.history.page_up();
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.history.page_down();
                return ConversationAction::None;
            }
            KeyCode::Esc if !self.composer.is_palette_open() => {
                self.dismiss_error();
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ComposerAction::Submit => match self.submit() {
                Some(ticket) => ConversationAction::Ask(ticket),
                None => ConversationAction::None,
            },
            ComposerAction::Command(command) => self.handle_slash_command(command),
            ComposerAction::None => ConversationAction::None,
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: SlashCommand) -> ConversationAction {
        tracing::debug!(command = command.command(), "slash command");
        match command {
            SlashCommand::Clear => {
                self.clear();
                ConversationAction::None
            }
            SlashCommand::Settings => {
                self.settings.open();
                ConversationAction::None
            }
            SlashCommand::Help => {
                let help = self.store.assistant_message(get_help_text());
                self.store.append(help);
                self.history.scroll_to_bottom();
                ConversationAction::None
            }
            SlashCommand::Quit => ConversationAction::Exit,
        }
    }

    /// Advance the thinking animation
    pub fn tick(&mut self) {
        if self.in_flight {
            self.indicator.tick();
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn composer(&self) -> &ConversationComposer {
        &self.composer
    }

    pub fn settings(&self) -> &SettingsModal {
        &self.settings
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let line = Line::from(vec![
            Span::styled(" 🤖 AI Chat ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::styled(format!("· {} ", self.endpoint_host), Style::default().fg(Color::Gray)),
            Span::styled(
                "· Ctrl+L clear · Ctrl+S settings · /help · Ctrl+C quit",
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        buf.set_line(area.x, area.y, &line, area.width);
    }

    fn render_error(&self, message: &str, area: Rect, buf: &mut Buffer) {
        Paragraph::new(error_line(message))
        .style(Style::default().bg(Color::Red))
        .wrap(Wrap { trim: true })
        .render(area, buf);
    }
}

const ERROR_BANNER_MAX_ROWS: u16 = 3;
const ERROR_BANNER_HINT: &str = "  (Esc to dismiss)";

fn error_line(message: &str) -> Line<'_> {
    Line::from(vec![
        Span::raw("❌ "),
        Span::styled(message, Style::default().fg(Color::White)),
        Span::styled(ERROR_BANNER_HINT, Style::default().fg(Color::Gray)),
    ])
}

/// Rows the error banner needs to show `message` wrapped at `width`
fn error_banner_height(message: &str, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    // One spare column per row for words pushed down by the wrap
    let usable = (width as usize).saturating_sub(1).max(1);
    let rows = error_line(message).width().div_ceil(usable);
    rows.clamp(1, ERROR_BANNER_MAX_ROWS as usize) as u16
}

impl Widget for &ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let error_height = self
            .error
            .as_deref()
            .map_or(0, |message| error_banner_height(message, area.width));

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(error_height),
                Constraint::Min(3),
                Constraint::Length(self.composer.desired_height()),
            ])
            .split(area);

        self.render_header(chunks[0], buf);

        if let Some(message) = self.error.as_deref() {
            self.render_error(message, chunks[1], buf);
        }

        self.history
            .view(&self.store, self.indicator.text())
            .render(chunks[2], buf);

        self.composer.render(chunks[3], buf);

        self.settings.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Role;
    use reqwest::StatusCode;

    fn manager() -> ConversationManager {
        ConversationManager::new(&Config::default())
    }

    fn type_and_send(manager: &mut ConversationManager, text: &str) -> ConversationAction {
        for c in text.chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
    }

    fn ask(manager: &mut ConversationManager, text: &str) -> AskTicket {
        match type_and_send(manager, text) {
            ConversationAction::Ask(ticket) => ticket,
            other => panic!("expected a ticket, got {other:?}"),
        }
    }

    #[test]
    fn submit_appends_user_message_and_placeholder() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "  hello  ");

        assert_eq!(ticket.prompt, "hello");
        let messages = manager.store().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].id, ticket.placeholder);
        assert!(messages[2].is_loading);
        assert!(messages[2].content.is_empty());
        assert!(manager.is_in_flight());
        assert!(!manager.composer().is_enabled());
        assert_eq!(manager.composer().content(), "");
    }

    #[test]
    fn blank_submission_changes_nothing() {
        let mut manager = manager();
        let before = manager.store().messages().to_vec();
        assert!(matches!(type_and_send(&mut manager, "   "), ConversationAction::None));
        assert!(manager.submit().is_none());
        assert_eq!(manager.store().messages(), before.as_slice());
        assert!(!manager.is_in_flight());
    }

    #[test]
    fn second_submission_while_in_flight_is_dropped() {
        let mut manager = manager();
        ask(&mut manager, "first");
        let len = manager.store().len();

        assert!(matches!(type_and_send(&mut manager, "second"), ConversationAction::None));
        assert!(manager.submit().is_none());
        assert_eq!(manager.store().len(), len);
        assert_eq!(manager.store().loading_count(), 1);
    }

    #[test]
    fn success_fills_placeholder_in_place() {
        let mut manager = manager();
        let before = manager.store().len();
        let ticket = ask(&mut manager, "hello");
        let placeholder = ticket.placeholder;

        assert_eq!(manager.finish(ticket, Ok("hi there".to_string())), Settled::Resolved);

        assert_eq!(manager.store().len(), before + 2);
        let answer = manager.store().last().unwrap();
        assert_eq!(answer.id, placeholder);
        assert_eq!(answer.role, Role::Assistant);
        assert_eq!(answer.content, "hi there");
        assert!(!answer.is_loading);
        assert_eq!(manager.store().loading_count(), 0);
        assert!(!manager.is_in_flight());
        assert!(manager.composer().is_enabled());
        assert!(manager.error().is_none());
    }

    #[test]
    fn failure_retracts_placeholder_and_sets_error() {
        let mut manager = manager();
        let before = manager.store().len();
        let ticket = ask(&mut manager, "hello");
        let placeholder = ticket.placeholder;

        let error = AskError::status(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(manager.finish(ticket, Err(error)), Settled::Failed);

        assert_eq!(manager.store().len(), before + 1);
        assert!(manager.store().get(placeholder).is_none());
        assert_eq!(manager.store().last().unwrap().content, "hello");
        assert_eq!(manager.error(), Some("request failed: status 500"));
        assert!(!manager.is_in_flight());
    }

    #[test]
    fn next_submission_clears_previous_error() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "one");
        manager.finish(ticket, Err(AskError::Server("boom".to_string())));
        assert!(manager.error().is_some());

        ask(&mut manager, "two");
        assert!(manager.error().is_none());
    }

    #[test]
    fn escape_dismisses_error() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "one");
        manager.finish(ticket, Err(AskError::Server("boom".to_string())));
        manager.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(manager.error().is_none());
    }

    #[test]
    fn clear_resets_transcript_and_error() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "one");
        manager.finish(ticket, Err(AskError::Server("boom".to_string())));
        ask(&mut manager, "two");

        manager.clear();
        assert_eq!(manager.store().len(), 1);
        assert_eq!(manager.store().messages()[0].content, Config::default().greeting);
        assert!(manager.error().is_none());
        assert_eq!(manager.store().loading_count(), 0);
        // "two" has not answered yet
        assert!(manager.is_in_flight());
    }

    #[test]
    fn late_result_after_clear_is_discarded() {
        let mut manager = manager();
        let stale = ask(&mut manager, "one");
        manager.clear();

        // Still one request outstanding, so nothing new may start
        assert!(matches!(type_and_send(&mut manager, "two"), ConversationAction::None));
        assert!(manager.submit().is_none());
        assert_eq!(manager.store().len(), 1);
        assert_eq!(manager.store().loading_count(), 0);
        assert!(manager.is_in_flight());
        assert!(!manager.composer().is_enabled());

        assert_eq!(manager.finish(stale, Ok("late".to_string())), Settled::Discarded);
        assert_eq!(manager.store().len(), 1);
        assert!(manager.store().messages().iter().all(|m| m.content != "late"));
        assert!(!manager.is_in_flight());
        assert!(manager.composer().is_enabled());

        let ticket = ask(&mut manager, "two");
        assert_eq!(manager.finish(ticket, Ok("fresh".to_string())), Settled::Resolved);
        assert_eq!(manager.store().last().unwrap().content, "fresh");
    }

    #[test]
    fn shift_enter_adds_newline_without_request() {
        let mut manager = manager();
        for c in "line".chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        let action = manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert!(matches!(action, ConversationAction::None));
        assert_eq!(manager.composer().content(), "line\n");
        assert_eq!(manager.store().len(), 1);
        assert!(!manager.is_in_flight());
    }

    #[test]
    fn slash_commands() {
        let mut manager = manager();
        assert!(matches!(type_and_send(&mut manager, "/help"), ConversationAction::None));
        assert_eq!(manager.store().len(), 2);
        assert!(manager.store().last().unwrap().content.contains("/clear"));

        type_and_send(&mut manager, "/clear");
        assert_eq!(manager.store().len(), 1);

        type_and_send(&mut manager, "/settings");
        assert!(manager.settings().is_visible());
        manager.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        assert!(!manager.settings().is_visible());

        assert!(matches!(type_and_send(&mut manager, "/quit"), ConversationAction::Exit));
    }

    #[test]
    fn slash_prefixed_prompt_is_asked() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "one");
        manager.finish(ticket, Ok("answer".to_string()));
        let before = manager.store().len();

        let ticket = ask(&mut manager, "/c something");
        assert_eq!(ticket.prompt, "/c something");
        assert_eq!(manager.store().len(), before + 2);
        assert_eq!(manager.store().messages()[before].content, "/c something");

        manager.finish(ticket, Ok("ok".to_string()));
        let ticket = ask(&mut manager, "/clear the cache please");
        assert_eq!(ticket.prompt, "/clear the cache please");
        assert!(manager.store().len() > 1);
    }

    #[test]
    fn settings_capture_keys_without_touching_composer() {
        let mut manager = manager();
        manager.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        for c in "sk-1".chars() {
            manager.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        manager.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert_eq!(manager.settings().api_key(), "sk-1");
        assert_eq!(manager.composer().content(), "");
        assert_eq!(manager.store().len(), 1);
    }

    #[test]
    fn at_most_one_loading_message_across_turns() {
        let mut manager = manager();
        for i in 0..5 {
            let ticket = ask(&mut manager, &format!("q{i}"));
            assert_eq!(manager.store().loading_count(), 1);
            let result = if i % 2 == 0 {
                Ok(format!("a{i}"))
            } else {
                Err(AskError::Server("nope".to_string()))
            };
            manager.finish(ticket, result);
            assert_eq!(manager.store().loading_count(), 0);
        }
        // greeting + 5 user + 3 answers
        assert_eq!(manager.store().len(), 9);
    }

    #[test]
    fn renders_error_banner_and_transcript() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "hello");
        manager.finish(ticket, Err(AskError::Server("quota exceeded".to_string())));

        let area = Rect::new(0, 0, 70, 20);
        let mut buf = Buffer::empty(area);
        (&manager).render(area, &mut buf);
        let screen: String = (0..area.height)
            .flat_map(|y| (0..area.width).map(move |x| (x, y)))
            .map(|(x, y)| buf.get(x, y).symbol().to_string())
            .collect();
        assert!(screen.contains("quota exceeded"));
        assert!(screen.contains("hello"));
    }

    #[test]
    fn error_banner_grows_with_message() {
        assert_eq!(error_banner_height("boom", 70), 1);
        assert_eq!(error_banner_height(&"x".repeat(30), 40), 2);
        assert_eq!(error_banner_height(&"x".repeat(80), 40), 3);
        assert_eq!(error_banner_height(&"x".repeat(500), 40), ERROR_BANNER_MAX_ROWS);
        assert_eq!(error_banner_height("boom", 0), 1);
    }

    #[test]
    fn long_error_is_fully_visible_on_narrow_screen() {
        let mut manager = manager();
        let ticket = ask(&mut manager, "hello");
        let message = "the upstream quota is exhausted";
        manager.finish(ticket, Err(AskError::Server(message.to_string())));

        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        (&manager).render(area, &mut buf);
        let screen: String = (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf.get(x, y).symbol().to_string())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(" ");
        assert!(screen.contains("exhausted"));
        assert!(screen.contains("(Esc to dismiss)"));
    }
}
