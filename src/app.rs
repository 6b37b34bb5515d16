use crate::config::Config;
use crate::events::AppEvent;
use crate::qa::AskBackend;
use crate::ui::conversation::{AskTicket, ConversationAction, ConversationManager};
use anyhow::Result;
use crossterm::{
    event::{
        Event, EventStream, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Run one ticket against the backend and post the outcome to the UI loop.
///
/// If the receiver is gone by the time the answer arrives, the result is dropped.
pub fn spawn_ask(
    backend: Arc<dyn AskBackend>,
    ticket: AskTicket,
    tx: mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = backend.ask(&ticket.prompt).await;
        if tx.send(AppEvent::AskFinished { ticket, result }).is_err() {
            tracing::debug!("UI closed before the answer arrived, dropping it");
        }
    })
}

/// Full-screen chat application
pub struct TuiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    manager: ConversationManager,
    backend: Arc<dyn AskBackend>,
    tick_rate: Duration,
    keyboard_enhanced: bool,
    should_quit: bool,
}

/// Runs `restore` on drop unless disarmed
struct RestoreOnError<F: FnOnce()> {
    restore: Option<F>,
}

impl<F: FnOnce()> RestoreOnError<F> {
    fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }

    fn disarm(mut self) {
        self.restore = None;
    }
}

impl<F: FnOnce()> Drop for RestoreOnError<F> {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
    }
}

impl TuiApp {
    pub fn new(config: &Config, backend: Arc<dyn AskBackend>) -> Result<Self> {
        enable_raw_mode()?;
        // Until the app owns the terminal, a failed step must hand it back
        let guard = RestoreOnError::new(|| {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            tracing::warn!("terminal setup failed, raw mode restored");
        });

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        // Shift+Enter is only distinguishable with the kitty keyboard protocol;
        // Alt+Enter works everywhere else
        let keyboard_enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if keyboard_enhanced {
            let _ = execute!(
                terminal.backend_mut(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            );
        }

        guard.disarm();
        tracing::info!(endpoint = %config.endpoint, keyboard_enhanced, "starting TUI");

        Ok(Self {
            terminal,
            manager: ConversationManager::new(config),
            backend,
            tick_rate: Duration::from_millis(config.ui.tick_ms.max(16)),
            keyboard_enhanced,
            should_quit: false,
        })
    }

    /// Run the main event loop
    pub async fn run(&mut self) -> Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(self.tick_rate);

        while !self.should_quit {
            self.terminal
                .draw(|frame| frame.render_widget(&self.manager, frame.size()))?;

            tokio::select! {
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_terminal_event(event, &tx),
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                Some(event) = rx.recv() => self.handle_app_event(event),
                _ = ticker.tick() => self.manager.tick(),
            }
        }

        tracing::info!("exiting TUI");
        Ok(())
    }

    fn handle_terminal_event(&mut self, event: Event, tx: &mpsc::UnboundedSender<AppEvent>) {
        let Event::Key(key) = event else {
            return;
        };

        match self.manager.handle_key(key) {
            ConversationAction::Ask(ticket) => {
                spawn_ask(self.backend.clone(), ticket, tx.clone());
            }
            ConversationAction::Exit => self.should_quit = true,
            ConversationAction::None => {}
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::AskFinished { ticket, result } => {
                self.manager.finish(ticket, result);
            }
        }
    }
}

impl Drop for TuiApp {
    fn drop(&mut self) {
        if self.keyboard_enhanced {
            let _ = execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}
