//! Full-screen terminal editor for manual word timing.
//!
//! The event loop uses `tokio::select!` to handle:
//! - Session snapshots from the actor in `pool`
//! - Keyboard input, translated by `event::map_key` and forwarded to the actor
//!
//! Space release is only observable when the terminal speaks the kitty
//! keyboard protocol; otherwise every press is delivered as a tap.

use crate::event::{Event as SessionEvent, map_key};
use crate::pool::{self, Session};
use crate::state::Update;
use crate::store::CorrectionData;
use crate::sync::StartPoint;
use crate::ui::modern_helpers::draw_ui;
use crate::ui::styles::LyricStyles;
use crossterm::{
    event::{
        Event, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Instant;
use tokio::sync::mpsc;

/// UI state for the modern TUI mode
pub struct ModernUIState {
    pub last_update: Option<Update>,
    pub should_exit: bool,
    /// Whether the terminal reports key releases.
    pub release_events: bool,
}

impl ModernUIState {
    pub fn new(release_events: bool) -> Self {
        Self {
            last_update: None,
            should_exit: false,
            release_events,
        }
    }
}

/// Run the editor until the user quits; returns the edited document.
pub async fn run_modern(
    session: Session,
    output: Option<PathBuf>,
    autostart: Option<StartPoint>,
) -> Result<CorrectionData, Box<dyn std::error::Error + Send + Sync>> {
    let (update_tx, mut update_rx) = mpsc::channel(32);
    let (session_tx, session_rx) = mpsc::channel(64);
    let actor = tokio::spawn(pool::listen(session, update_tx, session_rx, output));

    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).map_err(to_boxed_err)?;
    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .map_err(to_boxed_err)?;
    }
    tracing::info!(release_events, "terminal ready");

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).map_err(to_boxed_err)?;
    let styles = LyricStyles::default();
    let mut state = ModernUIState::new(release_events);

    if let Some(from) = autostart {
        let _ = session_tx.send(crate::event::Command::Start(from).into()).await;
    }

    // Single OS thread reads terminal events and forwards them; it exits
    // once the receiver is dropped.
    let (event_tx, mut event_rx) = mpsc::channel(64);
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(std::time::Duration::from_millis(100)) {
                Ok(true) => {
                    if !forward_read(crossterm::event::read(), &event_tx) {
                        break;
                    }
                }
                Ok(false) => {
                    if event_tx.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "terminal event poll failed");
                    std::thread::sleep(std::time::Duration::from_millis(100));
                }
            }
        }
    });

    let result = run_loop(&mut terminal, &mut state, &styles, &mut update_rx, &mut event_rx, &session_tx).await;

    // Restore the terminal before reporting anything.
    if state.release_events {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(io::stdout(), LeaveAlternateScreen).map_err(to_boxed_err)?;
    result?;

    // Nobody reads snapshots any more; the actor must not block on them.
    drop(update_rx);
    let _ = session_tx.send(SessionEvent::Shutdown).await;
    drop(session_tx);
    actor.await.map_err(to_boxed_err)
}

async fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    state: &mut ModernUIState,
    styles: &LyricStyles,
    update_rx: &mut mpsc::Receiver<Update>,
    event_rx: &mut mpsc::Receiver<Event>,
    session_tx: &mpsc::Sender<SessionEvent>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    draw_ui(terminal, &state.last_update, styles)?;
    while !state.should_exit {
        tokio::select! {
            biased;

            maybe_event = event_rx.recv() => {
                match maybe_event {
                    Some(Event::Resize(..)) => draw_ui(terminal, &state.last_update, styles)?,
                    Some(event) => process_event(event, state, session_tx).await,
                    None => state.should_exit = true,
                }
            }

            update = update_rx.recv() => {
                match update {
                    Some(update) => {
                        state.last_update = Some(update);
                        draw_ui(terminal, &state.last_update, styles)?;
                    }
                    None => state.should_exit = true,
                }
            }
        }
    }
    Ok(())
}

/// Handle user input events (keyboard)
async fn process_event(event: Event, state: &mut ModernUIState, session_tx: &mpsc::Sender<SessionEvent>) {
    let Event::Key(key) = event else {
        return;
    };
    for ev in map_key(&key, state.release_events, Instant::now()) {
        if ev == SessionEvent::Shutdown {
            state.should_exit = true;
            return;
        }
        if session_tx.send(ev).await.is_err() {
            state.should_exit = true;
            return;
        }
    }
}

/// Hand one terminal read to the UI loop. Read errors are logged and
/// skipped; returns false once the loop has gone away.
fn forward_read(read: io::Result<Event>, event_tx: &mpsc::Sender<Event>) -> bool {
    match read {
        Ok(ev) => event_tx.blocking_send(ev).is_ok(),
        Err(e) => {
            tracing::debug!(error = %e, "terminal event read failed");
            true
        }
    }
}

fn to_boxed_err<E: std::error::Error + Send + Sync + 'static>(
    e: E,
) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_is_skipped_and_reader_keeps_going() {
        let (tx, mut rx) = mpsc::channel(4);
        assert!(forward_read(Err(io::Error::other("tty gone")), &tx));
        assert!(rx.try_recv().is_err());

        assert!(forward_read(Ok(Event::FocusGained), &tx));
        assert_eq!(rx.try_recv().ok(), Some(Event::FocusGained));

        drop(rx);
        assert!(!forward_read(Ok(Event::FocusLost), &tx));
    }
}
