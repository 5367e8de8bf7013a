//! Events consumed by the session actor and the terminal key map that
//! produces them.

use crate::sync::{KeyInput, StartPoint};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Instant;

/// Timeline scroll step as a fraction of the visible width.
pub const SCROLL_STEP: f64 = 0.25;
pub const ZOOM_IN: f64 = 0.8;
pub const ZOOM_OUT: f64 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Start(StartPoint),
    Pause,
    Resume,
    TogglePause,
    Cancel,
    /// Scroll by a fraction of the window width.
    Scroll(f64),
    Zoom(f64),
    Follow,
    /// Move the line selection; ignored while syncing.
    Select(isize),
    /// Clear the most recently timed word and move the cursor back to it.
    Undo,
    Save,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Key(KeyInput),
    Command(Command),
    Shutdown,
}

impl From<Command> for Event {
    fn from(cmd: Command) -> Self {
        Event::Command(cmd)
    }
}

/// Translate one terminal key event.
///
/// With `release_events` the terminal reports presses and releases
/// separately; without it every space press is delivered as an immediate
/// down/up pair, which the engine classifies as a tap.
pub fn map_key(key: &KeyEvent, release_events: bool, now: Instant) -> Vec<Event> {
    if key.code == KeyCode::Char(' ') {
        return match key.kind {
            KeyEventKind::Press if !release_events => vec![
                Event::Key(KeyInput::space_down(now)),
                Event::Key(KeyInput::space_up(now)),
            ],
            KeyEventKind::Press | KeyEventKind::Repeat => vec![Event::Key(KeyInput::space_down(now))],
            KeyEventKind::Release => vec![Event::Key(KeyInput::space_up(now))],
        };
    }

    let repeatable = matches!(key.code, KeyCode::Char('[') | KeyCode::Char(']'));
    match key.kind {
        KeyEventKind::Press => {}
        KeyEventKind::Repeat if repeatable => {}
        _ => return Vec::new(),
    }

    let cmd = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return vec![Event::Shutdown];
        }
        KeyCode::Char('q') => return vec![Event::Shutdown],
        KeyCode::Char('s') => Command::Start(StartPoint::Beginning),
        KeyCode::Char('r') => Command::Start(StartPoint::FirstIncomplete),
        KeyCode::Char('p') => Command::TogglePause,
        KeyCode::Char('x') | KeyCode::Esc => Command::Cancel,
        KeyCode::Char('[') => Command::Scroll(-SCROLL_STEP),
        KeyCode::Char(']') => Command::Scroll(SCROLL_STEP),
        KeyCode::Char('f') => Command::Follow,
        KeyCode::Char('+') | KeyCode::Char('=') => Command::Zoom(ZOOM_IN),
        KeyCode::Char('-') => Command::Zoom(ZOOM_OUT),
        KeyCode::Up | KeyCode::Char('k') => Command::Select(-1),
        KeyCode::Down | KeyCode::Char('j') => Command::Select(1),
        KeyCode::Char('u') => Command::Undo,
        KeyCode::Char('w') => Command::Save,
        _ => return Vec::new(),
    };
    vec![cmd.into()]
}

/// Parse one line of pipe-mode input.
///
/// Recognised: `down`, `up`, `tap`, `start`, `resume-from-incomplete`,
/// `start-at <n>`, `pause`, `resume`, `cancel`, `undo`, `save`, `quit`.
/// Blank lines and `#` comments yield nothing.
pub fn parse_pipe_command(line: &str, now: Instant) -> Result<Vec<Event>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(Vec::new());
    }
    let mut parts = line.split_whitespace();
    let verb = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next();
    let events = match verb.as_str() {
        "down" => vec![Event::Key(KeyInput::space_down(now))],
        "up" => vec![Event::Key(KeyInput::space_up(now))],
        "tap" => vec![
            Event::Key(KeyInput::space_down(now)),
            Event::Key(KeyInput::space_up(now)),
        ],
        "start" => vec![Command::Start(StartPoint::Beginning).into()],
        "resume-from-incomplete" => vec![Command::Start(StartPoint::FirstIncomplete).into()],
        "start-at" => {
            let index = arg
                .and_then(|a| a.parse::<usize>().ok())
                .ok_or_else(|| format!("start-at needs a word index: {line}"))?;
            vec![Command::Start(StartPoint::At(index)).into()]
        }
        "pause" => vec![Command::Pause.into()],
        "resume" => vec![Command::Resume.into()],
        "cancel" => vec![Command::Cancel.into()],
        "undo" => vec![Command::Undo.into()],
        "save" => vec![Command::Save.into()],
        "quit" | "exit" => vec![Event::Shutdown],
        _ => return Err(format!("unknown command: {line}")),
    };
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::KeyKind;
    use rstest::rstest;

    fn key(code: KeyCode, kind: KeyEventKind) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, kind)
    }

    fn kinds(events: &[Event]) -> Vec<KeyKind> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Key(k) => Some(k.kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_space_without_release_support_is_a_tap() {
        let events = map_key(&key(KeyCode::Char(' '), KeyEventKind::Press), false, Instant::now());
        assert_eq!(kinds(&events), vec![KeyKind::Down, KeyKind::Up]);
    }

    #[test]
    fn test_space_with_release_support_splits_press_and_release() {
        let now = Instant::now();
        let press = map_key(&key(KeyCode::Char(' '), KeyEventKind::Press), true, now);
        let repeat = map_key(&key(KeyCode::Char(' '), KeyEventKind::Repeat), true, now);
        let release = map_key(&key(KeyCode::Char(' '), KeyEventKind::Release), true, now);
        assert_eq!(kinds(&press), vec![KeyKind::Down]);
        assert_eq!(kinds(&repeat), vec![KeyKind::Down]);
        assert_eq!(kinds(&release), vec![KeyKind::Up]);
    }

    #[rstest]
    #[case(KeyCode::Char('s'), Command::Start(StartPoint::Beginning))]
    #[case(KeyCode::Char('r'), Command::Start(StartPoint::FirstIncomplete))]
    #[case(KeyCode::Char('p'), Command::TogglePause)]
    #[case(KeyCode::Esc, Command::Cancel)]
    #[case(KeyCode::Char(']'), Command::Scroll(SCROLL_STEP))]
    #[case(KeyCode::Char('-'), Command::Zoom(ZOOM_OUT))]
    #[case(KeyCode::Down, Command::Select(1))]
    fn test_command_keys(#[case] code: KeyCode, #[case] expected: Command) {
        let events = map_key(&key(code, KeyEventKind::Press), true, Instant::now());
        assert_eq!(events, vec![Event::Command(expected)]);
    }

    #[test]
    fn test_command_keys_ignore_release() {
        let events = map_key(&key(KeyCode::Char('s'), KeyEventKind::Release), true, Instant::now());
        assert!(events.is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(&ctrl_c, false, Instant::now()), vec![Event::Shutdown]);
        let q = key(KeyCode::Char('q'), KeyEventKind::Press);
        assert_eq!(map_key(&q, false, Instant::now()), vec![Event::Shutdown]);
    }

    #[test]
    fn test_pipe_commands() {
        let now = Instant::now();
        assert!(parse_pipe_command("  # comment", now).unwrap().is_empty());
        assert_eq!(kinds(&parse_pipe_command("tap", now).unwrap()), vec![KeyKind::Down, KeyKind::Up]);
        assert_eq!(
            parse_pipe_command("start-at 3", now).unwrap(),
            vec![Event::Command(Command::Start(StartPoint::At(3)))]
        );
        assert_eq!(parse_pipe_command("QUIT", now).unwrap(), vec![Event::Shutdown]);
        assert!(parse_pipe_command("start-at x", now).is_err());
        assert!(parse_pipe_command("dance", now).is_err());
    }
}
