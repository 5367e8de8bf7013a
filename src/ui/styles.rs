use ratatui::style::{Color, Modifier, Style};

/// Word styling by timing state: `before` is already timed, `current` is the
/// word the next press will time, `after` is still untimed.
pub struct LyricStyles {
    pub before: Style,
    pub current: Style,
    pub holding: Style,
    pub after: Style,
    pub partial: Style,
    pub playhead: Style,
    pub word_span: Style,
    pub status: Style,
    pub message: Style,
}

impl Default for LyricStyles {
    fn default() -> Self {
        Self {
            before: Style::default().fg(Color::Green),
            current: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            holding: Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
            after: Style::default().add_modifier(Modifier::DIM),
            partial: Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
            playhead: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            word_span: Style::default().fg(Color::Cyan),
            status: Style::default().add_modifier(Modifier::REVERSED),
            message: Style::default().fg(Color::Magenta),
        }
    }
}
