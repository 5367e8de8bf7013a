use crate::model::Word;
use crate::state::Update;
use crate::sync::SyncPhase;
use crate::text_utils::{format_clock, truncate_graphemes, wrap_text};
use crate::timeline::TimelineWindow;
use crate::ui::styles::LyricStyles;
use ratatui::Terminal;
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use std::error::Error;

const HELP: &str = "space sync  s start  r resume-incomplete  p pause  x cancel  u undo  [ ] scroll  f follow  +/- zoom  w save  q quit";

/// How a word is drawn in the word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordState {
    Timed,
    /// Has a start but no end, e.g. a hold interrupted by cancel.
    Partial,
    Current,
    Holding,
    Untimed,
}

pub fn word_state(update: &Update, index: usize) -> WordState {
    if update.current_word == Some(index) && update.is_syncing() {
        return if update.phase == SyncPhase::Holding {
            WordState::Holding
        } else {
            WordState::Current
        };
    }
    match update.surface_words.get(index) {
        Some(w) if w.is_timed() => WordState::Timed,
        Some(w) if w.start_time.is_some() => WordState::Partial,
        _ => WordState::Untimed,
    }
}

/// Split words into visual lines no wider than `width` columns, keeping
/// word indices so each word can be styled.
pub fn split_words_into_lines(words: &[Word], width: usize) -> Vec<Vec<usize>> {
    let mut lines: Vec<Vec<usize>> = Vec::new();
    let mut current_line: Vec<usize> = Vec::new();
    let mut current_len = 0usize;
    for (i, w) in words.iter().enumerate() {
        let wlen = w.text.chars().count();
        let new_len = if current_line.is_empty() { wlen } else { current_len + 1 + wlen };
        if !current_line.is_empty() && width > 0 && new_len > width {
            lines.push(std::mem::take(&mut current_line));
            current_len = wlen;
        } else {
            current_len = new_len;
        }
        current_line.push(i);
    }
    if !current_line.is_empty() {
        lines.push(current_line);
    }
    lines
}

fn style_for(state: WordState, styles: &LyricStyles) -> ratatui::style::Style {
    match state {
        WordState::Timed => styles.before,
        WordState::Partial => styles.partial,
        WordState::Current => styles.current,
        WordState::Holding => styles.holding,
        WordState::Untimed => styles.after,
    }
}

pub fn word_lines<'a>(update: &'a Update, styles: &LyricStyles, width: usize) -> Vec<Line<'a>> {
    split_words_into_lines(&update.surface_words, width)
        .into_iter()
        .map(|indices| {
            let mut spans = Vec::with_capacity(indices.len() * 2);
            for (n, i) in indices.iter().enumerate() {
                if n > 0 {
                    spans.push(Span::raw(" "));
                }
                let style = style_for(word_state(update, *i), styles);
                spans.push(Span::styled(update.surface_words[*i].text.as_str(), style));
            }
            Line::from(spans)
        })
        .collect()
}

/// One character per column: `┃` where a word starts, `━` while it lasts.
/// Words ending before they start are not drawn.
pub fn timeline_cells(words: &[Word], window: &TimelineWindow, columns: u16) -> String {
    let mut cells = vec![' '; columns as usize];
    for word in words {
        let (Some(start), Some(end)) = (word.start_time, word.end_time) else {
            continue;
        };
        if end < start || end < window.start() || start > window.end() {
            continue;
        }
        let first = window.column_for(start.max(window.start()), columns);
        let last = window.column_for(end.min(window.end()), columns);
        if let (Some(first), Some(last)) = (first, last) {
            for cell in &mut cells[first as usize..=last as usize] {
                *cell = '━';
            }
            if start >= window.start() {
                cells[first as usize] = '┃';
            }
        }
    }
    cells.into_iter().collect()
}

/// Marker row with `▲` under the playhead.
pub fn playhead_cells(playhead: f64, window: &TimelineWindow, columns: u16) -> String {
    let mut cells = vec![' '; columns as usize];
    if let Some(col) = window.column_for(playhead, columns) {
        cells[col as usize] = '▲';
    }
    cells.into_iter().collect()
}

fn window_labels(window: &TimelineWindow, columns: usize) -> String {
    let left = format_clock(window.start());
    let right = format_clock(window.end());
    let follow = match (window.is_following(), window.is_fixed_zoom()) {
        (true, false) => "follow",
        (false, false) => "manual",
        (true, true) => "follow, fixed zoom",
        (false, true) => "manual, fixed zoom",
    };
    let gap = columns.saturating_sub(left.len() + right.len() + follow.len());
    let pad_left = gap / 2;
    format!(
        "{left}{}{follow}{}{right}",
        " ".repeat(pad_left),
        " ".repeat(gap - pad_left)
    )
}

pub fn status_text(update: &Update) -> String {
    let phase = match update.phase {
        SyncPhase::Idle => "idle",
        SyncPhase::Armed => "armed",
        SyncPhase::Holding => "holding",
        SyncPhase::Paused => "paused",
    };
    let (timed, total) = update.progress();
    let transport = if update.playing { "▶" } else { "⏸" };
    format!(
        " {} {}  {}  {}/{} timed  {}",
        transport,
        format_clock(update.playhead),
        phase,
        timed,
        total,
        update.surface_label()
    )
}

/// Draw the editor: word list, timeline strip, status and key help.
pub fn draw_ui<B: Backend>(
    terminal: &mut Terminal<B>,
    update: &Option<Update>,
    styles: &LyricStyles,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    terminal
        .draw(|f| {
            let area = f.area();
            let Some(update) = update else {
                let waiting = Paragraph::new("waiting for session…").alignment(Alignment::Center);
                f.render_widget(waiting, area);
                return;
            };
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Min(3),
                    Constraint::Length(5),
                    Constraint::Length(1),
                    Constraint::Length(1),
                    Constraint::Length(1),
                ])
                .split(area);

            let inner_width = chunks[0].width.saturating_sub(2) as usize;
            let title = truncate_graphemes(&update.surface_label(), inner_width);
            let words = Paragraph::new(word_lines(update, styles, inner_width))
                .block(Block::default().borders(Borders::ALL).title(title))
                .alignment(Alignment::Center);
            f.render_widget(words, chunks[0]);

            let columns = chunks[1].width.saturating_sub(2);
            let strip = vec![
                Line::from(Span::styled(
                    timeline_cells(&update.surface_words, &update.window, columns),
                    styles.word_span,
                )),
                Line::from(Span::styled(
                    playhead_cells(update.playhead, &update.window, columns),
                    styles.playhead,
                )),
                Line::from(window_labels(&update.window, columns as usize)),
            ];
            let timeline = Paragraph::new(strip).block(Block::default().borders(Borders::ALL).title("timeline"));
            f.render_widget(timeline, chunks[1]);

            f.render_widget(Paragraph::new(status_text(update)).style(styles.status), chunks[2]);
            if let Some(message) = &update.message {
                let text = wrap_text(message, area.width as usize).into_iter().next().unwrap_or_default();
                f.render_widget(Paragraph::new(Span::styled(text, styles.message)), chunks[3]);
            }
            let help = truncate_graphemes(HELP, area.width as usize);
            f.render_widget(Paragraph::new(Span::styled(help, styles.after)), chunks[4]);
        })
        .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn timed(text: &str, start: f64, end: f64) -> Word {
        Word {
            start_time: Some(start),
            end_time: Some(end),
            ..Word::untimed(text, text)
        }
    }

    fn update_with(words: Vec<Word>, phase: SyncPhase, current: Option<usize>) -> Update {
        Update {
            surface_words: Arc::new(words),
            phase,
            current_word: current,
            ..Update::default()
        }
    }

    #[test]
    fn test_word_states() {
        let mut partial = Word::untimed("p", "p");
        partial.start_time = Some(2.0);
        let words = vec![timed("a", 0.0, 1.0), partial, Word::untimed("c", "c"), Word::untimed("d", "d")];
        let update = update_with(words, SyncPhase::Holding, Some(2));
        assert_eq!(word_state(&update, 0), WordState::Timed);
        assert_eq!(word_state(&update, 1), WordState::Partial);
        assert_eq!(word_state(&update, 2), WordState::Holding);
        assert_eq!(word_state(&update, 3), WordState::Untimed);

        let idle = update_with(update.surface_words.to_vec(), SyncPhase::Idle, None);
        assert_eq!(word_state(&idle, 2), WordState::Untimed);
    }

    #[test]
    fn test_split_words_into_lines() {
        let words: Vec<Word> = ["aaa", "bb", "cccc", "d"].iter().map(|t| Word::untimed(*t, *t)).collect();
        assert_eq!(split_words_into_lines(&words, 6), vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(split_words_into_lines(&words, 0), vec![vec![0, 1, 2, 3]]);
        assert!(split_words_into_lines(&[], 10).is_empty());
    }

    #[test]
    fn test_timeline_cells() {
        let window = TimelineWindow::new(0.0, 10.0, None);
        let words = vec![timed("a", 1.0, 2.9), Word::untimed("b", "b"), timed("c", 5.0, 5.5)];
        assert_eq!(timeline_cells(&words, &window, 10), " ┃━  ┃    ");
    }

    #[test]
    fn test_inverted_word_is_not_drawn() {
        let window = TimelineWindow::new(0.0, 10.0, None);
        let words = vec![timed("bad", 5.0, 3.0), timed("ok", 7.0, 7.5)];
        assert_eq!(timeline_cells(&words, &window, 10), "       ┃  ");
    }

    #[test]
    fn test_window_labels_show_fixed_zoom() {
        let window = TimelineWindow::for_replace_all(Some(200.0));
        assert!(window_labels(&window, 40).contains("fixed zoom"));
        let free = TimelineWindow::new(0.0, 10.0, None);
        assert!(!window_labels(&free, 40).contains("fixed zoom"));
    }

    #[test]
    fn test_word_clipped_by_window_has_no_start_marker() {
        let window = TimelineWindow::new(2.0, 10.0, None);
        let words = vec![timed("a", 1.0, 3.0)];
        assert_eq!(timeline_cells(&words, &window, 10), "━━        ");
    }

    #[test]
    fn test_playhead_cells() {
        let window = TimelineWindow::new(0.0, 10.0, None);
        assert_eq!(playhead_cells(4.2, &window, 10), "    ▲     ");
        assert_eq!(playhead_cells(40.0, &window, 10), "          ");
    }

    #[test]
    fn test_status_text_mentions_phase_and_progress() {
        let update = update_with(vec![timed("a", 0.0, 1.0), Word::untimed("b", "b")], SyncPhase::Armed, Some(1));
        let text = status_text(&update);
        assert!(text.contains("armed"));
        assert!(text.contains("1/2 timed"));
    }
}
