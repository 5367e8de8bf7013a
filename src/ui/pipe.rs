use crate::event::{Event, parse_pipe_command};
use crate::model::Word;
use crate::pool::{self, Session};
use crate::store::CorrectionData;
use crate::sync::StartPoint;
use crate::text_utils::format_optional_secs;
use std::path::PathBuf;
use std::io::{self, BufRead};
use std::thread;
use std::time::Instant;
use tokio::sync::mpsc;

/// Indices whose timing differs between two snapshots of the same surface.
pub fn changed_words(prev: &[Word], next: &[Word]) -> Vec<usize> {
    next.iter()
        .enumerate()
        .filter(|(i, w)| {
            prev.get(*i)
                .is_none_or(|p| p.start_time != w.start_time || p.end_time != w.end_time)
        })
        .map(|(i, _)| i)
        .collect()
}

pub fn format_word_line(index: usize, word: &Word) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        index,
        format_optional_secs(word.start_time),
        format_optional_secs(word.end_time),
        word.text
    )
}

/// Line-oriented mode: commands are read from stdin (see
/// [`parse_pipe_command`]) and every word whose timing changes is printed
/// as `index<TAB>start<TAB>end<TAB>text`.
pub async fn run_pipe(
    session: Session,
    output: Option<PathBuf>,
    autostart: Option<StartPoint>,
) -> Result<CorrectionData, Box<dyn std::error::Error + Send + Sync>> {
    let (update_tx, mut update_rx) = mpsc::channel(32);
    let (session_tx, session_rx) = mpsc::channel(64);
    let actor = tokio::spawn(pool::listen(session, update_tx, session_rx, output));

    if let Some(from) = autostart {
        let _ = session_tx.send(crate::event::Command::Start(from).into()).await;
    }

    // Plain OS thread: a blocked stdin read must not hold up runtime shutdown.
    let input_tx = session_tx.clone();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match parse_pipe_command(&line, Instant::now()) {
                Ok(events) => {
                    for ev in events {
                        if input_tx.blocking_send(ev).is_err() {
                            return;
                        }
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        let _ = input_tx.blocking_send(Event::Shutdown);
    });
    drop(session_tx);

    let mut last_words: Option<std::sync::Arc<Vec<Word>>> = None;
    let mut last_message: Option<String> = None;
    while let Some(upd) = update_rx.recv().await {
        // The first snapshot and surface switches only establish a baseline.
        if let Some(prev) = &last_words
            && prev.len() == upd.surface_words.len()
        {
            for i in changed_words(prev, &upd.surface_words) {
                println!("{}", format_word_line(i, &upd.surface_words[i]));
            }
        }
        last_words = Some(upd.surface_words.clone());
        if let Some(message) = &upd.message
            && upd.message != last_message
        {
            eprintln!("{message}");
            last_message = upd.message.clone();
        }
    }
    actor.await.map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
}
