// pool.rs: Session actor owning the engine, the document and the timeline

use crate::audio::AudioControl;
use crate::event::{Command, Event};
use crate::model::{Segment, Word};
use crate::replace_all::SongLayout;
use crate::state::{StateBundle, Surface, Update};
use crate::store::{self, CorrectionData};
use crate::sync::{SyncEngine, SyncMode, SyncTiming};
use crate::timeline::TimelineWindow;
use std::path::PathBuf;
use tokio::sync::mpsc;

pub type BoxedAudio = Box<dyn AudioControl + Send>;
type Sink = Box<dyn FnMut(Vec<Word>) + Send>;

enum Target {
    Segment(usize),
    WholeSong(SongLayout),
}

/// Everything the editing session owns. All mutation happens through
/// [`Session::handle_event`] and [`Session::tick`], called from one task.
pub struct Session {
    engine: SyncEngine<BoxedAudio, Sink>,
    published: mpsc::UnboundedReceiver<Vec<Word>>,
    doc: CorrectionData,
    target: Target,
    state: StateBundle,
}

impl Session {
    /// Open a session on `segment` of `doc`, or on the whole song when
    /// `whole_song` is set.
    pub fn new(audio: BoxedAudio, doc: CorrectionData, segment: usize, whole_song: bool, timing: SyncTiming) -> Self {
        let (tx, published) = mpsc::unbounded_channel();
        let sink: Sink = Box::new(move |words| {
            let _ = tx.send(words);
        });
        let track_length = audio.duration();
        let (mode, target, window) = if whole_song {
            let (layout, _) = SongLayout::flatten(&doc.corrected_segments);
            (SyncMode::WholeSong, Target::WholeSong(layout), TimelineWindow::for_replace_all(track_length))
        } else {
            let index = segment.min(doc.corrected_segments.len().saturating_sub(1));
            let window = doc
                .corrected_segments
                .get(index)
                .map(|s| TimelineWindow::around(s.start_time, s.end_time, track_length))
                .unwrap_or_else(|| TimelineWindow::new(0.0, 10.0, track_length));
            (SyncMode::Segment, Target::Segment(index), window)
        };
        let surface = match target {
            Target::Segment(i) => Surface::Segment(i),
            Target::WholeSong(_) => Surface::WholeSong,
        };
        let state = StateBundle::new(doc.corrected_segments.clone(), surface, window);
        let mut session = Self {
            engine: SyncEngine::new(audio, sink, timing, mode),
            published,
            doc,
            target,
            state,
        };
        session.open_surface();
        session
    }

    pub fn document(&self) -> &CorrectionData {
        &self.doc
    }

    pub fn into_document(self) -> CorrectionData {
        self.doc
    }

    pub fn is_active(&self) -> bool {
        self.engine.is_active()
    }

    /// The segment the engine times: the selected line, or every line
    /// flattened into one.
    pub fn surface_segment(&self) -> Option<Segment> {
        match &self.target {
            Target::Segment(i) => self.doc.corrected_segments.get(*i).cloned(),
            Target::WholeSong(_) => Some(SongLayout::flatten(&self.doc.corrected_segments).1),
        }
    }

    fn open_surface(&mut self) {
        if let Some(segment) = self.surface_segment() {
            self.engine.open(&segment);
            self.state.set_surface_words(segment.words);
        }
    }

    /// Apply one event. Returns false on shutdown.
    pub fn handle_event(&mut self, event: Event) -> bool {
        let was_active = self.engine.is_active();
        match event {
            Event::Key(input) => self.engine.handle_key(input),
            Event::Command(cmd) => self.handle_command(cmd),
            Event::Shutdown => {
                self.engine.cancel();
                self.drain_published();
                return false;
            }
        }
        self.drain_published();
        if was_active && !self.engine.is_active() && self.surface_complete() {
            self.state.set_message("every word timed");
        }
        self.state.bump();
        true
    }

    fn surface_complete(&self) -> bool {
        self.engine.segment().is_some_and(Segment::is_fully_timed)
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Start(from) => {
                let segment = self.surface_segment();
                if self.engine.start(segment.as_ref(), from) {
                    self.state.window.enable_follow();
                    self.state.message = None;
                }
            }
            Command::Pause => self.engine.pause(),
            Command::Resume => self.resume(),
            Command::TogglePause => {
                if self.engine.is_paused() {
                    self.resume();
                } else {
                    self.engine.pause();
                }
            }
            Command::Cancel => self.engine.cancel(),
            Command::Scroll(fraction) => {
                let delta = fraction * self.state.window.width();
                self.state.window.scroll_by(delta);
            }
            Command::Zoom(factor) => self.state.window.zoom(factor),
            Command::Follow => self.state.window.enable_follow(),
            Command::Select(delta) => self.select(delta),
            Command::Undo => self.undo(),
            // Writing needs the output path; `listen` handles it.
            Command::Save => {}
        }
    }

    fn resume(&mut self) {
        self.engine.resume();
        if self.engine.is_active() {
            self.state.window.enable_follow();
        }
    }

    fn select(&mut self, delta: isize) {
        if self.engine.is_active() {
            return;
        }
        let Target::Segment(current) = self.target else {
            return;
        };
        let len = self.doc.corrected_segments.len();
        if len == 0 {
            return;
        }
        let next = current.saturating_add_signed(delta).min(len - 1);
        if next == current {
            return;
        }
        self.target = Target::Segment(next);
        self.state.surface = Surface::Segment(next);
        if let Some(segment) = self.doc.corrected_segments.get(next) {
            self.state.window = TimelineWindow::around(
                segment.start_time,
                segment.end_time,
                self.engine.audio().duration(),
            );
        }
        self.open_surface();
    }

    /// Clear the last word that carries a timestamp before the cursor (or
    /// anywhere, when idle) and hand the edit to the engine.
    fn undo(&mut self) {
        let Some(segment) = self.engine.segment().cloned().or_else(|| self.surface_segment()) else {
            return;
        };
        let mut words = segment.words;
        let limit = self.engine.current_word_index().unwrap_or(words.len()).min(words.len());
        let Some(index) = words[..limit]
            .iter()
            .rposition(|w| w.start_time.is_some() || w.end_time.is_some())
        else {
            return;
        };
        words[index].start_time = None;
        words[index].end_time = None;
        tracing::debug!(index, "cleared word timing");
        self.apply_words(words.clone());
        self.engine.reconcile(words);
    }

    fn drain_published(&mut self) {
        while let Ok(words) = self.published.try_recv() {
            self.apply_words(words);
        }
    }

    /// Write the surface's words back into the document.
    fn apply_words(&mut self, words: Vec<Word>) {
        match &self.target {
            Target::Segment(i) => {
                if let Some(segment) = self.doc.corrected_segments.get_mut(*i) {
                    segment.set_words(words.clone());
                }
            }
            Target::WholeSong(layout) => {
                self.doc.corrected_segments = layout.split(words.clone());
            }
        }
        self.state.set_segments(self.doc.corrected_segments.clone());
        self.state.set_surface_words(words);
    }

    /// Supervision tick: auto-stop and timeline follow. Returns true when
    /// anything visible changed.
    pub fn tick(&mut self) -> bool {
        let stopped = self.engine.check_auto_stop();
        if stopped {
            self.state.set_message("playback passed the end of the line, sync stopped");
        }
        let advancing = self.engine.is_active() && !self.engine.is_paused() && self.engine.audio().is_playing();
        let playhead = self.engine.audio().current_time();
        let scrolled = self.state.window.follow_playhead(playhead, advancing);
        if scrolled {
            self.state.bump();
        }
        stopped || scrolled || self.engine.audio().is_playing()
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.state.set_message(message);
    }

    pub fn snapshot(&self) -> Update {
        let audio = self.engine.audio();
        let mut update = self.state.snapshot(
            self.engine.phase(),
            self.engine.current_word_index(),
            audio.current_time(),
            audio.is_playing(),
        );
        if let Target::WholeSong(layout) = &self.target {
            update.current_line = update
                .current_word
                .and_then(|i| layout.locate(i))
                .map(|(line, _)| line);
        }
        update
    }
}

async fn send_update(update: Update, update_tx: &mpsc::Sender<Update>) -> bool {
    update_tx.send(update).await.is_ok()
}

async fn save_to(session: &mut Session, output: Option<&PathBuf>) {
    let Some(path) = output else {
        session.note("no output path configured");
        return;
    };
    match store::save(path, session.document()).await {
        Ok(()) => session.note(format!("saved {}", path.display())),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "save failed");
            session.note(format!("save failed: {e}"));
        }
    }
}

/// Run the session until shutdown or until the event channel closes, then
/// return the edited document.
pub async fn listen(
    mut session: Session,
    update_tx: mpsc::Sender<Update>,
    mut event_rx: mpsc::Receiver<Event>,
    output: Option<PathBuf>,
) -> CorrectionData {
    let mut ticker = tokio::time::interval(crate::sync::timing::SUPERVISION_PERIOD);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let initial = session.snapshot();
    send_update(initial, &update_tx).await;

    loop {
        tokio::select! {
            maybe_event = event_rx.recv() => {
                let Some(event) = maybe_event else {
                    session.handle_event(Event::Shutdown);
                    break;
                };
                if event == Event::Command(Command::Save) {
                    save_to(&mut session, output.as_ref()).await;
                }
                let running = session.handle_event(event);
                let update = session.snapshot();
                send_update(update, &update_tx).await;
                if !running {
                    break;
                }
            }
            _ = ticker.tick() => {
                if session.tick() {
                    let update = session.snapshot();
                    if !send_update(update, &update_tx).await {
                        break;
                    }
                }
            }
        }
    }
    tracing::debug!("session actor stopped");
    session.into_document()
}
