//! MPRIS-backed audio surface.
//!
//! Transport commands are queued to a background task that talks D-Bus, so
//! the engine never awaits. The readable playhead is a local
//! [`PlaybackTimer`] estimate, re-anchored from Position/PlaybackStatus
//! polls and updated optimistically when a command is issued.

use crate::audio::AudioControl;
use crate::mpris::playback;
use crate::timer::{PlaybackTimer, sanitize_position};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const RESYNC_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq)]
enum PlayerCommand {
    Play,
    Pause,
    PlayPause,
    SeekTo(f64),
}

#[derive(Debug, Default)]
struct Shared {
    timer: PlaybackTimer,
    playing: bool,
    duration: Option<f64>,
    /// Commands sent but not yet acknowledged by the player; polls are not
    /// applied while this is non-zero so they cannot undo an optimistic update.
    in_flight: usize,
}

pub struct MprisAudio {
    service: String,
    shared: Arc<Mutex<Shared>>,
    cmd_tx: mpsc::UnboundedSender<PlayerCommand>,
    worker: JoinHandle<()>,
}

impl MprisAudio {
    /// Attach to `service`. Must be called from inside a tokio runtime.
    pub async fn connect(service: String, duration: Option<f64>) -> Self {
        let shared = Arc::new(Mutex::new(Shared {
            duration,
            ..Shared::default()
        }));
        resync(&service, &shared).await;

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(service.clone(), shared.clone(), cmd_rx));
        tracing::info!(service = %service, "attached to MPRIS player");
        Self {
            service,
            shared,
            cmd_tx,
            worker,
        }
    }

    fn send(&self, cmd: PlayerCommand) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.in_flight += 1;
        }
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!(service = %self.service, "MPRIS worker has stopped");
        }
    }

    fn with_shared<R>(&self, f: impl FnOnce(&mut Shared) -> R) -> Option<R> {
        self.shared.lock().ok().map(|mut guard| f(&mut guard))
    }
}

impl Drop for MprisAudio {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

impl AudioControl for MprisAudio {
    fn current_time(&self) -> f64 {
        self.with_shared(|s| s.timer.estimate(s.playing)).unwrap_or(0.0)
    }

    fn is_playing(&self) -> bool {
        self.with_shared(|s| s.playing).unwrap_or(false)
    }

    fn play(&mut self) {
        self.with_shared(|s| {
            if !s.playing {
                s.timer.mark_playing();
                s.playing = true;
            }
        });
        self.send(PlayerCommand::Play);
    }

    fn pause(&mut self) {
        self.with_shared(|s| {
            if s.playing {
                s.timer.mark_paused();
                s.playing = false;
            }
        });
        self.send(PlayerCommand::Pause);
    }

    fn toggle(&mut self) {
        self.with_shared(|s| {
            if s.playing {
                s.timer.mark_paused();
            } else {
                s.timer.mark_playing();
            }
            s.playing = !s.playing;
        });
        self.send(PlayerCommand::PlayPause);
    }

    fn seek_to(&mut self, time: f64) {
        let time = sanitize_position(time);
        self.with_shared(|s| {
            if s.playing {
                s.timer.set_position(time);
            } else {
                s.timer.reset(time);
            }
        });
        self.send(PlayerCommand::SeekTo(time));
    }

    fn is_available(&self) -> bool {
        !self.service.is_empty()
    }

    fn duration(&self) -> Option<f64> {
        self.with_shared(|s| s.duration).flatten()
    }
}

async fn run_worker(
    service: String,
    shared: Arc<Mutex<Shared>>,
    mut cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
) {
    let mut ticker = tokio::time::interval(RESYNC_INTERVAL);
    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                let result = match cmd {
                    PlayerCommand::Play => playback::play(&service).await,
                    PlayerCommand::Pause => playback::pause(&service).await,
                    PlayerCommand::PlayPause => playback::play_pause(&service).await,
                    PlayerCommand::SeekTo(t) => playback::seek_to_position(&service, t).await.map(|_| ()),
                };
                if let Err(e) = result {
                    tracing::warn!(service = %service, command = ?cmd, error = %e, "MPRIS command failed");
                }
                if let Ok(mut s) = shared.lock() {
                    s.in_flight = s.in_flight.saturating_sub(1);
                }
            }
            _ = ticker.tick() => {
                resync(&service, &shared).await;
            }
        }
    }
}

/// Re-anchor the local estimate from the player's reported state.
async fn resync(service: &str, shared: &Arc<Mutex<Shared>>) {
    let status = match playback::get_playback_status(service).await {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(service = %service, error = %e, "playback status poll failed");
            return;
        }
    };
    let position = match playback::get_position(service).await {
        Ok(p) => p,
        Err(e) => {
            tracing::debug!(service = %service, error = %e, "position poll failed");
            return;
        }
    };
    if let Ok(mut s) = shared.lock() {
        if s.in_flight > 0 {
            return;
        }
        let playing = status == "Playing";
        if playing {
            s.timer.set_position(position);
        } else {
            s.timer.reset(position);
        }
        s.playing = playing;
    }
}
