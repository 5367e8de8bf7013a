//! Audio playback surface consumed by the sync engine.
//!
//! The engine never owns audio state: it samples `current_time` and
//! `is_playing` at the moment an event is handled and issues transport
//! commands through this trait.

pub mod clock;
pub mod mpris;

pub use clock::ClockAudio;
pub use mpris::MprisAudio;

pub trait AudioControl {
    /// Current playhead in seconds.
    fn current_time(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek_to(&mut self, time: f64);

    fn toggle(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    fn seek_and_play(&mut self, time: f64) {
        self.seek_to(time);
        self.play();
    }

    /// False when there is nothing to play (no player attached).
    fn is_available(&self) -> bool {
        true
    }

    /// Track length in seconds, when known.
    fn duration(&self) -> Option<f64> {
        None
    }
}

impl<A: AudioControl + ?Sized> AudioControl for Box<A> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
    fn play(&mut self) {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn seek_to(&mut self, time: f64) {
        (**self).seek_to(time)
    }
    fn toggle(&mut self) {
        (**self).toggle()
    }
    fn seek_and_play(&mut self, time: f64) {
        (**self).seek_and_play(time)
    }
    fn is_available(&self) -> bool {
        (**self).is_available()
    }
    fn duration(&self) -> Option<f64> {
        (**self).duration()
    }
}
