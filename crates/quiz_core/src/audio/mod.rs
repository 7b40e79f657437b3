//! Audio cue port.
//!
//! The state machine announces transitions through [`AudioPort`] and never
//! waits on it or looks at its outcome: a failing or missing audio device has
//! no effect on the game.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Audio unavailable: {0}")]
    Unavailable(String),
}

/// Everything the game can ask the audio side to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "cue")]
pub enum AudioCue {
    BeforeSelection,
    GameStart,
    Answered { correct: bool },
    SuspenseStart,
    SuspenseStop,
    Victory,
    MuteAll,
    UnmuteAll,
}

/// Sink for audio cues. Implementors only provide [`AudioPort::play`].
pub trait AudioPort {
    /// Acquire the output device. Called once when a machine boots.
    fn init(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    /// Release the output device.
    fn dispose(&mut self) {}

    fn play(&mut self, cue: AudioCue) -> Result<(), AudioError>;

    fn notify_before_selection(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::BeforeSelection)
    }

    fn notify_game_start(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::GameStart)
    }

    fn notify_answered(&mut self, correct: bool) -> Result<(), AudioError> {
        self.play(AudioCue::Answered { correct })
    }

    fn notify_suspense_start(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::SuspenseStart)
    }

    fn notify_suspense_stop(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::SuspenseStop)
    }

    fn notify_victory(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::Victory)
    }

    fn mute_all(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::MuteAll)
    }

    fn unmute_all(&mut self) -> Result<(), AudioError> {
        self.play(AudioCue::UnmuteAll)
    }
}

/// Discards every cue.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioPort for SilentAudio {
    fn play(&mut self, _cue: AudioCue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Keeps every cue it receives, in order. Can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    cues: Vec<AudioCue>,
    failing: bool,
    disposed: bool,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// A port whose every call fails, still recording what was attempted.
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }

    pub fn cues(&self) -> &[AudioCue] {
        &self.cues
    }

    pub fn take(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl AudioPort for RecordingAudio {
    fn init(&mut self) -> Result<(), AudioError> {
        if self.failing {
            return Err(AudioError::Unavailable("no output device".to_string()));
        }
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn play(&mut self, cue: AudioCue) -> Result<(), AudioError> {
        self.cues.push(cue);
        if self.failing {
            return Err(AudioError::Unavailable("no output device".to_string()));
        }
        Ok(())
    }
}

/// The machine's side of the port: swallows failures and keeps the suspense
/// cue balanced so a started loop is always stopped exactly once.
#[derive(Debug)]
pub(crate) struct CueDispatcher<A> {
    port: A,
    suspense_playing: bool,
}

impl<A: AudioPort> CueDispatcher<A> {
    pub(crate) fn new(mut port: A) -> Self {
        if let Err(e) = port.init() {
            log::debug!("Audio init failed, continuing without sound: {}", e);
        }
        Self { port, suspense_playing: false }
    }

    pub(crate) fn port(&self) -> &A {
        &self.port
    }

    pub(crate) fn port_mut(&mut self) -> &mut A {
        &mut self.port
    }

    pub(crate) fn suspense_playing(&self) -> bool {
        self.suspense_playing
    }

    pub(crate) fn emit(&mut self, cue: AudioCue) {
        let outcome = match cue {
            AudioCue::BeforeSelection => self.port.notify_before_selection(),
            AudioCue::GameStart => self.port.notify_game_start(),
            AudioCue::Answered { correct } => self.port.notify_answered(correct),
            AudioCue::SuspenseStart => self.port.notify_suspense_start(),
            AudioCue::SuspenseStop => self.port.notify_suspense_stop(),
            AudioCue::Victory => self.port.notify_victory(),
            AudioCue::MuteAll => self.port.mute_all(),
            AudioCue::UnmuteAll => self.port.unmute_all(),
        };
        if let Err(e) = outcome {
            log::debug!("Audio cue {:?} dropped: {}", cue, e);
        }
    }

    pub(crate) fn start_suspense(&mut self) {
        if !self.suspense_playing {
            self.suspense_playing = true;
            self.emit(AudioCue::SuspenseStart);
        }
    }

    pub(crate) fn stop_suspense(&mut self) {
        if self.suspense_playing {
            self.suspense_playing = false;
            self.emit(AudioCue::SuspenseStop);
        }
    }

    /// Stop anything still running and release the port.
    pub(crate) fn shutdown(mut self) -> A {
        self.stop_suspense();
        self.port.dispose();
        self.port
    }
}
