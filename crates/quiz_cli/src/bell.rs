//! Terminal bell as the game's audio device.

use quiz_core::{AudioCue, AudioError, AudioPort};
use std::io::{self, Write};

const BEL: &[u8] = b"\x07";

/// Rings the terminal bell for game start, answers and the final summary.
/// Loops (suspense) have no terminal equivalent and are ignored.
pub struct TerminalBell<W: Write> {
    out: W,
    muted: bool,
}

impl TerminalBell<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out, muted: false }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn ring(&mut self, times: usize) -> Result<(), AudioError> {
        for _ in 0..times {
            self.out.write_all(BEL).map_err(|e| AudioError::Unavailable(e.to_string()))?;
        }
        self.out.flush().map_err(|e| AudioError::Unavailable(e.to_string()))
    }
}

impl<W: Write> AudioPort for TerminalBell<W> {
    fn play(&mut self, cue: AudioCue) -> Result<(), AudioError> {
        match cue {
            AudioCue::MuteAll => {
                self.muted = true;
                Ok(())
            }
            AudioCue::UnmuteAll => {
                self.muted = false;
                Ok(())
            }
            _ if self.muted => Ok(()),
            AudioCue::GameStart | AudioCue::Answered { correct: true } => self.ring(1),
            AudioCue::Answered { correct: false } => self.ring(2),
            AudioCue::Victory => self.ring(3),
            AudioCue::BeforeSelection | AudioCue::SuspenseStart | AudioCue::SuspenseStop => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rings_per_cue() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.notify_game_start().unwrap();
        bell.notify_answered(false).unwrap();
        bell.notify_suspense_start().unwrap();
        assert_eq!(bell.into_inner(), b"\x07\x07\x07".to_vec());
    }

    #[test]
    fn test_muted_bell_is_silent() {
        let mut bell = TerminalBell::new(Vec::new());
        bell.mute_all().unwrap();
        assert!(bell.is_muted());
        bell.notify_victory().unwrap();
        bell.unmute_all().unwrap();
        bell.notify_answered(true).unwrap();
        assert_eq!(bell.into_inner(), b"\x07".to_vec());
    }
}
