//! # quiz_core - Millionaire-style trivia session engine
//!
//! A persistent, resumable state machine for a single-player quiz: pick a
//! contestant, answer their questions in difficulty order, and collect the
//! escalating prize money on the summary screen.
//!
//! ## Features
//! - Every accepted event is persisted before it returns (JSON or packed)
//! - Older browser records migrate on load; corrupt saves cold-start
//! - Audio cues go through a fire-and-forget port
//! - JSON API for front-ends that talk over a string boundary

pub mod api;
pub mod audio;
pub mod bank;
pub mod config;
pub mod error;
pub mod money;
pub mod save;
pub mod scoring;
pub mod state;

pub use api::{handle_request_json, view_json, EventRequest, EventResponse};
pub use audio::{AudioCue, AudioError, AudioPort, RecordingAudio, SilentAudio};
pub use bank::{Player, Question, QuestionBank, QuestionSet};
pub use config::{GameConfig, RevealSchedule};
pub use error::{DataError, QuizError, Result};
pub use money::Money;
pub use save::{FileStore, MemoryStore, SessionSnapshot, SessionStore, SnapshotCodec, StoreError};
pub use scoring::{AnswerResult, Ledger, ScoreSummary, ScoreTier, ScoreTiers};
pub use state::{
    DisplayState, GameEvent, GameMachine, GameView, Phase, QuestionView, ResultView, Transition,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
