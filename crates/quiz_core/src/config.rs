//! Game configuration.
//!
//! A JSON file whose every field is optional. The path comes from the caller
//! (CLI flag) or from the `QUIZ_CONFIG_PATH` environment variable.

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::save::SnapshotCodec;
use crate::scoring::ScoreTiers;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const CONFIG_PATH_ENV: &str = "QUIZ_CONFIG_PATH";

pub const DEFAULT_SAVE_PATH: &str = "saves/session.json";

/// Front-end pacing. The state machine never reads these; they ride along
/// so every UI paces reveals the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevealSchedule {
    /// Pause between confirming the start and showing the first question.
    pub start_delay_ms: u64,
    /// Pause between choosing an answer and revealing whether it was right.
    pub result_reveal_ms: u64,
}

impl Default for RevealSchedule {
    fn default() -> Self {
        Self { start_delay_ms: 1500, result_reveal_ms: 0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Question data file; the embedded sample bank when absent.
    pub questions_path: Option<PathBuf>,
    pub save_path: PathBuf,
    pub codec: SnapshotCodec,
    /// Overrides the currency label of the question data.
    pub currency: Option<String>,
    pub score_tiers: ScoreTiers,
    pub reveal_schedule: RevealSchedule,
    pub sound_enabled: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            questions_path: None,
            save_path: PathBuf::from(DEFAULT_SAVE_PATH),
            codec: SnapshotCodec::default(),
            currency: None,
            score_tiers: ScoreTiers::default(),
            reveal_schedule: RevealSchedule::default(),
            sound_enabled: true,
        }
    }
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, QuizError> {
        let config: GameConfig = serde_json::from_str(json)
            .map_err(|e| QuizError::Config(format!("Failed to parse config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, QuizError> {
        let content = fs::read_to_string(path).map_err(|e| {
            QuizError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Config from the file named by `QUIZ_CONFIG_PATH`; defaults when the
    /// variable is unset or blank.
    pub fn from_env() -> Result<Self, QuizError> {
        let Ok(path) = env::var(CONFIG_PATH_ENV) else {
            return Ok(Self::default());
        };

        let path = path.trim();
        if path.is_empty() {
            return Ok(Self::default());
        }

        Self::load(Path::new(path)).map_err(|e| match e {
            QuizError::Config(msg) => {
                QuizError::Config(format!("{} (from {}='{}')", msg, CONFIG_PATH_ENV, path))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        self.score_tiers.validate().map_err(QuizError::Config)?;
        if self.save_path.as_os_str().is_empty() {
            return Err(QuizError::Config("savePath must not be empty".to_string()));
        }
        Ok(())
    }

    /// The configured question bank.
    pub fn question_bank(&self) -> Result<QuestionBank, QuizError> {
        let bank = match &self.questions_path {
            Some(path) => QuestionBank::load(path)?,
            None => QuestionBank::builtin()?,
        };
        Ok(bank)
    }

    /// Currency label: the override, or whatever the data says.
    pub fn currency_for<'a>(&'a self, bank: &'a QuestionBank) -> &'a str {
        self.currency.as_deref().unwrap_or_else(|| bank.currency())
    }
}
