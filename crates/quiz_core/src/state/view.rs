use super::phase::{DisplayState, Phase};
use crate::bank::{Player, Question};
use crate::money::Money;
use crate::scoring::{AnswerResult, ScoreSummary};
use serde::Serialize;

/// The question on screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    /// 0-based position in the player's set.
    pub ordinal: usize,
    pub total: usize,
    /// Ordinal value of this question.
    pub value: Money,
    pub question: Question,
    pub display: DisplayState,
    pub selected_answer: Option<String>,
    /// Set once the result is showing.
    pub is_correct: Option<bool>,
}

impl QuestionView {
    /// 1-based number for display ("question 2 of 5").
    pub fn number(&self) -> usize {
        self.ordinal + 1
    }

    pub fn is_last(&self) -> bool {
        self.ordinal + 1 >= self.total
    }

    pub fn showing_result(&self) -> bool {
        self.display == DisplayState::ShowingResult
    }
}

/// One answered question on the summary screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub ordinal: usize,
    /// Question text.
    pub question: String,
    pub image_ref: Option<String>,
    pub selected_answer: String,
    pub correct_answer: String,
    pub correct_text: Option<String>,
    pub is_correct: bool,
    pub value: Money,
}

/// Everything a front-end needs to render the current screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub phase: Phase,
    /// Catalog offered on the selection screen.
    pub players: Vec<Player>,
    pub player: Option<Player>,
    pub question: Option<QuestionView>,
    /// Ledger in question order.
    pub results: Vec<AnswerResult>,
    /// Filled on the summary screen.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub review: Vec<ResultView>,
    /// Running score while playing, final score on the summary.
    pub score: Option<ScoreSummary>,
    pub sound_enabled: bool,
    pub currency: String,
}

impl GameView {
    pub fn showing_result(&self) -> bool {
        self.question.as_ref().is_some_and(QuestionView::showing_result)
    }

    pub fn format_amount(&self, amount: Money) -> String {
        amount.display_with(&self.currency)
    }
}
