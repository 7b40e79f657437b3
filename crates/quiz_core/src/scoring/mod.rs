//! Results ledger and score derivation.

pub mod tiers;

pub use tiers::{ScoreTier, ScoreTiers};

use crate::bank::{Player, QuestionSet};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Outcome of one answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: String,
    /// Ordinal value fixed at answer time.
    pub question_value: Money,
    pub selected_answer: String,
    pub is_correct: bool,
}

/// Answers of the active session, at most one per question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    entries: HashMap<String, AnswerResult>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted sequence. Fails with the offending id when a
    /// question appears twice.
    pub fn from_results<I>(results: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = AnswerResult>,
    {
        let mut ledger = Self::new();
        for result in results {
            if ledger.entries.contains_key(&result.question_id) {
                return Err(result.question_id);
            }
            ledger.entries.insert(result.question_id.clone(), result);
        }
        Ok(ledger)
    }

    /// Insert or replace the entry for `result.question_id`.
    pub fn upsert(&mut self, result: AnswerResult) -> Option<AnswerResult> {
        self.entries.insert(result.question_id.clone(), result)
    }

    pub fn remove(&mut self, question_id: &str) -> Option<AnswerResult> {
        self.entries.remove(question_id)
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerResult> {
        self.entries.get(question_id)
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.entries.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries in question-set order. Ids the set does not know sort last,
    /// by id, so the output stays deterministic.
    pub fn ordered(&self, set: &QuestionSet) -> Vec<AnswerResult> {
        let mut results: Vec<&AnswerResult> = self.entries.values().collect();
        results.sort_by(|a, b| {
            let pa = set.position_of(&a.question_id).unwrap_or(usize::MAX);
            let pb = set.position_of(&b.question_id).unwrap_or(usize::MAX);
            pa.cmp(&pb).then_with(|| a.question_id.cmp(&b.question_id))
        });
        results.into_iter().cloned().collect()
    }
}

/// Running or final statistics of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub correct_count: usize,
    pub total_answered: usize,
    /// `None` until at least one question is answered.
    pub percentage: Option<u8>,
    pub amount_won: Money,
    pub max_possible: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScoreSummary {
    /// Pure derivation from the set, the player and the results.
    pub fn compute(set: &QuestionSet, player: &Player, results: &[AnswerResult]) -> Self {
        let correct_count = results.iter().filter(|r| r.is_correct).count();
        let total_answered = results.len();
        let amount_won = results.iter().filter(|r| r.is_correct).map(|r| r.question_value).sum();

        Self {
            correct_count,
            total_answered,
            percentage: percentage(correct_count, total_answered),
            amount_won,
            max_possible: max_possible(set, player),
            message: None,
        }
    }

    pub fn with_message(mut self, tiers: &ScoreTiers) -> Self {
        self.message = self.percentage.and_then(|p| tiers.message_for(p)).map(str::to_string);
        self
    }

    pub fn is_perfect(&self) -> bool {
        self.total_answered > 0 && self.correct_count == self.total_answered
    }
}

/// `round(100 * correct / total)` with halves rounded up, in integers.
pub fn percentage(correct: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let correct = correct.min(total) as u64;
    let total = total as u64;
    Some(((200 * correct + total) / (2 * total)) as u8)
}

/// Sum of every ordinal value in the set.
pub fn max_possible(set: &QuestionSet, player: &Player) -> Money {
    (0..set.len()).map(|i| player.question_value(i)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::test_support::petruta_bank;
    use proptest::prelude::*;

    fn result(id: &str, value: Money, correct: bool) -> AnswerResult {
        AnswerResult {
            question_id: id.to_string(),
            question_value: value,
            selected_answer: if correct { "A" } else { "B" }.to_string(),
            is_correct: correct,
        }
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(2, 3), Some(67));
        assert_eq!(percentage(1, 3), Some(33));
        assert_eq!(percentage(1, 2), Some(50));
        assert_eq!(percentage(1, 8), Some(13)); // 12.5 rounds up
        assert_eq!(percentage(0, 4), Some(0));
        assert_eq!(percentage(4, 4), Some(100));
        assert_eq!(percentage(0, 0), None);
    }

    #[test]
    fn test_petruta_summary() {
        let bank = petruta_bank();
        let set = bank.questions_for("petruta");
        let player = bank.player("petruta").unwrap();
        let results = vec![
            result("q1", Money::from_units(5), true),
            result("q2", Money::from_cents(550), false),
            result("q3", Money::from_units(6), true),
        ];

        let summary = ScoreSummary::compute(&set, player, &results);
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.total_answered, 3);
        assert_eq!(summary.percentage, Some(67));
        assert_eq!(summary.amount_won, Money::from_units(11));
        assert_eq!(summary.max_possible, Money::from_cents(1650));
        assert!(!summary.is_perfect());
    }

    #[test]
    fn test_ledger_upsert_replaces() {
        let mut ledger = Ledger::new();
        ledger.upsert(result("q1", Money::from_units(5), false));
        let previous = ledger.upsert(result("q1", Money::from_units(5), true));

        assert_eq!(ledger.len(), 1);
        assert!(!previous.unwrap().is_correct);
        assert!(ledger.get("q1").unwrap().is_correct);
    }

    #[test]
    fn test_ledger_ordered_by_set_position() {
        let bank = petruta_bank();
        let set = bank.questions_for("petruta");
        let mut ledger = Ledger::new();
        ledger.upsert(result("q3", Money::from_units(6), true));
        ledger.upsert(result("q1", Money::from_units(5), true));
        ledger.upsert(result("q2", Money::from_cents(550), true));

        let ids: Vec<String> = ledger.ordered(&set).into_iter().map(|r| r.question_id).collect();
        assert_eq!(ids, vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn test_from_results_rejects_duplicates() {
        let dup = vec![result("q1", Money::ZERO, true), result("q1", Money::ZERO, false)];
        assert_eq!(Ledger::from_results(dup), Err("q1".to_string()));
    }

    #[test]
    fn test_summary_message_from_tiers() {
        let bank = petruta_bank();
        let set = bank.questions_for("petruta");
        let player = bank.player("petruta").unwrap();
        let tiers = ScoreTiers::default();

        let empty = ScoreSummary::compute(&set, player, &[]).with_message(&tiers);
        assert_eq!(empty.percentage, None);
        assert_eq!(empty.message, None);

        let all = vec![result("q1", Money::from_units(5), true)];
        let perfect = ScoreSummary::compute(&set, player, &all).with_message(&tiers);
        assert_eq!(perfect.message.as_deref(), Some(tiers.rows()[0].message.as_str()));
    }

    proptest! {
        #[test]
        fn prop_amount_won_bounded_by_max(outcomes in prop::collection::vec(any::<bool>(), 3)) {
            let bank = petruta_bank();
            let set = bank.questions_for("petruta");
            let player = bank.player("petruta").unwrap();
            let results: Vec<AnswerResult> = set
                .iter()
                .enumerate()
                .zip(outcomes.iter())
                .map(|((i, q), ok)| result(&q.id, player.question_value(i), *ok))
                .collect();

            let summary = ScoreSummary::compute(&set, player, &results);
            prop_assert!(summary.amount_won <= summary.max_possible);
            prop_assert_eq!(
                summary.amount_won == summary.max_possible,
                summary.correct_count == summary.total_answered
            );
        }
    }
}
