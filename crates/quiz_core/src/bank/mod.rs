//! Question bank: the player catalog and each player's difficulty-ordered
//! question set. Data is validated once at load; lookups afterwards are pure.

pub mod types;

pub use types::{Player, Question, QuestionSet};

use crate::error::DataError;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Sample data compiled into the binary, used when no data file is configured.
pub const BUILTIN_QUESTIONS_JSON: &str = include_str!("../../data/questions.json");

pub const DEFAULT_CURRENCY: &str = "RON";

/// On-disk question data file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionFile {
    #[serde(default)]
    currency: Option<String>,
    players: Vec<Player>,
    questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
struct QuestionRecord {
    target: String,
    #[serde(flatten)]
    question: Question,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    players: Vec<Player>,
    sets: HashMap<String, QuestionSet>,
    currency: String,
}

impl QuestionBank {
    /// Validate and index raw data. `questions` pairs each question with the
    /// id of the player it belongs to, in source order.
    pub fn new(
        players: Vec<Player>,
        questions: Vec<(String, Question)>,
        currency: &str,
    ) -> Result<Self, DataError> {
        let mut player_ids = HashSet::new();
        for player in &players {
            if !player_ids.insert(player.id.as_str()) {
                return Err(DataError::DuplicatePlayer(player.id.clone()));
            }
            if player.base_question_value.is_negative() || player.value_increment.is_negative() {
                return Err(DataError::NegativeAmount { player: player.id.clone() });
            }
        }

        let mut grouped: HashMap<String, Vec<Question>> = HashMap::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for (target, question) in questions {
            if !player_ids.contains(target.as_str()) {
                return Err(DataError::UnknownTarget { question: question.id, target });
            }
            validate_question(&question)?;
            if !seen.insert((target.clone(), question.id.clone())) {
                return Err(DataError::DuplicateQuestion { player: target, question: question.id });
            }
            grouped.entry(target).or_default().push(question);
        }

        let sets = grouped
            .into_iter()
            .map(|(player_id, mut list)| {
                // Vec::sort_by is stable: equal difficulties keep source order.
                list.sort_by(|a, b| a.difficulty.total_cmp(&b.difficulty));
                let set = QuestionSet::from_sorted(&player_id, list);
                (player_id, set)
            })
            .collect::<HashMap<_, _>>();

        log::debug!(
            "Question bank loaded: {} players, {} questions",
            players.len(),
            sets.values().map(QuestionSet::len).sum::<usize>()
        );

        Ok(Self { players, sets, currency: currency.to_string() })
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let file: QuestionFile = serde_json::from_str(json)?;
        let currency = file.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let questions = file.questions.into_iter().map(|r| (r.target, r.question)).collect();
        Self::new(file.players, questions, &currency)
    }

    pub fn load(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)?;
        let bank = Self::from_json(&content)?;
        log::info!("Loaded question data from {:?}", path);
        Ok(bank)
    }

    pub fn builtin() -> Result<Self, DataError> {
        Self::from_json(BUILTIN_QUESTIONS_JSON)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// The player's question set. A player without registered questions
    /// gets an empty set rather than an error.
    pub fn questions_for(&self, player_id: &str) -> QuestionSet {
        match self.sets.get(player_id) {
            Some(set) => set.clone(),
            None => {
                log::debug!("No questions registered for player {}", player_id);
                QuestionSet::empty(player_id)
            }
        }
    }
}

fn validate_question(question: &Question) -> Result<(), DataError> {
    if question.options.is_empty() {
        return Err(DataError::NoOptions { question: question.id.clone() });
    }
    if !question.has_option(&question.correct_answer) {
        return Err(DataError::MissingCorrectAnswer {
            question: question.id.clone(),
            answer: question.correct_answer.clone(),
        });
    }
    if !question.difficulty.is_finite() {
        return Err(DataError::InvalidDifficulty { question: question.id.clone() });
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::money::Money;
    use proptest::prelude::*;

    fn ids(set: &QuestionSet) -> Vec<&str> {
        set.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_by_difficulty() {
        let bank = petruta_bank();
        let set = bank.questions_for("petruta");
        assert_eq!(ids(&set), vec!["q1", "q2", "q3"]);
        assert_eq!(set.position_of("q2"), Some(1));
    }

    #[test]
    fn test_ties_keep_source_order() {
        let players = vec![Player::new("p", "P", Money::ZERO, Money::ZERO)];
        let questions = vec![
            ("p".to_string(), question("b", 2.0, "A")),
            ("p".to_string(), question("x", 1.0, "A")),
            ("p".to_string(), question("a", 2.0, "A")),
            ("p".to_string(), question("y", 1.0, "A")),
        ];
        let bank = QuestionBank::new(players, questions, "RON").unwrap();
        assert_eq!(ids(&bank.questions_for("p")), vec!["x", "y", "b", "a"]);
    }

    #[test]
    fn test_unknown_player_degrades_to_empty_set() {
        let bank = petruta_bank();
        assert!(bank.questions_for("nobody").is_empty());
        assert!(bank.questions_for("leo").is_empty());
        assert!(bank.player("nobody").is_none());
    }

    #[test]
    fn test_duplicate_question_id_rejected_at_load() {
        let players = vec![Player::new("p", "P", Money::ZERO, Money::ZERO)];
        let questions =
            vec![("p".to_string(), question("q", 1.0, "A")), ("p".to_string(), question("q", 2.0, "B"))];
        let err = QuestionBank::new(players, questions, "RON").unwrap_err();
        assert!(matches!(err, DataError::DuplicateQuestion { .. }));
    }

    #[test]
    fn test_same_question_id_allowed_across_players() {
        let players = vec![
            Player::new("p", "P", Money::ZERO, Money::ZERO),
            Player::new("r", "R", Money::ZERO, Money::ZERO),
        ];
        let questions =
            vec![("p".to_string(), question("q", 1.0, "A")), ("r".to_string(), question("q", 1.0, "A"))];
        assert!(QuestionBank::new(players, questions, "RON").is_ok());
    }

    #[test]
    fn test_correct_answer_must_be_an_option() {
        let players = vec![Player::new("p", "P", Money::ZERO, Money::ZERO)];
        let questions = vec![("p".to_string(), question("q", 1.0, "E"))];
        let err = QuestionBank::new(players, questions, "RON").unwrap_err();
        assert!(matches!(err, DataError::MissingCorrectAnswer { .. }));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let players = vec![Player::new("p", "P", Money::ZERO, Money::ZERO)];
        let questions = vec![("ghost".to_string(), question("q", 1.0, "A"))];
        let err = QuestionBank::new(players, questions, "RON").unwrap_err();
        assert!(matches!(err, DataError::UnknownTarget { .. }));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let players = vec![Player::new("p", "P", Money::from_units(-1), Money::ZERO)];
        let err = QuestionBank::new(players, Vec::new(), "RON").unwrap_err();
        assert!(matches!(err, DataError::NegativeAmount { .. }));
    }

    #[test]
    fn test_builtin_bank_is_valid() {
        let bank = QuestionBank::builtin().unwrap();
        assert!(!bank.players().is_empty());
        assert_eq!(bank.currency(), "RON");
        for player in bank.players() {
            assert!(!bank.questions_for(&player.id).is_empty(), "{} has no questions", player.id);
        }
        let petruta = bank.player("petruta").unwrap();
        assert_eq!(petruta.base_question_value, Money::from_units(5));
        assert_eq!(petruta.value_increment, Money::from_cents(50));
    }

    #[test]
    fn test_from_json_reports_parse_errors() {
        assert!(matches!(QuestionBank::from_json("{"), Err(DataError::Parse(_))));
    }

    proptest! {
        #[test]
        fn prop_questions_for_is_stably_sorted(difficulties in prop::collection::vec(0u8..5, 0..40)) {
            let players = vec![Player::new("p", "P", Money::ZERO, Money::ZERO)];
            let questions: Vec<(String, Question)> = difficulties
                .iter()
                .enumerate()
                .map(|(i, d)| ("p".to_string(), question(&format!("q{}", i), *d as f64, "A")))
                .collect();
            let bank = QuestionBank::new(players, questions, "RON").unwrap();
            let set = bank.questions_for("p");

            prop_assert_eq!(set.len(), difficulties.len());
            let ordered: Vec<&Question> = set.iter().collect();
            for pair in ordered.windows(2) {
                prop_assert!(pair[0].difficulty <= pair[1].difficulty);
                if pair[0].difficulty == pair[1].difficulty {
                    let a: usize = pair[0].id[1..].parse().unwrap();
                    let b: usize = pair[1].id[1..].parse().unwrap();
                    prop_assert!(a < b);
                }
            }
        }
    }
}
