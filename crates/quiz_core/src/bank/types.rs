use crate::money::Money;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A contestant from the fixed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    /// Value of the first question.
    #[serde(rename = "questionValue", alias = "baseQuestionValue", default)]
    pub base_question_value: Money,
    /// Added once per ordinal position.
    #[serde(default)]
    pub value_increment: Money,
}

impl Player {
    pub fn new(id: &str, name: &str, base_question_value: Money, value_increment: Money) -> Self {
        Self { id: id.to_string(), name: name.to_string(), base_question_value, value_increment }
    }

    /// Value of the question at 0-based position `ordinal` in the player's set.
    pub fn question_value(&self, ordinal: usize) -> Money {
        self.base_question_value + self.value_increment.times(ordinal)
    }
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "question", alias = "text")]
    pub text: String,
    /// Keyed by option letter; iteration order is the display order.
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(rename = "imageName", alias = "imageRef", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl Question {
    pub fn option_keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn is_correct(&self, key: &str) -> bool {
        self.correct_answer == key
    }

    pub fn correct_text(&self) -> Option<&str> {
        self.options.get(&self.correct_answer).map(String::as_str)
    }
}

/// Question ids show up as strings or bare numbers in hand-written data files.
pub(crate) fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    match RawId::deserialize(deserializer) {
        Ok(RawId::Text(s)) => Ok(s),
        Ok(RawId::Int(n)) => Ok(n.to_string()),
        Err(_) => Err(de::Error::custom("question id must be a string or an integer")),
    }
}

/// The ordered questions a single player answers, easiest first.
#[derive(Debug, Clone, Default)]
pub struct QuestionSet {
    player_id: String,
    questions: Vec<Question>,
    positions: HashMap<String, usize>,
}

impl QuestionSet {
    /// Builds a set from questions already in play order.
    pub(crate) fn from_sorted(player_id: &str, questions: Vec<Question>) -> Self {
        let positions = questions.iter().enumerate().map(|(i, q)| (q.id.clone(), i)).collect();
        Self { player_id: player_id.to_string(), questions, positions }
    }

    pub fn empty(player_id: &str) -> Self {
        Self::from_sorted(player_id, Vec::new())
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, ordinal: usize) -> Option<&Question> {
        self.questions.get(ordinal)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Question> {
        self.questions.iter()
    }

    pub fn position_of(&self, question_id: &str) -> Option<usize> {
        self.positions.get(question_id).copied()
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.positions.contains_key(question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_value_by_ordinal() {
        let player = Player::new("petruta", "Petruța", Money::from_units(5), Money::from_cents(50));
        assert_eq!(player.question_value(0), Money::from_units(5));
        assert_eq!(player.question_value(1), Money::from_cents(550));
        assert_eq!(player.question_value(2), Money::from_units(6));
    }

    #[test]
    fn test_question_parses_data_file_field_names() {
        let q: Question = serde_json::from_value(json!({
            "id": 7,
            "subject": "Geografie",
            "question": "Capitala României?",
            "options": { "B": "Cluj", "A": "București", "C": "Iași" },
            "correctAnswer": "A",
            "difficulty": 1,
            "imageName": "map.png"
        }))
        .unwrap();

        assert_eq!(q.id, "7");
        assert_eq!(q.image_ref.as_deref(), Some("map.png"));
        assert_eq!(q.option_keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert!(q.is_correct("A"));
        assert_eq!(q.correct_text(), Some("București"));
    }

    #[test]
    fn test_player_accepts_legacy_catalog_without_values() {
        let p: Player = serde_json::from_value(json!({ "id": "leo", "name": "Leo" })).unwrap();
        assert_eq!(p.base_question_value, Money::ZERO);
        assert_eq!(p.question_value(10), Money::ZERO);
    }
}
