use super::error::StoreError;
use super::SAVE_VERSION;
use crate::money::Money;
use serde_json::{json, Map, Value};

/// Bring a JSON session record up to the current version.
///
/// Records without a `version` field are treated as version 0: the format the
/// browser front-end kept in local storage.
pub fn migrate_record(mut value: Value) -> Result<Value, StoreError> {
    let record = value
        .as_object_mut()
        .ok_or_else(|| StoreError::Corrupted("session record is not an object".to_string()))?;

    let original_version = match record.get("version") {
        None | Some(Value::Null) => 0,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| StoreError::Corrupted(format!("invalid record version: {}", v)))?,
    };

    match original_version {
        0 => migrate_v0_to_v1(record)?,
        SAVE_VERSION => {}
        found => {
            return Err(StoreError::VersionMismatch { found, expected: SAVE_VERSION });
        }
    }

    record.insert("version".to_string(), json!(SAVE_VERSION));

    if original_version != SAVE_VERSION {
        log::info!("Migrated session record from version {} to {}", original_version, SAVE_VERSION);
    }

    Ok(value)
}

/// Migrate from version 0 to version 1
fn migrate_v0_to_v1(record: &mut Map<String, Value>) -> Result<(), StoreError> {
    log::info!("Migrating session record from version 0 to 1");

    // 1. The phase used to be stored as `gameState`, in any case
    if !record.contains_key("phase") {
        if let Some(state) = record.remove("gameState") {
            record.insert("phase".to_string(), state);
        }
    }
    let phase = record
        .get("phase")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .ok_or_else(|| StoreError::Corrupted("session record has no phase".to_string()))?;
    record.insert("phase".to_string(), json!(phase));

    // 2. Missing pointer means the first question
    if !matches!(record.get("currentIndex"), Some(Value::Number(_))) {
        record.insert("currentIndex".to_string(), json!(0));
    }

    // 3. Results embedded the whole question and carried no value. Entries
    //    were appended in play order, so position i is ordinal i.
    let (base, increment) = player_amounts(record.get("player"));
    if let Some(Value::Array(results)) = record.get_mut("results") {
        for (ordinal, entry) in results.iter_mut().enumerate() {
            let entry = entry.as_object_mut().ok_or_else(|| {
                StoreError::Corrupted(format!("result {} is not an object", ordinal))
            })?;
            let question = entry.remove("question");

            if !entry.contains_key("questionId") {
                let id = question
                    .as_ref()
                    .and_then(|q| q.get("id"))
                    .and_then(id_to_string)
                    .ok_or_else(|| {
                        StoreError::Corrupted(format!("result {} has no question id", ordinal))
                    })?;
                entry.insert("questionId".to_string(), json!(id));
            }

            if !entry.contains_key("questionValue") {
                let value = base + increment.times(ordinal);
                entry.insert("questionValue".to_string(), serde_json::to_value(value)?);
            }
        }
    } else {
        record.insert("results".to_string(), json!([]));
    }

    Ok(())
}

fn player_amounts(player: Option<&Value>) -> (Money, Money) {
    let amount = |key: &str| {
        player
            .and_then(|p| p.get(key))
            .and_then(Value::as_f64)
            .and_then(Money::from_decimal)
            .unwrap_or(Money::ZERO)
    };
    (amount("questionValue"), amount("valueIncrement"))
}

fn id_to_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::format::SavedSession;
    use crate::state::Phase;

    fn browser_record() -> Value {
        json!({
            "gameState": "Playing",
            "player": { "id": "petruta", "name": "Petruța", "questionValue": 5, "valueIncrement": 0.5 },
            "currentIndex": 2,
            "results": [
                {
                    "question": { "id": 11, "question": "Q1?", "correctAnswer": "A" },
                    "selectedAnswer": "A",
                    "isCorrect": true
                },
                {
                    "question": { "id": "q2", "question": "Q2?", "correctAnswer": "B" },
                    "selectedAnswer": "C",
                    "isCorrect": false
                }
            ]
        })
    }

    #[test]
    fn test_v0_browser_record_migrates() {
        let migrated = migrate_record(browser_record()).unwrap();
        let record: SavedSession = serde_json::from_value(migrated).unwrap();

        assert_eq!(record.version, SAVE_VERSION);
        assert_eq!(record.phase, Phase::Playing);
        assert_eq!(record.current_index, 2);
        assert_eq!(record.results[0].question_id, "11");
        assert_eq!(record.results[0].question_value, Money::from_units(5));
        assert_eq!(record.results[1].question_id, "q2");
        assert_eq!(record.results[1].question_value, Money::from_cents(550));
        assert!(!record.results[1].is_correct);
    }

    #[test]
    fn test_current_version_untouched() {
        let record = json!({
            "version": SAVE_VERSION,
            "phase": "ready",
            "player": null,
            "results": [],
            "currentIndex": 0
        });
        assert_eq!(migrate_record(record.clone()).unwrap(), record);
    }

    #[test]
    fn test_v0_without_phase_is_corrupt() {
        let err = migrate_record(json!({ "results": [] })).unwrap_err();
        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_non_object_is_corrupt() {
        assert!(migrate_record(json!([1, 2, 3])).is_err());
        assert!(migrate_record(json!({ "version": "one", "phase": "select" })).is_err());
    }
}
