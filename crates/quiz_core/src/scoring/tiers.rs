use serde::{Deserialize, Serialize};

/// One row of the summary message table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreTier {
    pub min_percentage: u8,
    pub message: String,
}

/// Summary messages by percentage threshold, highest threshold first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreTiers(Vec<ScoreTier>);

impl Default for ScoreTiers {
    fn default() -> Self {
        let rows = [
            (100, "PERFECT! A true millionaire!"),
            (80, "Excellent! Almost perfect!"),
            (60, "Very good! You know a lot!"),
            (40, "Good! Keep practicing!"),
            (0, "Don't give up! Try again!"),
        ];
        Self(
            rows.iter()
                .map(|(min, msg)| ScoreTier { min_percentage: *min, message: msg.to_string() })
                .collect(),
        )
    }
}

impl ScoreTiers {
    pub fn new(rows: Vec<ScoreTier>) -> Result<Self, String> {
        let tiers = Self(rows);
        tiers.validate()?;
        Ok(tiers)
    }

    pub fn rows(&self) -> &[ScoreTier] {
        &self.0
    }

    /// Thresholds must be within 0..=100, strictly descending, ending at 0 so
    /// every percentage has a message.
    pub fn validate(&self) -> Result<(), String> {
        let last = self.0.last().ok_or_else(|| "score tier table is empty".to_string())?;
        if last.min_percentage != 0 {
            return Err("last score tier must start at 0%".to_string());
        }
        for row in &self.0 {
            if row.min_percentage > 100 {
                return Err(format!("score tier threshold {} exceeds 100%", row.min_percentage));
            }
        }
        if self.0.windows(2).any(|w| w[0].min_percentage <= w[1].min_percentage) {
            return Err("score tier thresholds must be strictly descending".to_string());
        }
        Ok(())
    }

    pub fn message_for(&self, percentage: u8) -> Option<&str> {
        self.0.iter().find(|t| percentage >= t.min_percentage).map(|t| t.message.as_str())
    }
}
