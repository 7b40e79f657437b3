use serde::{Deserialize, Serialize};

/// Top-level stage of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Select,
    Ready,
    Playing,
    Summary,
}

/// What the current question shows while `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    #[default]
    AwaitingAnswer,
    ShowingResult,
}

/// Everything the UI can ask of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    SelectPlayer {
        #[serde(alias = "playerId")]
        player_id: String,
    },
    ConfirmStart,
    ChooseAnswer {
        key: String,
    },
    RetryCurrent,
    Advance,
    Restart,
    ResetAll,
    ToggleSound,
}

impl GameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::SelectPlayer { .. } => "select_player",
            GameEvent::ConfirmStart => "confirm_start",
            GameEvent::ChooseAnswer { .. } => "choose_answer",
            GameEvent::RetryCurrent => "retry_current",
            GameEvent::Advance => "advance",
            GameEvent::Restart => "restart",
            GameEvent::ResetAll => "reset_all",
            GameEvent::ToggleSound => "toggle_sound",
        }
    }
}

/// Outcome of an accepted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    /// False when the event was accepted but had nothing to do.
    pub changed: bool,
}

impl Transition {
    pub(crate) fn new(from: Phase, to: Phase) -> Self {
        Self { from, to, changed: true }
    }

    pub(crate) fn unchanged(phase: Phase) -> Self {
        Self { from: phase, to: phase, changed: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let event: GameEvent =
            serde_json::from_value(json!({ "type": "choose_answer", "key": "B" })).unwrap();
        assert_eq!(event, GameEvent::ChooseAnswer { key: "B".to_string() });

        let event: GameEvent =
            serde_json::from_value(json!({ "type": "select_player", "playerId": "leo" })).unwrap();
        assert_eq!(event.name(), "select_player");

        let event: GameEvent = serde_json::from_value(json!({ "type": "reset_all" })).unwrap();
        assert_eq!(event, GameEvent::ResetAll);
    }

    #[test]
    fn test_phase_strings() {
        assert_eq!(serde_json::to_value(Phase::Summary).unwrap(), json!("summary"));
        let phase: Phase = serde_json::from_value(json!("ready")).unwrap();
        assert_eq!(phase, Phase::Ready);
    }
}
