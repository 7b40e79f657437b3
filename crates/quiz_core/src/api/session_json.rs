//! JSON boundary for front-ends that cannot link the machine directly.
//!
//! Requests carry one [`GameEvent`]; every response carries the resulting
//! [`GameView`], so a rejected event still tells the caller where it stands.

use crate::audio::AudioPort;
use crate::error::QuizError;
use crate::save::SessionStore;
use crate::state::{GameEvent, GameMachine, GameView, Transition};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub schema_version: u8,
    pub event: GameEvent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub schema_version: u8,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    pub view: GameView,
}

/// Apply one JSON-encoded event and answer with the new view.
///
/// Malformed requests and rejected events produce `ok: false` with the
/// unchanged view; only a failure to encode the response is an `Err`.
pub fn handle_request_json<S, A>(
    machine: &mut GameMachine<S, A>,
    request_json: &str,
) -> Result<String, QuizError>
where
    S: SessionStore,
    A: AudioPort,
{
    let outcome = parse_request(request_json).and_then(|request| machine.dispatch(&request.event));

    let response = match outcome {
        Ok(transition) => EventResponse {
            schema_version: SCHEMA_VERSION,
            ok: true,
            error: None,
            transition: Some(transition),
            view: machine.view(),
        },
        Err(e) => {
            log::debug!("Rejected request: {}", e);
            EventResponse {
                schema_version: SCHEMA_VERSION,
                ok: false,
                error: Some(e.to_string()),
                transition: None,
                view: machine.view(),
            }
        }
    };

    Ok(serde_json::to_string(&response)?)
}

/// Current view without applying anything.
pub fn view_json<S: SessionStore, A: AudioPort>(
    machine: &GameMachine<S, A>,
) -> Result<String, QuizError> {
    Ok(serde_json::to_string(&machine.view())?)
}

fn parse_request(request_json: &str) -> Result<EventRequest, QuizError> {
    let request: EventRequest = serde_json::from_str(request_json)?;
    if request.schema_version != SCHEMA_VERSION {
        return Err(QuizError::UnsupportedSchema(request.schema_version));
    }
    Ok(request)
}
