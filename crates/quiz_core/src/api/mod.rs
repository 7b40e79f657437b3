pub mod session_json;

pub use session_json::{handle_request_json, view_json, EventRequest, EventResponse, SCHEMA_VERSION};
