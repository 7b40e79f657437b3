//! Game session state machine and the read model front-ends render.

pub mod machine;
pub mod phase;
pub mod view;


pub use machine::GameMachine;
pub use phase::{DisplayState, GameEvent, Phase, Transition};
pub use view::{GameView, QuestionView, ResultView};
