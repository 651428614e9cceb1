mod countdown;
mod engine;
mod state;

pub use countdown::Countdown;
pub use engine::RestTimerEngine;
pub use state::RestTimerState;
