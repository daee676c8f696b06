//! State management module
//!
//! The speaker-rotation timer, the state it publishes, and the host state that owns it.

pub mod app_state;
pub mod scrum_timer;
pub mod speaker;
pub mod timer_state;

// Re-export main types
pub use app_state::AppState;
pub use scrum_timer::{tick_period, ScrumTimer, DEFAULT_TICK_FREQUENCY_HZ};
pub use speaker::{Speaker, PLACEHOLDER_SPEAKER};
pub use timer_state::{progress, TimerEvent, TimerPhase, TimerState};
