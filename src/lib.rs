//! Scrum Timer - keeps time for a meeting shared evenly between speakers
//!
//! The core is [`ScrumTimer`]: it divides the meeting length between the
//! attendees, ticks at a fixed frequency, tracks who is speaking and how much
//! time remains, and notifies observers when the speaker changes. The rest of
//! the crate hosts one timer behind a small HTTP control surface.

pub mod api;
pub mod config;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use state::{AppState, ScrumTimer, Speaker, TimerEvent, TimerPhase, TimerState};
pub use tasks::{ManualScheduler, TickHandle, TickScheduler, TickTarget, TokioScheduler};
pub use utils::signals::shutdown_signal;
