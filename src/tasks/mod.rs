//! Background tasks module
//!
//! The periodic tick source that drives the timer, and the consumer task that
//! reacts to its events.

pub mod speaker_announcer;
pub mod ticker;

// Re-export main types
pub use speaker_announcer::speaker_announcer_task;
pub use ticker::{ManualScheduler, TickHandle, TickScheduler, TickTarget, TokioScheduler};
