//! Published timer state and notifications

use serde::{Deserialize, Serialize};

use super::Speaker;

/// Where the rotation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Stopped,
    Finished,
}

impl TimerPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Finished => "finished",
        }
    }
}

/// Discrete notifications emitted by the timer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TimerEvent {
    Started,
    SpeakerChanged { index: usize, name: String },
    Finished,
    Stopped,
    Reset,
}

/// Snapshot of everything a display needs to render the meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub active_speaker: String,
    pub speaker_index: usize,
    pub seconds_elapsed: u64,
    pub seconds_remaining: u64,
    pub seconds_elapsed_for_speaker: u64,
    pub seconds_per_speaker: u64,
    pub length_in_minutes: u64,
    pub phase: TimerPhase,
    pub speakers: Vec<Speaker>,
}

impl TimerState {
    /// Fraction of the meeting used, pinned to 1.0 once no time remains
    pub fn progress(&self) -> f64 {
        progress(self.seconds_elapsed, self.seconds_remaining)
    }

    pub fn minutes_remaining(&self) -> u64 {
        self.seconds_remaining / 60
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }
}

/// Progress ratio computed from the live counters rather than the meeting length,
/// so an overshooting final tick still reads as complete.
pub fn progress(seconds_elapsed: u64, seconds_remaining: u64) -> f64 {
    if seconds_remaining == 0 {
        return 1.0;
    }
    let total = (seconds_elapsed + seconds_remaining) as f64;
    seconds_elapsed as f64 / total
}
