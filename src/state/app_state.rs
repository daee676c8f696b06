//! Host application state

use std::{
    sync::{Mutex, PoisonError},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tracing::info;

use super::{ScrumTimer, TimerState};

/// State of the running service: one meeting timer plus server metadata
#[derive(Debug)]
pub struct AppState {
    /// The meeting timer, owned exclusively by this state
    pub timer: ScrumTimer,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last command tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl AppState {
    /// Create a new AppState around an already-configured timer
    pub fn new(port: u16, host: String, timer: ScrumTimer) -> Self {
        Self {
            timer,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
        }
    }

    /// Run a timer command and remember it as the last action
    fn command<F>(&self, action: &str, command: F) -> TimerState
    where
        F: FnOnce(&ScrumTimer),
    {
        command(&self.timer);
        *self
            .last_action
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some((action.to_string(), Utc::now()));
        self.timer.state()
    }

    pub fn start(&self) -> TimerState {
        info!("Start requested");
        self.command("start", ScrumTimer::start_scrum)
    }

    pub fn stop(&self) -> TimerState {
        info!("Stop requested");
        self.command("stop", ScrumTimer::stop_scrum)
    }

    pub fn skip(&self) -> TimerState {
        info!("Skip requested");
        self.command("skip", ScrumTimer::skip_speaker)
    }

    pub fn reset(&self, length_in_minutes: u64, attendees: Vec<String>) -> TimerState {
        info!("Reset requested: {} minutes, {} attendees", length_in_minutes, attendees.len());
        self.command("reset", |timer| timer.reset(length_in_minutes, attendees))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_duration(self.start_time.elapsed().as_secs())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self
            .last_action
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some((action, at)) => (Some(action), Some(at)),
            None => (None, None),
        }
    }
}

fn format_duration(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}
