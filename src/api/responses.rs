//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::TimerState;

/// Body of POST /reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetRequest {
    pub length_in_minutes: u64,
    #[serde(default)]
    pub attendees: Vec<String>,
}

/// API response structure for timer commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub timer: TimerState,
}

impl ApiResponse {
    /// Create a response whose status is the timer's phase
    pub fn new(message: impl Into<String>, timer: TimerState) -> Self {
        Self {
            status: timer.phase.as_str().to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            timer,
        }
    }
}

/// Status response with the derived display values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub timer: TimerState,
    pub progress: f64,
    pub minutes_remaining: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
