//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::Json};
use tracing::{info, warn};

use crate::{config::MAX_LENGTH_IN_MINUTES, state::AppState};
use super::responses::{ApiResponse, HealthResponse, ResetRequest, StatusResponse};

/// Handle POST /start - Begin the rotation with the first speaker
pub async fn start_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.start();
    info!("Start endpoint called - {}", timer.active_speaker);
    Json(ApiResponse::new("Meeting started", timer))
}

/// Handle POST /stop - Cancel ticking and freeze transitions
pub async fn stop_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.stop();
    info!("Stop endpoint called at {}s elapsed", timer.seconds_elapsed);
    Json(ApiResponse::new("Meeting stopped", timer))
}

/// Handle POST /skip - Hand over to the next speaker now
pub async fn skip_handler(State(state): State<Arc<AppState>>) -> Json<ApiResponse> {
    let timer = state.skip();
    info!("Skip endpoint called - now {}", timer.active_speaker);
    let message = if timer.phase == crate::state::TimerPhase::Finished {
        "All speakers done".to_string()
    } else {
        format!("Now speaking: {}", timer.active_speaker)
    };
    Json(ApiResponse::new(message, timer))
}

/// Handle POST /reset - Replace meeting length and attendees
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResetRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if request.length_in_minutes > MAX_LENGTH_IN_MINUTES {
        warn!(
            "Rejecting reset to {} minutes (limit {})",
            request.length_in_minutes, MAX_LENGTH_IN_MINUTES
        );
        return Err(StatusCode::BAD_REQUEST);
    }

    let timer = state.reset(request.length_in_minutes, request.attendees);
    info!("Reset endpoint called - {} speakers", timer.speakers.len());
    Ok(Json(ApiResponse::new("Meeting reset", timer)))
}

/// Handle GET /status - Return the current timer state
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let timer = state.timer.state();
    let (last_action, last_action_time) = state.get_last_action();

    Json(StatusResponse {
        progress: timer.progress(),
        minutes_remaining: timer.minutes_remaining(),
        timer,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    })
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
