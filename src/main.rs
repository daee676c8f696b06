//! Scrum Timer - meeting timekeeping server
//!
//! This is the main entry point for the scrum-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use scrum_timer::{
    api::create_router,
    config::Config,
    state::{tick_period, AppState, ScrumTimer},
    tasks::{speaker_announcer_task, TokioScheduler},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("scrum_timer={},tower_http=info", config.log_level()))
        .init();

    let attendees = config.attendee_names();
    info!("Starting scrum-timer server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, length={}min, attendees={}, tick={}Hz",
        config.host,
        config.port,
        config.length,
        attendees.len(),
        config.tick_hz
    );

    let timer = ScrumTimer::with_scheduler(
        config.length,
        attendees,
        Arc::new(TokioScheduler::new()),
        tick_period(config.tick_hz),
    );
    let state = Arc::new(AppState::new(config.port, config.host.clone(), timer));

    // Report speaker changes and stop ticking once the meeting is over
    let announcer_state = Arc::clone(&state);
    tokio::spawn(async move {
        speaker_announcer_task(announcer_state).await;
    });

    if config.auto_start {
        state.start();
    }

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /start  - Start the meeting");
    info!("  POST /stop   - Stop the meeting");
    info!("  POST /skip   - Skip to the next speaker");
    info!("  POST /reset  - Reset length and attendees");
    info!("  GET  /status - Current speaker and time");
    info!("  GET  /health - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    state.stop();
    info!("Server shutdown complete");
    Ok(())
}
