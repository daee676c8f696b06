//! Speaker announcer background task

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::state::{AppState, TimerEvent, TimerPhase};

/// Background task that reports timer events and, once every speaker has
/// finished, cancels the timer's tick subscription.
pub async fn speaker_announcer_task(state: Arc<AppState>) {
    info!("Starting speaker announcer task");

    let mut events = state.timer.events();

    loop {
        match events.recv().await {
            Ok(TimerEvent::Started) => {
                info!("Meeting started, {} is up", state.timer.active_speaker());
            }
            Ok(TimerEvent::SpeakerChanged { index, name }) => {
                let timer_state = state.timer.state();
                info!(
                    "Next up: speaker {} of {} ({}), {}s remaining",
                    index + 1,
                    timer_state.speakers.len(),
                    name,
                    timer_state.seconds_remaining
                );
            }
            Ok(TimerEvent::Finished) => {
                // The event may predate a reset and restart; only stop a
                // meeting that is still finished.
                if state.timer.phase() == TimerPhase::Finished {
                    info!("Every speaker has had a turn, stopping the timer");
                    state.stop();
                } else {
                    debug!("Ignoring finish of an earlier meeting");
                }
            }
            Ok(event) => {
                debug!("Timer event: {:?}", event);
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Speaker announcer lagged behind, {} events skipped", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Timer event channel closed, ending announcer");
                break;
            }
        }
    }
}
