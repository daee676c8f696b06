//! End-to-end meetings on the tokio scheduler with a paused clock

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use scrum_timer::{ScrumTimer, TimerEvent, TimerPhase};
use tokio::{sync::broadcast::error::RecvError, time::sleep};

fn names(attendees: &[&str]) -> Vec<String> {
    attendees.iter().map(|a| a.to_string()).collect()
}

fn count_speaker_changes(timer: &ScrumTimer) -> Arc<AtomicUsize> {
    let changes = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&changes);
    timer.set_speaker_changed_action(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    changes
}

#[tokio::test(start_paused = true)]
async fn test_ten_minutes_two_speakers() {
    let timer = ScrumTimer::new(10, names(&["A", "B"]));
    let changes = count_speaker_changes(&timer);

    timer.start_scrum();
    assert_eq!(timer.active_speaker(), "Speaker 1: A");
    assert_eq!(timer.seconds_remaining(), 600);

    sleep(Duration::from_millis(299_500)).await;
    assert_eq!(timer.active_speaker(), "Speaker 1: A");
    assert_eq!(timer.seconds_elapsed(), 299);
    assert_eq!(timer.seconds_remaining(), 301);

    sleep(Duration::from_secs(1)).await;
    assert_eq!(timer.active_speaker(), "Speaker 2: B");
    assert_eq!(timer.seconds_elapsed(), 300);
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    sleep(Duration::from_secs(300)).await;
    assert_eq!(timer.phase(), TimerPhase::Finished);
    assert_eq!(timer.active_speaker(), "Speaker 2: B");
    assert_eq!(timer.seconds_remaining(), 0);
    assert_eq!(timer.progress(), 1.0);
    assert_eq!(changes.load(Ordering::SeqCst), 1);

    timer.stop_scrum();
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_ticking() {
    let timer = ScrumTimer::new(10, names(&["A", "B"]));
    let changes = count_speaker_changes(&timer);

    timer.start_scrum();
    sleep(Duration::from_millis(10_500)).await;
    timer.stop_scrum();
    let frozen = timer.state();
    assert_eq!(frozen.seconds_elapsed, 10);

    sleep(Duration::from_secs(400)).await;
    assert_eq!(timer.state(), frozen);
    assert_eq!(timer.active_speaker(), "Speaker 1: A");
    assert_eq!(changes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_watchers_see_progress() {
    let timer = ScrumTimer::new(1, names(&["A", "B", "C"]));
    let mut rx = timer.subscribe();
    rx.borrow_and_update();

    timer.start_scrum();
    let mut last_progress = 0.0;
    loop {
        rx.changed().await.unwrap();
        let state = rx.borrow_and_update().clone();
        assert!(state.progress() >= last_progress);
        last_progress = state.progress();
        if state.phase == TimerPhase::Finished {
            break;
        }
    }

    assert_eq!(last_progress, 1.0);
    assert!(timer.speakers().iter().all(|s| s.is_completed));
    timer.stop_scrum();
}

#[tokio::test(start_paused = true)]
async fn test_placeholder_meeting() {
    let timer = ScrumTimer::new(3, Vec::new());
    timer.start_scrum();
    assert_eq!(timer.active_speaker(), "Speaker 1: Player 1");

    timer.skip_speaker();
    assert_eq!(timer.phase(), TimerPhase::Finished);
    assert_eq!(timer.speaker_index(), 0);
    timer.stop_scrum();
}

#[tokio::test(start_paused = true)]
async fn test_dropped_timer_leaves_no_ticks_behind() {
    let timer = ScrumTimer::new(10, names(&["A", "B"]));
    let mut events = timer.events();

    timer.start_scrum();
    sleep(Duration::from_secs(5)).await;
    drop(timer);
    sleep(Duration::from_secs(600)).await;

    assert_eq!(events.recv().await.unwrap(), TimerEvent::Started);
    assert!(matches!(events.recv().await, Err(RecvError::Closed)));
}

#[tokio::test(start_paused = true)]
async fn test_reset_mid_meeting() {
    let timer = ScrumTimer::new(10, names(&["A", "B"]));
    timer.start_scrum();
    sleep(Duration::from_secs(42)).await;

    timer.reset(2, names(&["X", "Y"]));
    sleep(Duration::from_secs(120)).await;

    let state = timer.state();
    assert_eq!(state.phase, TimerPhase::Idle);
    assert_eq!(state.active_speaker, "Speaker 1: X");
    assert_eq!(state.seconds_elapsed, 0);
    assert_eq!(state.seconds_remaining, 120);
}
