//! Speaker-rotation timer
//!
//! Splits a meeting evenly between attendees and tracks, tick by tick, whose
//! turn it is and how much time is left. Elapsed time is always re-derived from
//! the instant the current turn began, so missed or late ticks never drift.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{
    sync::{broadcast, watch},
    time::Instant,
};
use tracing::{debug, info, trace};

use super::{speaker::roster_from, Speaker, TimerEvent, TimerPhase, TimerState};
use crate::tasks::{TickHandle, TickScheduler, TickTarget, TokioScheduler};

/// Ticks per second used unless told otherwise
pub const DEFAULT_TICK_FREQUENCY_HZ: u32 = 60;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Interval between ticks for a given frequency
pub fn tick_period(frequency_hz: u32) -> Duration {
    Duration::from_secs(1) / frequency_hz.max(1)
}

type SpeakerChangedAction = Arc<dyn Fn() + Send + Sync>;

/// Result of a begin-turn transition
enum Transition {
    Speaker { index: usize, name: String },
    Finished,
}

/// How the timer (re)registers its periodic tick
struct Scheduling {
    scheduler: Arc<dyn TickScheduler>,
    period: Duration,
    target: Weak<TimerShared>,
}

impl Scheduling {
    fn schedule(&self) -> TickHandle {
        let target: Weak<dyn TickTarget> = self.target.clone();
        self.scheduler.schedule(self.period, target)
    }
}

/// Mutable timer state, only ever touched under the lock
struct TimerCore {
    length_in_minutes: u64,
    length_in_seconds: u64,
    speakers: Vec<Speaker>,
    speaker_index: usize,
    seconds_elapsed_for_speaker: u64,
    seconds_elapsed: u64,
    seconds_remaining: u64,
    active_speaker: String,
    started: bool,
    stopped: bool,
    finished: bool,
    turn_start: Option<Instant>,
    subscription: Option<TickHandle>,
}

impl TimerCore {
    fn new(length_in_minutes: u64, attendees: Vec<String>) -> Self {
        // Absurd lengths saturate instead of overflowing.
        let length_in_seconds = length_in_minutes.saturating_mul(60);
        let mut core = Self {
            length_in_minutes,
            length_in_seconds,
            speakers: roster_from(attendees),
            speaker_index: 0,
            seconds_elapsed_for_speaker: 0,
            seconds_elapsed: 0,
            seconds_remaining: length_in_seconds,
            active_speaker: String::new(),
            started: false,
            stopped: false,
            finished: false,
            turn_start: None,
            subscription: None,
        };
        core.active_speaker = core.speaker_text();
        core
    }

    fn length_in_seconds(&self) -> u64 {
        self.length_in_seconds
    }

    /// Roster is never empty, so this never divides by zero
    fn seconds_per_speaker(&self) -> u64 {
        self.length_in_seconds() / self.speakers.len() as u64
    }

    /// Slot of the current speaker, used by the stale-tick guard and the
    /// end-of-turn check.
    ///
    /// Every speaker gets `seconds_per_speaker` except the last, whose slot is
    /// `length - (count - 1) * seconds_per_speaker`. This deliberately differs
    /// from a flat per-speaker slot when the length does not divide evenly: the
    /// last speaker absorbs the remainder, so the meeting ends at exactly the
    /// full length with nothing remaining.
    fn current_slot(&self) -> u64 {
        let per_speaker = self.seconds_per_speaker();
        if self.speaker_index + 1 == self.speakers.len() {
            self.length_in_seconds() - per_speaker * self.speaker_index as u64
        } else {
            per_speaker
        }
    }

    fn speaker_text(&self) -> String {
        format!(
            "Speaker {}: {}",
            self.speaker_index + 1,
            self.speakers[self.speaker_index].name
        )
    }

    fn phase(&self) -> TimerPhase {
        if self.finished {
            TimerPhase::Finished
        } else if self.stopped {
            TimerPhase::Stopped
        } else if self.started {
            TimerPhase::Running
        } else {
            TimerPhase::Idle
        }
    }

    fn state(&self) -> TimerState {
        TimerState {
            active_speaker: self.active_speaker.clone(),
            speaker_index: self.speaker_index,
            seconds_elapsed: self.seconds_elapsed,
            seconds_remaining: self.seconds_remaining,
            seconds_elapsed_for_speaker: self.seconds_elapsed_for_speaker,
            seconds_per_speaker: self.seconds_per_speaker(),
            length_in_minutes: self.length_in_minutes,
            phase: self.phase(),
            speakers: self.speakers.clone(),
        }
    }

    fn cancel_subscription(&mut self) {
        if let Some(handle) = self.subscription.take() {
            handle.cancel();
        }
    }

    fn begin_turn(&mut self, index: usize, scheduling: &Scheduling) -> Option<Transition> {
        if index > 0 {
            if let Some(previous) = self.speakers.get_mut(index - 1) {
                previous.is_completed = true;
            }
        }
        self.seconds_elapsed_for_speaker = 0;

        if index >= self.speakers.len() {
            if self.finished {
                return None;
            }
            info!("All {} speakers have finished", self.speakers.len());
            self.finished = true;
            return Some(Transition::Finished);
        }

        self.speaker_index = index;
        self.started = true;
        self.finished = false;
        self.active_speaker = self.speaker_text();
        self.seconds_elapsed = index as u64 * self.seconds_per_speaker();
        self.seconds_remaining = self.length_in_seconds() - self.seconds_elapsed;
        self.turn_start = Some(Instant::now());
        // Replacing the handle cancels the previous subscription.
        self.subscription = Some(scheduling.schedule());

        info!(
            "{} ({} seconds, {} remaining in meeting)",
            self.active_speaker,
            self.current_slot(),
            self.seconds_remaining
        );
        Some(Transition::Speaker {
            index,
            name: self.speakers[index].name.clone(),
        })
    }

    fn tick(&mut self, now: Instant, scheduling: &Scheduling) -> Option<Transition> {
        let turn_start = self.turn_start?;
        let elapsed = now.saturating_duration_since(turn_start).as_secs();
        let slot = self.current_slot();

        self.seconds_elapsed_for_speaker = elapsed;
        self.seconds_elapsed = (self.seconds_per_speaker() * self.speaker_index as u64)
            .saturating_add(elapsed);

        if elapsed > slot {
            trace!("Stale tick {}s into a {}s slot", elapsed, slot);
            return None;
        }
        self.seconds_remaining = self.length_in_seconds().saturating_sub(self.seconds_elapsed);

        if self.stopped {
            return None;
        }

        if elapsed >= slot {
            return self.begin_turn(self.speaker_index + 1, scheduling);
        }
        None
    }
}

/// State shared between the owning `ScrumTimer` and its tick subscription
struct TimerShared {
    core: Mutex<TimerCore>,
    scheduling: Scheduling,
    state_tx: watch::Sender<TimerState>,
    event_tx: broadcast::Sender<TimerEvent>,
    speaker_changed_actions: Mutex<Vec<SpeakerChangedAction>>,
}

impl TimerShared {
    fn lock(&self) -> MutexGuard<'_, TimerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the core and publish the result while still holding the lock, so
    /// observers see snapshots and events in the order they happened. Only the
    /// speaker-changed actions run after the lock is released.
    fn update<F>(&self, updater: F)
    where
        F: FnOnce(&mut TimerCore, &Scheduling) -> Vec<TimerEvent>,
    {
        let speaker_changed = {
            let mut core = self.lock();
            let events = updater(&mut core, &self.scheduling);
            self.publish(core.state(), events)
        };

        if speaker_changed {
            self.run_speaker_changed_actions();
        }
    }

    /// Returns whether a speaker change was among the events
    fn publish(&self, state: TimerState, events: Vec<TimerEvent>) -> bool {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });

        let mut speaker_changed = false;
        for event in events {
            speaker_changed |= matches!(event, TimerEvent::SpeakerChanged { .. });
            if self.event_tx.send(event).is_err() {
                debug!("No event subscribers listening");
            }
        }
        speaker_changed
    }

    fn run_speaker_changed_actions(&self) {
        let actions: Vec<SpeakerChangedAction> = self
            .speaker_changed_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for action in actions {
            action();
        }
    }
}

impl TickTarget for TimerShared {
    fn tick(&self, now: Instant) {
        self.update(|core, scheduling| {
            core.tick(now, scheduling)
                .map(transition_event)
                .into_iter()
                .collect()
        });
    }
}

fn transition_event(transition: Transition) -> TimerEvent {
    match transition {
        Transition::Speaker { index, name } => TimerEvent::SpeakerChanged { index, name },
        Transition::Finished => TimerEvent::Finished,
    }
}

/// Keeps time for a meeting: total time, time per speaker and who is speaking.
///
/// Exclusively owned by one consumer. Dropping it cancels any live tick
/// subscription; the subscription itself only holds a weak reference.
pub struct ScrumTimer {
    shared: Arc<TimerShared>,
}

impl ScrumTimer {
    /// Create a timer ticking on the tokio runtime at 60 Hz
    pub fn new(length_in_minutes: u64, attendees: Vec<String>) -> Self {
        Self::with_scheduler(
            length_in_minutes,
            attendees,
            Arc::new(TokioScheduler::new()),
            tick_period(DEFAULT_TICK_FREQUENCY_HZ),
        )
    }

    /// Create a timer driven by the given scheduler
    pub fn with_scheduler(
        length_in_minutes: u64,
        attendees: Vec<String>,
        scheduler: Arc<dyn TickScheduler>,
        period: Duration,
    ) -> Self {
        let core = TimerCore::new(length_in_minutes, attendees);
        let (state_tx, _) = watch::channel(core.state());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let shared = Arc::new_cyclic(|weak| TimerShared {
            core: Mutex::new(core),
            scheduling: Scheduling {
                scheduler,
                period,
                target: weak.clone(),
            },
            state_tx,
            event_tx,
            speaker_changed_actions: Mutex::new(Vec::new()),
        });

        Self { shared }
    }

    /// Start the rotation with the first speaker
    pub fn start_scrum(&self) {
        self.shared.update(|core, scheduling| {
            info!(
                "Starting scrum: {} minutes, {} speakers, {} seconds each",
                core.length_in_minutes,
                core.speakers.len(),
                core.seconds_per_speaker()
            );
            core.begin_turn(0, scheduling);
            vec![TimerEvent::Started]
        });
    }

    /// Cancel the tick subscription and freeze automatic transitions
    pub fn stop_scrum(&self) {
        self.shared.update(|core, _| {
            core.cancel_subscription();
            if core.stopped {
                return Vec::new();
            }
            core.stopped = true;
            info!("Scrum stopped at {}s elapsed", core.seconds_elapsed);
            vec![TimerEvent::Stopped]
        });
    }

    /// Move on to the next speaker immediately
    pub fn skip_speaker(&self) {
        self.shared.update(|core, scheduling| {
            debug!("Skipping {}", core.active_speaker);
            let next = core.speaker_index + 1;
            core.begin_turn(next, scheduling)
                .map(transition_event)
                .into_iter()
                .collect()
        });
    }

    /// Start over with a new length and roster, as if freshly constructed
    pub fn reset(&self, length_in_minutes: u64, attendees: Vec<String>) {
        self.shared.update(|core, _| {
            core.cancel_subscription();
            *core = TimerCore::new(length_in_minutes, attendees);
            info!(
                "Scrum reset: {} minutes, {} speakers",
                length_in_minutes,
                core.speakers.len()
            );
            vec![TimerEvent::Reset]
        });
    }

    /// Deliver one tick at `now`. Schedulers call this; hosts with their own
    /// frame loop may call it directly.
    pub fn tick(&self, now: Instant) {
        self.shared.tick(now);
    }

    /// Replace every registered speaker-changed action with `action`
    pub fn set_speaker_changed_action(&self, action: impl Fn() + Send + Sync + 'static) {
        let mut actions = self
            .shared
            .speaker_changed_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        actions.clear();
        actions.push(Arc::new(action));
    }

    /// Register an additional speaker-changed action
    pub fn add_speaker_changed_action(&self, action: impl Fn() + Send + Sync + 'static) {
        self.shared
            .speaker_changed_actions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(action));
    }

    /// Watch the published state; it changes after every tick or command that moves it
    pub fn subscribe(&self) -> watch::Receiver<TimerState> {
        self.shared.state_tx.subscribe()
    }

    /// Receive discrete timer events
    pub fn events(&self) -> broadcast::Receiver<TimerEvent> {
        self.shared.event_tx.subscribe()
    }

    pub fn state(&self) -> TimerState {
        self.shared.lock().state()
    }

    pub fn active_speaker(&self) -> String {
        self.shared.lock().active_speaker.clone()
    }

    pub fn seconds_elapsed(&self) -> u64 {
        self.shared.lock().seconds_elapsed
    }

    pub fn seconds_remaining(&self) -> u64 {
        self.shared.lock().seconds_remaining
    }

    pub fn speaker_index(&self) -> usize {
        self.shared.lock().speaker_index
    }

    pub fn speakers(&self) -> Vec<Speaker> {
        self.shared.lock().speakers.clone()
    }

    pub fn phase(&self) -> TimerPhase {
        self.shared.lock().phase()
    }

    pub fn progress(&self) -> f64 {
        self.state().progress()
    }
}

impl Default for ScrumTimer {
    fn default() -> Self {
        Self::new(0, Vec::new())
    }
}

impl Drop for ScrumTimer {
    fn drop(&mut self) {
        self.shared.lock().cancel_subscription();
    }
}

impl fmt::Debug for ScrumTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core = self.shared.lock();
        f.debug_struct("ScrumTimer")
            .field("active_speaker", &core.active_speaker)
            .field("seconds_elapsed", &core.seconds_elapsed)
            .field("seconds_remaining", &core.seconds_remaining)
            .field("phase", &core.phase())
            .finish()
    }
}
