//! Periodic tick scheduling
//!
//! A `TickScheduler` is the host's periodic-callback primitive. Scheduling a
//! target returns a `TickHandle`; the subscription lives until the handle is
//! cancelled or dropped. Schedulers only ever hold a `Weak` reference to the
//! target, so a target that has gone away turns its ticks into no-ops.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError, Weak,
    },
    time::Duration,
};
use tokio::{
    runtime::Handle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

/// Something that wants to be called at a fixed frequency
pub trait TickTarget: Send + Sync {
    fn tick(&self, now: Instant);
}

/// Source of periodic activations
pub trait TickScheduler: Send + Sync {
    /// Register `target` to be ticked every `period` until the handle is cancelled
    fn schedule(&self, period: Duration, target: Weak<dyn TickTarget>) -> TickHandle;
}

/// Cancellation handle for one tick subscription. Dropping it cancels too.
pub struct TickHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    /// Create a handle that runs `cancel` exactly once
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing behind it
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// Cancel the subscription
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickHandle")
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

/// Ticks targets from a tokio interval task on the current runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl TickScheduler for TokioScheduler {
    fn schedule(&self, period: Duration, target: Weak<dyn TickTarget>) -> TickHandle {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("No tokio runtime available, ticks will not be delivered: {}", e);
                return TickHandle::inert();
            }
        };

        debug!("Scheduling ticks every {:?}", period);
        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            // Elapsed time is re-derived from the turn start, so a late tick
            // never needs to be replayed.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;
                match target.upgrade() {
                    Some(target) => target.tick(Instant::now()),
                    None => {
                        debug!("Tick target dropped, ending subscription");
                        break;
                    }
                }
            }
        });

        TickHandle::new(move || task.abort())
    }
}

struct ManualSubscription {
    live: Arc<AtomicBool>,
    target: Weak<dyn TickTarget>,
}

/// Scheduler driven by hand: nothing happens until `fire` is called.
///
/// Useful for hosts that already run their own frame loop, and for tests.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    subscriptions: Arc<Mutex<Vec<ManualSubscription>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one tick at `now` to every live subscription.
    /// Returns how many targets were actually ticked.
    pub fn fire(&self, now: Instant) -> usize {
        // Collect first: a target may (re)schedule itself while being ticked.
        let targets: Vec<Arc<dyn TickTarget>> = {
            let mut subscriptions = self.lock();
            subscriptions.retain(|s| s.live.load(Ordering::SeqCst));
            subscriptions
                .iter()
                .filter_map(|s| s.target.upgrade())
                .collect()
        };

        for target in &targets {
            target.tick(now);
        }
        targets.len()
    }

    /// Number of subscriptions that have not been cancelled
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .iter()
            .filter(|s| s.live.load(Ordering::SeqCst))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ManualSubscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("active_subscriptions", &self.active_subscriptions())
            .finish()
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&self, _period: Duration, target: Weak<dyn TickTarget>) -> TickHandle {
        let live = Arc::new(AtomicBool::new(true));
        self.lock().push(ManualSubscription {
            live: Arc::clone(&live),
            target,
        });

        TickHandle::new(move || live.store(false, Ordering::SeqCst))
    }
}
