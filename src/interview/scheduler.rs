//! Turn scheduler — cancellable timers that simulate "thinking" latency.
//!
//! Each session owns one scheduler. Timers are tokio tasks keyed by
//! [`TimerKind`]; tearing the session down aborts them and clears the liveness
//! flag, so a timer that still wakes up does nothing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// The timers a session can have pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Between an accepted submission and the next prompt.
    Thinking,
    /// Between completion and the offer reveal.
    OfferReveal,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thinking => write!(f, "thinking"),
            Self::OfferReveal => write!(f, "offer_reveal"),
        }
    }
}

/// Schedules one-shot delayed callbacks for a single session.
pub struct TurnScheduler {
    session_id: Uuid,
    live: Arc<AtomicBool>,
    timers: Mutex<HashMap<TimerKind, JoinHandle<()>>>,
}

impl TurnScheduler {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            live: Arc::new(AtomicBool::new(true)),
            timers: Mutex::new(HashMap::new()),
        }
    }

    /// Run `callback` once after `delay`.
    ///
    /// A pending timer of the same kind is replaced. Does nothing once the
    /// scheduler has been cancelled. Must be called from within a tokio
    /// runtime.
    pub fn schedule<F, Fut>(&self, kind: TimerKind, delay: Duration, callback: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if !self.is_live() {
            debug!(session_id = %self.session_id, timer = %kind, "Not scheduling timer on dead session");
            return;
        }

        let live = Arc::clone(&self.live);
        let session_id = self.session_id;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !live.load(Ordering::Acquire) {
                debug!(session_id = %session_id, timer = %kind, "Stale timer ignored");
                return;
            }
            callback().await;
        });

        debug!(
            session_id = %self.session_id,
            timer = %kind,
            delay_ms = delay.as_millis() as u64,
            "Timer scheduled"
        );

        if let Some(previous) = self.lock_timers().insert(kind, handle) {
            if !previous.is_finished() {
                debug!(session_id = %self.session_id, timer = %kind, "Replacing pending timer");
                previous.abort();
            }
        }
    }

    /// Cancel one pending timer. Returns whether one was pending.
    pub fn cancel(&self, kind: TimerKind) -> bool {
        match self.lock_timers().remove(&kind) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Mark the session dead and abort every pending timer.
    pub fn cancel_all(&self) {
        self.live.store(false, Ordering::Release);
        let mut timers = self.lock_timers();
        let pending = timers.values().filter(|h| !h.is_finished()).count();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
        if pending > 0 {
            debug!(session_id = %self.session_id, pending, "Cancelled pending timers");
        }
    }

    /// Whether the owning session is still live.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Whether a timer of `kind` is scheduled and has not fired yet.
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.lock_timers()
            .get(&kind)
            .is_some_and(|h| !h.is_finished())
    }

    /// Number of timers that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.lock_timers().values().filter(|h| !h.is_finished()).count()
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, HashMap<TimerKind, JoinHandle<()>>> {
        // The map holds no invariants a panicking holder could break.
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for TurnScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
