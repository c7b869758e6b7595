//! Cancellable one-shot scheduled task.
//!
//! Scheduling replaces any pending payload and restarts the quiet period, so
//! a burst of triggers collapses into one firing carrying the latest payload.

/// One pending payload with a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Debouncer<T> {
    delay_ms: i64,
    pending: Option<Scheduled<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled<T> {
    deadline_ms: i64,
    payload: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: i64::try_from(delay_ms).unwrap_or(i64::MAX),
            pending: None,
        }
    }

    /// Schedules `payload` to fire `delay_ms` after `now_ms`, discarding any
    /// payload already pending.
    pub fn schedule(&mut self, now_ms: i64, payload: T) {
        self.pending = Some(Scheduled {
            deadline_ms: now_ms.saturating_add(self.delay_ms),
            payload,
        });
    }

    /// Drops the pending payload, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|scheduled| scheduled.payload)
    }

    /// Fires once the deadline has passed; later polls return `None`.
    pub fn poll(&mut self, now_ms: i64) -> Option<T> {
        match &self.pending {
            Some(scheduled) if now_ms >= scheduled.deadline_ms => self.cancel(),
            _ => None,
        }
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|scheduled| &scheduled.payload)
    }

    pub fn deadline_ms(&self) -> Option<i64> {
        self.pending.as_ref().map(|scheduled| scheduled.deadline_ms)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
