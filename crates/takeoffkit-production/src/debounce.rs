//! Debounced writes for continuous numeric input.
//!
//! Rapid edits (used-hours fields, steppers) coalesce into a single flush
//! after a quiet period; a newer edit cancels the pending timer. The sink
//! receives only the last value submitted.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Quiet period for used-hours style numeric input.
pub const WRITE_QUIET_PERIOD: Duration = Duration::from_millis(600);

/// Coalesces rapid submissions into one delayed flush.
pub struct Debouncer<T> {
    delay: Duration,
    sink: Arc<dyn Fn(T) + Send + Sync>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Clone + Send + 'static> Debouncer<T> {
    /// Creates a debouncer that flushes into `sink` after `delay` of quiet.
    pub fn new(delay: Duration, sink: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            delay,
            sink: Arc::new(sink),
            pending: None,
        }
    }

    /// Submits a value, cancelling any pending flush.
    pub fn submit(&mut self, value: T) {
        self.cancel();
        let sink = Arc::clone(&self.sink);
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            sink(value);
        }));
    }

    /// Flushes a value immediately, cancelling any pending timer.
    pub fn flush(&mut self, value: T) {
        self.cancel();
        (self.sink)(value);
    }

    /// Cancels the pending flush, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a flush is pending.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
