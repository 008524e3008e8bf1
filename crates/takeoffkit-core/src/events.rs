//! Engine event bus
//!
//! The engine never renders; it announces state changes so an external
//! renderer or panel can react. A small broadcast channel keeps the engine
//! decoupled from whatever UI framework is driving it.

use tokio::sync::broadcast;
use tracing::trace;

use crate::ids::MeasurementId;

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Events emitted by the engine for the hosting UI.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// Measurements and calibration were replaced from a drawing load.
    DrawingLoaded,
    /// A measurement was created (optimistically or from a reload).
    MeasurementCreated { id: MeasurementId },
    /// A measurement's fields or points changed.
    MeasurementUpdated { id: MeasurementId },
    /// A measurement (and any owned deductions) was removed.
    MeasurementDeleted { id: MeasurementId },
    /// Calibration was saved; all computed values were re-derived.
    CalibrationChanged,
    /// Calibration was deleted; computed values were cleared.
    CalibrationCleared,
    /// Production statuses were replaced wholesale (date switch or bulk apply).
    StatusesReloaded,
    /// A transient user-facing notification (typically a sync failure).
    Notification { level: NoticeLevel, message: String },
}

/// Broadcast bus for [`EngineEvent`]s.
///
/// Cloning the bus clones the sender; every subscriber sees every event
/// emitted after it subscribed. Emitting with no subscribers is a no-op.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    /// Creates a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: EngineEvent) {
        trace!(?event, "engine event");
        // A send error only means nobody is listening.
        let _ = self.tx.send(event);
    }

    /// Convenience for emitting a notification.
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        self.emit(EngineEvent::Notification {
            level,
            message: message.into(),
        });
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
