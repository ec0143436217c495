//! Event emission abstraction.
//!
//! The upload panel and the gallery publish their changes through an
//! [`EventSink`], so a frontend (CLI, GUI shell, tests) subscribes without the
//! core knowing who is listening.

use std::sync::Arc;

use parking_lot::Mutex;

/// Event names emitted by the core.
pub mod names {
    /// One upload record changed. Payload: `UploadRecord`.
    pub const UPLOAD_PROGRESS: &str = "upload-progress";
    /// Every file of a batch reached a terminal state. Payload: `BatchReport`.
    pub const UPLOAD_BATCH_DRAINED: &str = "upload-batch-drained";
    /// The panel was emptied after the post-batch delay. Payload: batch id.
    pub const UPLOAD_PANEL_CLEARED: &str = "upload-panel-cleared";
    /// The server created a photo. Payload: `Photo`.
    pub const PHOTO_UPLOADED: &str = "photo-uploaded";
    /// The gallery order changed locally. Payload: photo ids in order.
    pub const ORDER_CHANGED: &str = "order-changed";
    /// A fire-and-forget patch failed. Payload: `PersistFailedPayload`.
    pub const PHOTO_PERSIST_FAILED: &str = "photo-persist-failed";
}

/// Trait for emitting events to the frontend.
pub trait EventSink: Send + Sync {
    /// Emit an event with the given name and JSON payload.
    fn emit(&self, event_name: &str, payload_json: &str);
}

/// Extension trait for EventSink that provides typed emit functionality.
pub trait EventSinkExt {
    /// Emit an event with a typed payload that will be serialized to JSON.
    fn emit_typed<T: serde::Serialize>(&self, event_name: &str, payload: &T);
}

impl<S: EventSink + ?Sized> EventSinkExt for S {
    fn emit_typed<T: serde::Serialize>(&self, event_name: &str, payload: &T) {
        match serde_json::to_string(payload) {
            Ok(json) => self.emit(event_name, &json),
            Err(e) => {
                tracing::error!("Failed to serialize event payload: {}", e);
            }
        }
    }
}

/// Shared reference to an EventSink implementation.
pub type SharedEventSink = Arc<dyn EventSink>;

/// No-op event sink for when events are not needed.
#[derive(Debug, Clone, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event_name: &str, _payload_json: &str) {}
}

/// Logging event sink for debugging purposes.
#[derive(Debug, Clone, Default)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        tracing::debug!(event = event_name, payload = payload_json, "Event emitted");
    }
}

/// Event sink that keeps every event in memory.
///
/// Handy for embedding (poll instead of subscribe) and for tests.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<(String, String)>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events as `(name, payload_json)`.
    pub fn events(&self) -> Vec<(String, String)> {
        self.events.lock().clone()
    }

    /// Payloads of the events with the given name, in emission order.
    pub fn payloads(&self, event_name: &str) -> Vec<serde_json::Value> {
        self.events
            .lock()
            .iter()
            .filter(|(name, _)| name == event_name)
            .filter_map(|(_, payload)| serde_json::from_str(payload).ok())
            .collect()
    }

    pub fn count(&self, event_name: &str) -> usize {
        self.events.lock().iter().filter(|(name, _)| name == event_name).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event_name: &str, payload_json: &str) {
        self.events
            .lock()
            .push((event_name.to_string(), payload_json.to_string()));
    }
}
