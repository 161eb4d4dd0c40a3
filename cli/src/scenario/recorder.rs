//! In-memory transcript that feeds the run report

use serde::Serialize;
use serde_json::Value;
use stagegate_application::{TranscriptEvent, TranscriptLogger};
use std::sync::{Arc, Mutex};

/// One transcript event as kept for the report
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(flatten)]
    pub payload: Value,
}

/// Keeps every event in order and forwards it to an optional file sink.
pub struct RecordingTranscript {
    events: Mutex<Vec<RecordedEvent>>,
    sink: Option<Arc<dyn TranscriptLogger>>,
}

impl RecordingTranscript {
    pub fn new(sink: Option<Arc<dyn TranscriptLogger>>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            sink,
        }
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<RecordedEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TranscriptLogger for RecordingTranscript {
    fn log(&self, event: TranscriptEvent) {
        let recorded = RecordedEvent {
            event_type: event.event_type.to_string(),
            payload: event.payload.clone(),
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(recorded);
        }
        if let Some(sink) = &self.sink {
            sink.log(event);
        }
    }
}
