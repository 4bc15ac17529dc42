//! Event store adapters: where an analysis batch comes from.
//!
//! The engine never reads storage itself. Callers hand it a slice of events;
//! these adapters produce that slice in a stable order.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::ClinicalEvent;

pub const SAMPLE_EVENTS_FILE: &str = "sample_events.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Event file read failed ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Event file parse failed ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Supplies an ordered batch of clinical events.
pub trait EventSource {
    fn load_events(&self) -> Result<Vec<ClinicalEvent>, StoreError>;
}

/// Events already in memory, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventSource {
    events: Vec<ClinicalEvent>,
}

impl InMemoryEventSource {
    pub fn new(events: Vec<ClinicalEvent>) -> Self {
        Self { events }
    }

    pub fn push(&mut self, event: ClinicalEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSource for InMemoryEventSource {
    fn load_events(&self) -> Result<Vec<ClinicalEvent>, StoreError> {
        Ok(self.events.clone())
    }
}

/// A JSON array of events on disk. Returned sorted by (timestamp, id) so
/// that clustering order does not depend on how the file was written.
#[derive(Debug, Clone)]
pub struct JsonFileEventSource {
    path: PathBuf,
}

impl JsonFileEventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The bundled five-event NSCLC sample.
    pub fn sample(resources_dir: &Path) -> Self {
        Self::new(resources_dir.join(SAMPLE_EVENTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for JsonFileEventSource {
    fn load_events(&self) -> Result<Vec<ClinicalEvent>, StoreError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.display().to_string(),
            source,
        })?;
        let mut events: Vec<ClinicalEvent> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;

        events.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!(path = %self.path.display(), events = events.len(), "Events loaded");
        Ok(events)
    }
}
