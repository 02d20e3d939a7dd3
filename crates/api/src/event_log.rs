// Path: crates/api/src/event_log.rs

//! The append-only store event log.
//!
//! The world appends the events of each committed top-level call; replicas
//! read them back in order. Entries are stored in their SCALE wire form so a
//! consumer sees exactly the bytes any other consumer would.

use parking_lot::RwLock;
use std::sync::Arc;
use tessera_types::codec::{from_bytes_canonical, to_bytes_canonical};
use tessera_types::error::LogError;
use tessera_types::{EventId, LoggedEvent, StoreEvent};
use tokio::sync::Notify;

/// An ordered, append-only event store.
pub trait EventLog: Send + Sync {
    /// Appends events with consecutive ids and returns the id of the first,
    /// or `None` for an empty batch.
    fn append_batch(&self, events: &[StoreEvent]) -> Result<Option<EventId>, LogError>;

    /// The id the next appended event will receive.
    fn next_event_id(&self) -> EventId;

    /// Reads encoded events from `start` (inclusive) to `end` (exclusive).
    /// `None` reads to the newest event.
    fn read_range(&self, start: EventId, end: Option<EventId>) -> Result<Vec<(EventId, Vec<u8>)>, LogError>;

    /// A handle woken after every successful append.
    fn notifier(&self) -> Arc<Notify>;

    /// Reads and decodes events from `start` (inclusive) to `end` (exclusive).
    fn read_events(&self, start: EventId, end: Option<EventId>) -> Result<Vec<LoggedEvent>, LogError> {
        self.read_range(start, end)?
            .into_iter()
            .map(|(id, bytes)| {
                from_bytes_canonical::<StoreEvent>(&bytes)
                    .map(|event| LoggedEvent { id, event })
                    .map_err(|reason| LogError::Decode { id: id.0, reason })
            })
            .collect()
    }
}

/// An in-memory `EventLog`.
#[derive(Default)]
pub struct MemoryEventLog {
    entries: RwLock<Vec<Vec<u8>>>,
    notify: Arc<Notify>,
}

impl MemoryEventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if no event has been appended.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl EventLog for MemoryEventLog {
    fn append_batch(&self, events: &[StoreEvent]) -> Result<Option<EventId>, LogError> {
        if events.is_empty() {
            return Ok(None);
        }
        let encoded: Vec<Vec<u8>> = events.iter().map(to_bytes_canonical).collect();
        let first = {
            let mut entries = self.entries.write();
            let first = EventId(entries.len() as u64);
            entries.extend(encoded);
            first
        };
        log::debug!("appended {} events starting at {}", events.len(), first);
        self.notify.notify_waiters();
        Ok(Some(first))
    }

    fn next_event_id(&self) -> EventId {
        EventId(self.entries.read().len() as u64)
    }

    fn read_range(&self, start: EventId, end: Option<EventId>) -> Result<Vec<(EventId, Vec<u8>)>, LogError> {
        let entries = self.entries.read();
        let len = entries.len() as u64;
        let end = end.map_or(len, |e| e.0.min(len));
        if start.0 >= end {
            return Ok(Vec::new());
        }
        Ok(entries
            .iter()
            .enumerate()
            .skip(start.0 as usize)
            .take((end - start.0) as usize)
            .map(|(i, bytes)| (EventId(i as u64), bytes.clone()))
            .collect())
    }

    fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}
