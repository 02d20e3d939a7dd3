// Path: crates/types/src/events.rs

//! The store event wire format.
//!
//! Events are SCALE-encoded with variant indices fixed by declaration order:
//! `SetRecord = 0`, `SpliceStaticData = 1`, `SpliceDynamicData = 2`,
//! `DeleteRecord = 3`. Reordering the variants breaks every consumer.

use crate::lengths::EncodedLengths;
use crate::record::RecordKey;
use crate::resource::{ResourceId, Word};
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One record mutation, scoped to a table and key tuple.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub enum StoreEvent {
    /// Replaces the whole record.
    #[codec(index = 0)]
    SetRecord {
        /// The table.
        table: ResourceId,
        /// The key atoms.
        key_tuple: Vec<Word>,
        /// New static region.
        static_data: Vec<u8>,
        /// New length header.
        encoded_lengths: EncodedLengths,
        /// New dynamic region.
        dynamic_data: Vec<u8>,
    },
    /// Overwrites a byte range of the static region.
    #[codec(index = 1)]
    SpliceStaticData {
        /// The table.
        table: ResourceId,
        /// The key atoms.
        key_tuple: Vec<Word>,
        /// Offset into the static region.
        start: u64,
        /// Replacement bytes.
        data: Vec<u8>,
    },
    /// Deletes and inserts bytes in the dynamic region.
    #[codec(index = 2)]
    SpliceDynamicData {
        /// The table.
        table: ResourceId,
        /// The key atoms.
        key_tuple: Vec<Word>,
        /// Offset into the dynamic region.
        start: u64,
        /// Number of bytes removed at `start`.
        delete_count: u64,
        /// The length header after the splice.
        encoded_lengths: EncodedLengths,
        /// Bytes inserted at `start`.
        data: Vec<u8>,
    },
    /// Removes the record.
    #[codec(index = 3)]
    DeleteRecord {
        /// The table.
        table: ResourceId,
        /// The key atoms.
        key_tuple: Vec<Word>,
    },
}

impl StoreEvent {
    /// The table the event targets.
    pub fn table(&self) -> &ResourceId {
        match self {
            StoreEvent::SetRecord { table, .. }
            | StoreEvent::SpliceStaticData { table, .. }
            | StoreEvent::SpliceDynamicData { table, .. }
            | StoreEvent::DeleteRecord { table, .. } => table,
        }
    }

    /// The key tuple the event targets.
    pub fn key_tuple(&self) -> &[Word] {
        match self {
            StoreEvent::SetRecord { key_tuple, .. }
            | StoreEvent::SpliceStaticData { key_tuple, .. }
            | StoreEvent::SpliceDynamicData { key_tuple, .. }
            | StoreEvent::DeleteRecord { key_tuple, .. } => key_tuple,
        }
    }

    /// The record the event targets.
    pub fn record_key(&self) -> RecordKey {
        RecordKey::new(*self.table(), self.key_tuple().to_vec())
    }

    /// A short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreEvent::SetRecord { .. } => "set_record",
            StoreEvent::SpliceStaticData { .. } => "splice_static",
            StoreEvent::SpliceDynamicData { .. } => "splice_dynamic",
            StoreEvent::DeleteRecord { .. } => "delete_record",
        }
    }
}

/// The position of an event in the global log. Ids start at zero and increase by one.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct EventId(pub u64);

impl EventId {
    /// The id following this one.
    pub fn next(self) -> EventId {
        EventId(self.0.saturating_add(1))
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event together with its log position.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct LoggedEvent {
    /// The log position.
    pub id: EventId,
    /// The event.
    pub event: StoreEvent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{from_bytes_canonical, to_bytes_canonical};
    use crate::resource::ResourceType;

    fn table() -> ResourceId {
        ResourceId::new(ResourceType::Table, "app", "Tasks").unwrap()
    }

    #[test]
    fn test_wire_layout_of_splice_static() {
        let event = StoreEvent::SpliceStaticData {
            table: table(),
            key_tuple: vec![[7u8; 32]],
            start: 3,
            data: vec![0xAA, 0xBB],
        };
        let bytes = to_bytes_canonical(&event);
        // variant, table, compact(1), word, u64 LE, compact(2), data
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..33], &table().0);
        assert_eq!(bytes[33], 1 << 2);
        assert_eq!(&bytes[34..66], &[7u8; 32]);
        assert_eq!(&bytes[66..74], &3u64.to_le_bytes());
        assert_eq!(bytes[74], 2 << 2);
        assert_eq!(&bytes[75..], &[0xAA, 0xBB]);
        assert_eq!(from_bytes_canonical::<StoreEvent>(&bytes).unwrap(), event);
    }

    #[test]
    fn test_variant_indices_are_stable() {
        let delete = StoreEvent::DeleteRecord {
            table: table(),
            key_tuple: vec![],
        };
        assert_eq!(to_bytes_canonical(&delete)[0], 3);
        let splice = StoreEvent::SpliceDynamicData {
            table: table(),
            key_tuple: vec![],
            start: 0,
            delete_count: 0,
            encoded_lengths: EncodedLengths::empty(),
            data: vec![],
        };
        assert_eq!(to_bytes_canonical(&splice)[0], 2);
        assert_eq!(splice.kind(), "splice_dynamic");
        assert_eq!(splice.record_key(), RecordKey::new(table(), vec![]));
    }

    #[test]
    fn test_logged_event_json_shape() {
        let logged = LoggedEvent {
            id: EventId(5),
            event: StoreEvent::DeleteRecord {
                table: table(),
                key_tuple: vec![[1u8; 32]],
            },
        };
        let json = serde_json::to_value(&logged).unwrap();
        assert_eq!(json["id"], 5);
        assert!(json["event"].get("DeleteRecord").is_some());
        let back: LoggedEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, logged);
    }
}
