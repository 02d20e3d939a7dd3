// Path: crates/replicator/src/replica.rs

//! A mirror of the record store rebuilt from events alone.
//!
//! The replica learns table layouts from the `store:Tables` records that flow
//! through the stream, so it needs nothing but the log. Every key remembers
//! the last event applied to it; anything at or below that position is
//! skipped, which makes redelivery harmless.

use crate::reducer::reduce;
use parity_scale_codec::{Decode, Encode};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tessera_store::{tables_definition, TableDefinition, TABLES_TABLE};
use tessera_types::codec::{from_bytes_canonical, to_bytes_canonical};
use tessera_types::error::ReplicaError;
use tessera_types::{EventId, FieldLayout, LoggedEvent, Record, RecordKey, ResourceId, Word};

#[derive(Encode, Decode)]
struct Snapshot {
    cursor: Option<EventId>,
    records: Vec<(RecordKey, Record)>,
    key_cursors: Vec<(RecordKey, EventId)>,
}

/// The mirrored records, the layouts learned so far and the replay cursors.
#[derive(Clone, Debug)]
pub struct Replica {
    records: BTreeMap<RecordKey, Record>,
    layouts: HashMap<ResourceId, FieldLayout>,
    cursor: Option<EventId>,
    key_cursors: BTreeMap<RecordKey, EventId>,
}

struct KeyWork<'e> {
    key: RecordKey,
    record: Option<Record>,
    cursor: Option<EventId>,
    layout: FieldLayout,
    events: Vec<&'e LoggedEvent>,
}

impl Replica {
    /// An empty replica that knows only the layout of `store:Tables`.
    pub fn new() -> Result<Self, ReplicaError> {
        let mut layouts = HashMap::new();
        layouts.insert(TABLES_TABLE, tables_definition()?.field_layout()?);
        Ok(Self {
            records: BTreeMap::new(),
            layouts,
            cursor: None,
            key_cursors: BTreeMap::new(),
        })
    }

    /// The id of the last event applied, or `None` before the first.
    pub fn checkpoint(&self) -> Option<EventId> {
        self.cursor
    }

    /// The id replay should resume from.
    pub fn next_event_id(&self) -> EventId {
        self.cursor.map_or(EventId(0), EventId::next)
    }

    /// The id of the last event applied to `key`.
    pub fn key_checkpoint(&self, key: &RecordKey) -> Option<EventId> {
        self.key_cursors.get(key).copied()
    }

    /// Looks up a mirrored record.
    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.records.get(key)
    }

    /// Looks up a mirrored record by table and key tuple.
    pub fn get_record(&self, table: &ResourceId, key_tuple: &[Word]) -> Option<&Record> {
        self.records.get(&RecordKey::new(*table, key_tuple.to_vec()))
    }

    /// All mirrored records of one table, in key order.
    pub fn table_records(&self, table: &ResourceId) -> Vec<(Vec<Word>, Record)> {
        self.records
            .iter()
            .filter(|(key, _)| key.table == *table)
            .map(|(key, record)| (key.key_tuple.clone(), record.clone()))
            .collect()
    }

    /// All mirrored records in key order.
    pub fn records(&self) -> impl Iterator<Item = (&RecordKey, &Record)> {
        self.records.iter()
    }

    /// Number of mirrored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is mirrored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The layout learned for a table.
    pub fn layout(&self, table: &ResourceId) -> Option<&FieldLayout> {
        self.layouts.get(table)
    }

    fn advance(&mut self, id: EventId) {
        if self.cursor.map_or(true, |c| id > c) {
            self.cursor = Some(id);
        }
    }

    fn store_result(&mut self, key: RecordKey, record: Option<Record>) {
        match record {
            Some(record) => {
                self.records.insert(key, record);
            }
            None => {
                self.records.remove(&key);
            }
        }
    }

    /// Re-derives a table layout after its `store:Tables` row changed.
    fn learn_layout(&mut self, tables_key: &RecordKey) -> Result<(), ReplicaError> {
        let Some(table) = tables_key.key_tuple.first().map(|word| ResourceId(*word)) else {
            return Ok(());
        };
        match self.records.get(tables_key) {
            Some(record) => {
                let layout = TableDefinition::from_record(record)?.field_layout()?;
                tracing::debug!(target: "replicator", table = %table, "learned table layout");
                self.layouts.insert(table, layout);
            }
            None => {
                self.layouts.remove(&table);
            }
        }
        Ok(())
    }

    /// Applies one event. Returns false if it was already applied.
    pub fn apply(&mut self, logged: &LoggedEvent) -> Result<bool, ReplicaError> {
        let key = logged.event.record_key();
        if self.key_cursors.get(&key).is_some_and(|c| *c >= logged.id) {
            self.advance(logged.id);
            return Ok(false);
        }
        let layout = self
            .layouts
            .get(&key.table)
            .ok_or(ReplicaError::UnknownTable(key.table))?;
        let next = reduce(self.records.get(&key).cloned(), layout, &logged.event)?;
        self.store_result(key.clone(), next);
        self.key_cursors.insert(key.clone(), logged.id);
        if key.table == TABLES_TABLE {
            self.learn_layout(&key)?;
        }
        self.advance(logged.id);
        Ok(true)
    }

    /// Applies events in order. Returns the number actually applied.
    pub fn apply_batch(&mut self, events: &[LoggedEvent]) -> Result<usize, ReplicaError> {
        let mut applied = 0;
        for logged in events {
            if self.apply(logged)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Applies events with distinct keys in parallel.
    ///
    /// `store:Tables` events go first so every layout is known, then each
    /// key's events are reduced in log order on the rayon pool. Keys never
    /// share state, so the result equals [`apply_batch`](Self::apply_batch).
    ///
    /// On error the batch may be partly applied: keys merged before the
    /// failing one keep their new records and cursors while the global
    /// checkpoint stays put. Retrying the same batch is safe since per-key
    /// cursors skip what already landed.
    pub fn apply_batch_partitioned(&mut self, events: &[LoggedEvent]) -> Result<usize, ReplicaError> {
        let (layout_events, data_events): (Vec<&LoggedEvent>, Vec<&LoggedEvent>) =
            events.iter().partition(|e| *e.event.table() == TABLES_TABLE);

        let mut applied = 0;
        for logged in layout_events {
            if self.apply(logged)? {
                applied += 1;
            }
        }

        let mut grouped: BTreeMap<RecordKey, Vec<&LoggedEvent>> = BTreeMap::new();
        for logged in data_events {
            grouped.entry(logged.event.record_key()).or_default().push(logged);
        }
        let mut work = Vec::with_capacity(grouped.len());
        for (key, events) in grouped {
            let layout = self
                .layouts
                .get(&key.table)
                .cloned()
                .ok_or(ReplicaError::UnknownTable(key.table))?;
            work.push(KeyWork {
                record: self.records.get(&key).cloned(),
                cursor: self.key_cursors.get(&key).copied(),
                key,
                layout,
                events,
            });
        }

        let results: Vec<Result<(KeyWork<'_>, usize), ReplicaError>> = work
            .into_par_iter()
            .map(|mut item| {
                let mut count = 0;
                for logged in &item.events {
                    if item.cursor.is_some_and(|c| c >= logged.id) {
                        continue;
                    }
                    item.record = reduce(item.record.take(), &item.layout, &logged.event)?;
                    item.cursor = Some(logged.id);
                    count += 1;
                }
                Ok((item, count))
            })
            .collect();

        for result in results {
            let (item, count) = result?;
            if let Some(cursor) = item.cursor {
                self.key_cursors.insert(item.key.clone(), cursor);
            }
            self.store_result(item.key, item.record);
            applied += count;
        }
        if let Some(last) = events.iter().map(|e| e.id).max() {
            self.advance(last);
        }
        Ok(applied)
    }

    /// Serializes the full mirror and its cursors.
    pub fn snapshot(&self) -> Vec<u8> {
        to_bytes_canonical(&Snapshot {
            cursor: self.cursor,
            records: self
                .records
                .iter()
                .map(|(key, record)| (key.clone(), record.clone()))
                .collect(),
            key_cursors: self
                .key_cursors
                .iter()
                .map(|(key, id)| (key.clone(), *id))
                .collect(),
        })
    }

    /// Rebuilds a replica from [`snapshot`](Self::snapshot) bytes. Layouts are
    /// re-derived from the mirrored `store:Tables` records.
    pub fn restore(bytes: &[u8]) -> Result<Self, ReplicaError> {
        let snapshot: Snapshot = from_bytes_canonical(bytes).map_err(ReplicaError::Snapshot)?;
        let mut replica = Self::new()?;
        replica.cursor = snapshot.cursor;
        replica.records = snapshot.records.into_iter().collect();
        replica.key_cursors = snapshot.key_cursors.into_iter().collect();
        let tables_keys: Vec<RecordKey> = replica
            .records
            .keys()
            .filter(|key| key.table == TABLES_TABLE)
            .cloned()
            .collect();
        for key in &tables_keys {
            replica.learn_layout(key)?;
        }
        Ok(replica)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_types::schema::StaticType;
    use tessera_types::{ResourceType, Schema, StoreEvent};

    fn notes() -> ResourceId {
        ResourceId::new(ResourceType::Table, "app", "Notes").unwrap()
    }

    fn registration(id: u64) -> LoggedEvent {
        let record = TableDefinition::new(
            Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
            Schema::static_only(vec![StaticType::Uint(2)]).unwrap(),
        )
        .to_record()
        .unwrap();
        LoggedEvent {
            id: EventId(id),
            event: StoreEvent::SetRecord {
                table: TABLES_TABLE,
                key_tuple: vec![notes().0],
                static_data: record.static_data,
                encoded_lengths: record.encoded_lengths,
                dynamic_data: record.dynamic_data,
            },
        }
    }

    fn splice(id: u64, key: u8, start: u64, data: Vec<u8>) -> LoggedEvent {
        LoggedEvent {
            id: EventId(id),
            event: StoreEvent::SpliceStaticData {
                table: notes(),
                key_tuple: vec![[key; 32]],
                start,
                data,
            },
        }
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        let mut replica = Replica::new().unwrap();
        assert!(matches!(
            replica.apply(&splice(0, 1, 0, vec![1])),
            Err(ReplicaError::UnknownTable(_))
        ));
    }

    #[test]
    fn test_layouts_are_learned_from_the_stream() {
        let mut replica = Replica::new().unwrap();
        replica.apply(&registration(0)).unwrap();
        assert_eq!(replica.layout(&notes()), Some(&FieldLayout::new(&[2], 0).unwrap()));
        replica.apply(&splice(1, 1, 1, vec![5])).unwrap();
        assert_eq!(replica.get_record(&notes(), &[[1; 32]]).unwrap().static_data, vec![0, 5]);
        assert_eq!(replica.checkpoint(), Some(EventId(1)));
    }

    #[test]
    fn test_redelivery_is_skipped() {
        let mut replica = Replica::new().unwrap();
        let events = vec![registration(0), splice(1, 1, 0, vec![1, 2]), splice(2, 1, 1, vec![9])];
        assert_eq!(replica.apply_batch(&events).unwrap(), 3);
        let once = replica.get_record(&notes(), &[[1; 32]]).cloned();
        assert_eq!(replica.apply_batch(&events).unwrap(), 0);
        assert_eq!(replica.get_record(&notes(), &[[1; 32]]).cloned(), once);
        assert_eq!(once.unwrap().static_data, vec![1, 9]);
    }

    #[test]
    fn test_partitioned_apply_matches_sequential() {
        let mut events = vec![registration(0)];
        let mut id = 1;
        for round in 0..10u8 {
            for key in 0..4u8 {
                events.push(splice(id, key, u64::from(round % 2), vec![round ^ key]));
                id += 1;
            }
        }
        events.push(LoggedEvent {
            id: EventId(id),
            event: StoreEvent::DeleteRecord {
                table: notes(),
                key_tuple: vec![[2; 32]],
            },
        });

        let mut sequential = Replica::new().unwrap();
        sequential.apply_batch(&events).unwrap();
        let mut parallel = Replica::new().unwrap();
        parallel.apply_batch_partitioned(&events).unwrap();

        assert_eq!(
            sequential.records().collect::<Vec<_>>(),
            parallel.records().collect::<Vec<_>>()
        );
        assert_eq!(sequential.checkpoint(), parallel.checkpoint());
        assert_eq!(parallel.len(), 4);
    }

    #[test]
    fn test_snapshot_restore_keeps_cursors_and_layouts() {
        let mut replica = Replica::new().unwrap();
        replica
            .apply_batch(&[registration(0), splice(1, 3, 0, vec![4, 4])])
            .unwrap();
        let restored = Replica::restore(&replica.snapshot()).unwrap();
        assert_eq!(restored.checkpoint(), Some(EventId(1)));
        assert_eq!(restored.layout(&notes()), replica.layout(&notes()));
        assert_eq!(
            restored.records().collect::<Vec<_>>(),
            replica.records().collect::<Vec<_>>()
        );
        let key = RecordKey::new(notes(), vec![[3; 32]]);
        assert_eq!(restored.key_checkpoint(&key), Some(EventId(1)));
        assert!(matches!(
            Replica::restore(&[0xFF, 0x01]),
            Err(ReplicaError::Snapshot(_))
        ));
    }

    #[test]
    fn test_partial_partitioned_apply_is_safe_to_retry() {
        let mut replica = Replica::new().unwrap();
        let good = vec![registration(0), splice(1, 1, 0, vec![1])];
        let mut bad = good.clone();
        bad.push(splice(2, 2, 5, vec![1]));

        assert!(matches!(
            replica.apply_batch_partitioned(&bad),
            Err(ReplicaError::Store(_))
        ));
        assert_eq!(replica.checkpoint(), Some(EventId(0)));
        assert_eq!(replica.key_checkpoint(&RecordKey::new(notes(), vec![[1; 32]])), Some(EventId(1)));

        assert_eq!(replica.apply_batch_partitioned(&good).unwrap(), 0);
        assert_eq!(replica.checkpoint(), Some(EventId(1)));
        assert_eq!(replica.get_record(&notes(), &[[1; 32]]).unwrap().static_data, vec![1, 0]);
        assert_eq!(replica.get_record(&notes(), &[[2; 32]]), None);
    }
}
