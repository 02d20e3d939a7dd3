// Path: crates/replicator/src/reducer.rs

//! The pure record reducer.
//!
//! Splices go through `Record::splice_*`, the same code the record store runs,
//! so a replica computes byte-identical records from the same events.

use tessera_types::error::StoreError;
use tessera_types::{FieldLayout, Record, StoreEvent};

/// Applies one event to the previous value of its record.
///
/// `SetRecord` replaces, splices patch the previous record (or an empty one
/// if there is none yet) and `DeleteRecord` removes. `None` means the record
/// does not exist afterwards.
pub fn reduce(
    previous: Option<Record>,
    layout: &FieldLayout,
    event: &StoreEvent,
) -> Result<Option<Record>, StoreError> {
    match event {
        StoreEvent::SetRecord {
            static_data,
            encoded_lengths,
            dynamic_data,
            ..
        } => Ok(Some(Record {
            static_data: static_data.clone(),
            encoded_lengths: *encoded_lengths,
            dynamic_data: dynamic_data.clone(),
        })),
        StoreEvent::SpliceStaticData { start, data, .. } => {
            let mut record = previous.unwrap_or_else(|| Record::empty(layout));
            record.splice_static(*start, data)?;
            Ok(Some(record))
        }
        StoreEvent::SpliceDynamicData {
            start,
            delete_count,
            encoded_lengths,
            data,
            ..
        } => {
            let mut record = previous.unwrap_or_else(|| Record::empty(layout));
            record.splice_dynamic(layout, *start, *delete_count, *encoded_lengths, data)?;
            Ok(Some(record))
        }
        StoreEvent::DeleteRecord { .. } => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_types::{EncodedLengths, ResourceId, ResourceType, Word};

    fn table() -> ResourceId {
        ResourceId::new(ResourceType::Table, "app", "Notes").unwrap()
    }

    fn key() -> Vec<Word> {
        vec![[7u8; 32]]
    }

    fn layout() -> FieldLayout {
        FieldLayout::new(&[4, 1], 2).unwrap()
    }

    #[test]
    fn test_splices_start_from_empty_record() {
        let event = StoreEvent::SpliceStaticData {
            table: table(),
            key_tuple: key(),
            start: 4,
            data: vec![1],
        };
        let record = reduce(None, &layout(), &event).unwrap().unwrap();
        assert_eq!(record.static_data, vec![0, 0, 0, 0, 1]);
        assert_eq!(record.encoded_lengths, EncodedLengths::empty());

        let lengths = EncodedLengths::from_lengths(&[0, 2]).unwrap();
        let event = StoreEvent::SpliceDynamicData {
            table: table(),
            key_tuple: key(),
            start: 0,
            delete_count: 0,
            encoded_lengths: lengths,
            data: b"hi".to_vec(),
        };
        let record = reduce(Some(record), &layout(), &event).unwrap().unwrap();
        assert_eq!(record.dynamic_data, b"hi".to_vec());
        assert_eq!(record.static_data, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_delete_then_splice_restarts_empty() {
        let set = StoreEvent::SetRecord {
            table: table(),
            key_tuple: key(),
            static_data: vec![9; 5],
            encoded_lengths: EncodedLengths::empty(),
            dynamic_data: vec![],
        };
        let record = reduce(None, &layout(), &set).unwrap();
        let deleted = reduce(
            record,
            &layout(),
            &StoreEvent::DeleteRecord {
                table: table(),
                key_tuple: key(),
            },
        )
        .unwrap();
        assert_eq!(deleted, None);
        let splice = StoreEvent::SpliceStaticData {
            table: table(),
            key_tuple: key(),
            start: 0,
            data: vec![1],
        };
        let record = reduce(deleted, &layout(), &splice).unwrap().unwrap();
        assert_eq!(record.static_data, vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_invalid_splice_is_rejected() {
        let event = StoreEvent::SpliceDynamicData {
            table: table(),
            key_tuple: key(),
            start: 1,
            delete_count: 0,
            encoded_lengths: EncodedLengths::from_lengths(&[1]).unwrap(),
            data: vec![1],
        };
        assert!(matches!(
            reduce(None, &layout(), &event),
            Err(StoreError::IndexOutOfBounds { .. })
        ));
    }

    fn static_splice() -> impl Strategy<Value = StoreEvent> {
        (0u64..5).prop_flat_map(|start| {
            proptest::collection::vec(any::<u8>(), 0..=(5 - start as usize)).prop_map(move |data| {
                StoreEvent::SpliceStaticData {
                    table: table(),
                    key_tuple: key(),
                    start,
                    data,
                }
            })
        })
    }

    proptest! {
        #[test]
        fn prop_replay_is_deterministic(events in proptest::collection::vec(static_splice(), 0..20)) {
            let replay = || {
                events
                    .iter()
                    .try_fold(None, |prev, event| reduce(prev, &layout(), event))
                    .unwrap()
            };
            prop_assert_eq!(replay(), replay());
        }

        #[test]
        fn prop_static_splice_only_touches_its_range(
            base in proptest::collection::vec(any::<u8>(), 5),
            event in static_splice(),
        ) {
            let previous = Record {
                static_data: base.clone(),
                encoded_lengths: EncodedLengths::empty(),
                dynamic_data: vec![],
            };
            let record = reduce(Some(previous), &layout(), &event).unwrap().unwrap();
            let StoreEvent::SpliceStaticData { start, data, .. } = &event else { unreachable!() };
            let start = *start as usize;
            prop_assert_eq!(record.static_data.len(), 5);
            prop_assert_eq!(&record.static_data[start..start + data.len()], data.as_slice());
            prop_assert_eq!(&record.static_data[..start], &base[..start]);
            prop_assert_eq!(&record.static_data[start + data.len()..], &base[start + data.len()..]);
        }
    }
}
