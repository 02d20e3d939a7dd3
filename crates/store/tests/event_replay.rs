// Path: crates/store/tests/event_replay.rs

use proptest::prelude::*;
use std::collections::BTreeMap;
use tessera_api::frame::CallFrame;
use tessera_api::state::MemoryState;
use tessera_store::{
    delete_record, get_field_layout, get_record, pop_from_dynamic_field, push_to_dynamic_field,
    register_store_tables, register_table, set_static_field, splice_dynamic_field, TableDefinition,
};
use tessera_types::schema::{DynamicType, StaticType};
use tessera_types::{FieldLayout, Record, ResourceId, ResourceType, Schema, StoreEvent, Word};

#[derive(Clone, Debug)]
enum Op {
    SetSeq(u8, u32),
    Push(u8, usize, Vec<u8>),
    Pop(u8, usize, u64),
    Splice(u8, usize, u64, u64, Vec<u8>),
    Delete(u8),
}

fn ops() -> impl Strategy<Value = Op> {
    let key = 0u8..3;
    let field = 0usize..2;
    prop_oneof![
        (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::SetSeq(k, v)),
        (key.clone(), field.clone(), proptest::collection::vec(any::<u8>(), 0..5))
            .prop_map(|(k, f, d)| Op::Push(k, f, d)),
        (key.clone(), field.clone(), 0u64..4).prop_map(|(k, f, n)| Op::Pop(k, f, n)),
        (key.clone(), field, 0u64..6, 0u64..3, proptest::collection::vec(any::<u8>(), 0..3))
            .prop_map(|(k, f, s, d, data)| Op::Splice(k, f, s, d, data)),
        key.prop_map(Op::Delete),
    ]
}

fn posts() -> ResourceId {
    ResourceId::new(ResourceType::Table, "app", "Posts").unwrap()
}

fn key(k: u8) -> Vec<Word> {
    vec![[k; 32]]
}

/// Replays one event onto a shadow copy using only the record splice rules.
fn replay(shadow: &mut BTreeMap<Vec<Word>, Record>, layout: &FieldLayout, event: &StoreEvent) {
    let key_tuple = event.key_tuple().to_vec();
    match event {
        StoreEvent::SetRecord {
            static_data,
            encoded_lengths,
            dynamic_data,
            ..
        } => {
            shadow.insert(
                key_tuple,
                Record {
                    static_data: static_data.clone(),
                    encoded_lengths: *encoded_lengths,
                    dynamic_data: dynamic_data.clone(),
                },
            );
        }
        StoreEvent::SpliceStaticData { start, data, .. } => {
            let record = shadow.entry(key_tuple).or_insert_with(|| Record::empty(layout));
            record.splice_static(*start, data).unwrap();
        }
        StoreEvent::SpliceDynamicData {
            start,
            delete_count,
            encoded_lengths,
            data,
            ..
        } => {
            let record = shadow.entry(key_tuple).or_insert_with(|| Record::empty(layout));
            record
                .splice_dynamic(layout, *start, *delete_count, *encoded_lengths, data)
                .unwrap();
        }
        StoreEvent::DeleteRecord { .. } => {
            shadow.remove(&key_tuple);
        }
    }
}

proptest! {
    #[test]
    fn prop_events_reproduce_stored_records(script in proptest::collection::vec(ops(), 1..30)) {
        let base = MemoryState::new();
        let mut frame = CallFrame::new(&base);
        register_store_tables(&mut frame).unwrap();
        let definition = TableDefinition::new(
            Schema::static_only(vec![StaticType::FixedBytes(32)]).unwrap(),
            Schema::new(vec![StaticType::Uint(4)], vec![DynamicType::Bytes, DynamicType::Bytes]).unwrap(),
        );
        register_table(&mut frame, &posts(), &definition).unwrap();
        let layout = get_field_layout(frame.state(), &posts()).unwrap();
        let mut shadow = BTreeMap::new();

        for op in script {
            let before_events = frame.events().len();
            let touched = match &op {
                Op::SetSeq(k, _) | Op::Push(k, ..) | Op::Pop(k, ..) | Op::Splice(k, ..) | Op::Delete(k) => *k,
            };
            let before = get_record(frame.state(), &posts(), &key(touched)).unwrap();
            let result = match &op {
                Op::SetSeq(k, v) => set_static_field(&mut frame, &posts(), &key(*k), 0, &v.to_be_bytes()),
                Op::Push(k, f, d) => push_to_dynamic_field(&mut frame, &posts(), &key(*k), *f, d),
                Op::Pop(k, f, n) => pop_from_dynamic_field(&mut frame, &posts(), &key(*k), *f, *n),
                Op::Splice(k, f, s, d, data) => {
                    splice_dynamic_field(&mut frame, &posts(), &key(*k), *f, *s, *d, data)
                }
                Op::Delete(k) => delete_record(&mut frame, &posts(), &key(*k)),
            };
            match result {
                Ok(()) => {
                    let events = frame.events();
                    prop_assert_eq!(events.len(), before_events + 1);
                    if let Some(event) = events.last() {
                        replay(&mut shadow, &layout, event);
                    }
                }
                Err(_) => {
                    prop_assert_eq!(frame.events().len(), before_events);
                    prop_assert_eq!(get_record(frame.state(), &posts(), &key(touched)).unwrap(), before);
                }
            }
            let stored = get_record(frame.state(), &posts(), &key(touched)).unwrap();
            prop_assert_eq!(stored.as_ref(), shadow.get(&key(touched)));
        }
    }
}
