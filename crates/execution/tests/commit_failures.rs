// Path: crates/execution/tests/commit_failures.rs

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tessera_api::event_log::{EventLog, MemoryEventLog};
use tessera_api::state::{MemoryState, StateAccess, StateError, StateScanIter};
use tessera_execution::{ExecutableDirectory, World};
use tessera_store::{get_table, TableDefinition};
use tessera_types::config::WorldConfig;
use tessera_types::error::{CallError, ErrorClass, ErrorCode, LogError};
use tessera_types::schema::StaticType;
use tessera_types::{Address, EventId, ResourceId, ResourceType, Schema, StoreEvent};

const ADMIN: Address = Address::repeat_byte(0xAD);
const OWNER: Address = Address::repeat_byte(0x01);

/// A backend whose commits can be made to fail after writing the first insert.
struct FlakyState {
    inner: MemoryState,
    fail_apply: Arc<AtomicBool>,
}

impl StateAccess for FlakyState {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        self.inner.get(key)
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.inner.insert(key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.inner.delete(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        self.inner.prefix_scan(prefix)
    }

    fn batch_apply(
        &mut self,
        inserts: &[(Vec<u8>, Vec<u8>)],
        deletes: &[Vec<u8>],
    ) -> Result<(), StateError> {
        if self.fail_apply.swap(false, Ordering::SeqCst) {
            if let Some((key, value)) = inserts.first() {
                self.inner.insert(key, value)?;
            }
            return Err(StateError::Backend("disk full".into()));
        }
        self.inner.batch_apply(inserts, deletes)
    }
}

/// A log whose appends can be made to fail.
#[derive(Default)]
struct FlakyLog {
    inner: MemoryEventLog,
    fail_append: AtomicBool,
}

impl EventLog for FlakyLog {
    fn append_batch(&self, events: &[StoreEvent]) -> Result<Option<EventId>, LogError> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(LogError::Append("log unavailable".into()));
        }
        self.inner.append_batch(events)
    }

    fn next_event_id(&self) -> EventId {
        self.inner.next_event_id()
    }

    fn read_range(&self, start: EventId, end: Option<EventId>) -> Result<Vec<(EventId, Vec<u8>)>, LogError> {
        self.inner.read_range(start, end)
    }

    fn notifier(&self) -> Arc<tokio::sync::Notify> {
        self.inner.notifier()
    }
}

fn notes() -> ResourceId {
    ResourceId::new(ResourceType::Table, "app", "Notes").unwrap()
}

fn notes_definition() -> TableDefinition {
    TableDefinition::new(
        Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
        Schema::static_only(vec![StaticType::Uint(8)]).unwrap(),
    )
}

fn world_over(state: Box<dyn StateAccess>, log: Arc<dyn EventLog>) -> World {
    tessera_telemetry::init_test_tracing();
    let mut world = World::genesis(state, ExecutableDirectory::new(), log, WorldConfig::default(), ADMIN).unwrap();
    world
        .register_namespace(OWNER, &ResourceId::namespace("app").unwrap())
        .unwrap();
    world
}

#[test]
fn test_failed_state_apply_leaves_log_and_state_untouched() {
    let fail_apply = Arc::new(AtomicBool::new(false));
    let log = Arc::new(MemoryEventLog::new());
    let state = FlakyState {
        inner: MemoryState::new(),
        fail_apply: fail_apply.clone(),
    };
    let mut world = world_over(Box::new(state), log.clone());
    let tip = log.next_event_id();

    fail_apply.store(true, Ordering::SeqCst);
    let err = world.register_table(OWNER, &notes(), &notes_definition()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::State);
    assert_eq!(log.next_event_id(), tip);
    assert_eq!(get_table(world.state(), &notes()).unwrap(), None);

    world.register_table(OWNER, &notes(), &notes_definition()).unwrap();
    assert!(log.next_event_id() > tip);
    assert_eq!(get_table(world.state(), &notes()).unwrap(), Some(notes_definition()));
}

#[test]
fn test_failed_append_rolls_state_back() {
    let log = Arc::new(FlakyLog::default());
    let mut world = world_over(Box::new(MemoryState::new()), log.clone());
    let tip = log.next_event_id();

    log.fail_append.store(true, Ordering::SeqCst);
    let err = world.register_table(OWNER, &notes(), &notes_definition()).unwrap_err();
    assert!(matches!(err, CallError::Log(LogError::Append(_))));
    assert_eq!(log.next_event_id(), tip);
    assert_eq!(get_table(world.state(), &notes()).unwrap(), None);

    log.fail_append.store(false, Ordering::SeqCst);
    world.register_table(OWNER, &notes(), &notes_definition()).unwrap();
    assert_eq!(get_table(world.state(), &notes()).unwrap(), Some(notes_definition()));
}
