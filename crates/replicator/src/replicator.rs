// Path: crates/replicator/src/replicator.rs

//! The log consumer that keeps a [`Replica`] current.

use crate::replica::Replica;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tessera_api::event_log::EventLog;
use tessera_types::config::ReplicatorConfig;
use tessera_types::error::{ErrorCode, ReplicaError};
use tessera_types::EventId;

/// What one pass over the log did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatorStats {
    /// Events fetched from the log.
    pub events_read: usize,
    /// Events that changed the replica. Redelivered events are not counted.
    pub events_applied: usize,
    /// Wall time of the pass.
    pub duration: Duration,
    /// The replica checkpoint after the pass.
    pub cursor: Option<EventId>,
}

/// Reads batches from an event log and applies them to a replica.
pub struct Replicator {
    log: Arc<dyn EventLog>,
    replica: RwLock<Replica>,
    config: ReplicatorConfig,
    shutdown: Arc<AtomicBool>,
}

impl Replicator {
    /// A replicator starting from an empty replica.
    pub fn new(log: Arc<dyn EventLog>, config: ReplicatorConfig) -> Result<Self, ReplicaError> {
        Ok(Self::with_replica(log, Replica::new()?, config))
    }

    /// A replicator resuming from an existing replica, e.g. one restored
    /// from a snapshot.
    pub fn with_replica(log: Arc<dyn EventLog>, replica: Replica, config: ReplicatorConfig) -> Self {
        Self {
            log,
            replica: RwLock::new(replica),
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Read access to the replica.
    pub fn replica(&self) -> parking_lot::RwLockReadGuard<'_, Replica> {
        self.replica.read()
    }

    /// Takes a snapshot of the replica.
    pub fn snapshot(&self) -> Vec<u8> {
        self.replica.read().snapshot()
    }

    /// Fetches at most `batch_events_max` events past the checkpoint and
    /// applies them.
    pub fn run_once(&self) -> Result<ReplicatorStats, ReplicaError> {
        let start = Instant::now();
        let mut replica = self.replica.write();
        let from = replica.next_event_id();
        let tip = self.log.next_event_id();
        if from >= tip {
            return Ok(ReplicatorStats {
                events_read: 0,
                events_applied: 0,
                duration: start.elapsed(),
                cursor: replica.checkpoint(),
            });
        }
        let batch = self.config.batch_events_max.max(1) as u64;
        let to = EventId(tip.0.min(from.0.saturating_add(batch)));
        let events = self.log.read_events(from, Some(to))?;
        let applied = if self.config.parallel_apply {
            replica.apply_batch_partitioned(&events)?
        } else {
            replica.apply_batch(&events)?
        };
        let stats = ReplicatorStats {
            events_read: events.len(),
            events_applied: applied,
            duration: start.elapsed(),
            cursor: replica.checkpoint(),
        };
        tracing::debug!(
            target: "replicator",
            read = stats.events_read,
            applied = stats.events_applied,
            cursor = ?stats.cursor.map(|id| id.0),
            elapsed_ms = stats.duration.as_millis() as u64,
            "applied batch"
        );
        Ok(stats)
    }

    /// Applies batches until the log is drained.
    pub fn catch_up(&self) -> Result<usize, ReplicaError> {
        let mut total = 0;
        loop {
            let stats = self.run_once()?;
            if stats.events_read == 0 {
                return Ok(total);
            }
            total += stats.events_applied;
        }
    }

    /// Replicates until [`shutdown`](Self::shutdown) is called. When caught
    /// up it waits for an append notification or the poll interval,
    /// whichever comes first. Errors are logged and retried after a second.
    ///
    /// The wakeup is registered before each pass, so an append that lands
    /// while a pass runs still wakes the next wait.
    pub async fn run_continuous(&self) {
        let notify = self.log.notifier();
        tracing::info!(target: "replicator", next = %self.replica.read().next_event_id(), "replicator started");
        while !self.shutdown.load(Ordering::SeqCst) {
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            match self.run_once() {
                Ok(stats) if stats.events_read == 0 => {
                    tokio::select! {
                        _ = &mut notified => {}
                        _ = tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)) => {}
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(target: "replicator", code = e.code(), error = %e, "replication failed");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
        tracing::info!(target: "replicator", "replicator stopped");
    }

    /// Asks [`run_continuous`](Self::run_continuous) to return. A loop
    /// waiting for appends is woken right away.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.log.notifier().notify_waiters();
    }

    /// Number of logged events not yet applied.
    pub fn lag(&self) -> u64 {
        let next = self.replica.read().next_event_id();
        self.log.next_event_id().0.saturating_sub(next.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_api::event_log::MemoryEventLog;
    use tessera_store::{TableDefinition, TABLES_TABLE};
    use tessera_types::schema::StaticType;
    use tessera_types::{ResourceId, ResourceType, Schema, StoreEvent};

    fn counters() -> ResourceId {
        ResourceId::new(ResourceType::Table, "app", "Counters").unwrap()
    }

    fn seeded_log(writes: u8) -> Arc<MemoryEventLog> {
        let log = Arc::new(MemoryEventLog::new());
        let record = TableDefinition::new(
            Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
            Schema::static_only(vec![StaticType::Uint(1)]).unwrap(),
        )
        .to_record()
        .unwrap();
        let mut events = vec![StoreEvent::SetRecord {
            table: TABLES_TABLE,
            key_tuple: vec![counters().0],
            static_data: record.static_data,
            encoded_lengths: record.encoded_lengths,
            dynamic_data: record.dynamic_data,
        }];
        for n in 0..writes {
            events.push(StoreEvent::SpliceStaticData {
                table: counters(),
                key_tuple: vec![[n % 3; 32]],
                start: 0,
                data: vec![n],
            });
        }
        log.append_batch(&events).unwrap();
        log
    }

    #[test]
    fn test_run_once_respects_batch_size() {
        let log = seeded_log(9);
        let config = ReplicatorConfig {
            batch_events_max: 4,
            ..Default::default()
        };
        let replicator = Replicator::new(log, config).unwrap();
        assert_eq!(replicator.lag(), 10);
        let stats = replicator.run_once().unwrap();
        assert_eq!(stats.events_read, 4);
        assert_eq!(stats.cursor, Some(EventId(3)));
        assert_eq!(replicator.lag(), 6);
        assert_eq!(replicator.catch_up().unwrap(), 6);
        assert_eq!(replicator.lag(), 0);
        assert_eq!(replicator.run_once().unwrap().events_read, 0);
    }

    #[test]
    fn test_parallel_and_sequential_modes_agree() {
        let sequential = Replicator::new(seeded_log(30), ReplicatorConfig::default()).unwrap();
        let parallel = Replicator::new(
            seeded_log(30),
            ReplicatorConfig {
                parallel_apply: true,
                batch_events_max: 7,
                ..Default::default()
            },
        )
        .unwrap();
        sequential.catch_up().unwrap();
        parallel.catch_up().unwrap();
        let left: Vec<_> = sequential.replica().table_records(&counters());
        let right: Vec<_> = parallel.replica().table_records(&counters());
        assert_eq!(left, right);
        assert_eq!(left.len(), 3);
        assert_eq!(sequential.replica().checkpoint(), parallel.replica().checkpoint());
    }
}
