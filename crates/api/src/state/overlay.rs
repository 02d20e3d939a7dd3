// Path: crates/api/src/state/overlay.rs

//! A copy-on-write state overlay for transaction frames.

use crate::state::{StateAccess, StateError, StateKVPair, StateScanIter};
use std::cmp::Ordering;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::iter::{Fuse, Peekable};
use std::ops::Bound::{Excluded, Included, Unbounded};
use std::sync::Arc;

/// A batch of key-value pairs to be inserted or updated in the state.
pub type StateInserts = Vec<(Vec<u8>, Vec<u8>)>;

/// A batch of keys to be deleted from the state.
pub type StateDeletes = Vec<Vec<u8>>;

/// A complete set of state changes (inserts/updates and deletes) from one frame.
pub type StateChangeSet = (StateInserts, StateDeletes);

/// The smallest key strictly greater than every key starting with `prefix`.
/// Returns None if the prefix is empty or all 0xFF bytes.
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|b| *b != 0xFF)?;
    let mut bound = prefix.get(..=last)?.to_vec();
    if let Some(byte) = bound.last_mut() {
        *byte += 1;
    }
    Some(bound)
}

/// Merges a base scan with the overlay's pending writes. Writes shadow base
/// entries with the same key and tombstones hide them.
struct OverlayScan<'a> {
    base: Peekable<Fuse<StateScanIter<'a>>>,
    writes: Peekable<btree_map::Range<'a, Vec<u8>, Option<Vec<u8>>>>,
}

impl<'a> OverlayScan<'a> {
    fn take_write(&mut self) -> Option<StateKVPair> {
        let (key, value) = self.writes.next()?;
        value
            .as_ref()
            .map(|v| (Arc::from(key.as_slice()), Arc::from(v.as_slice())))
    }
}

impl<'a> Iterator for OverlayScan<'a> {
    type Item = Result<StateKVPair, StateError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let order = match (self.base.peek(), self.writes.peek()) {
                (Some(Err(_)), _) => return self.base.next(),
                (Some(Ok((bk, _))), Some((wk, _))) => bk.as_ref().cmp(wk.as_slice()),
                (Some(Ok(_)), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => return None,
            };
            match order {
                Ordering::Less => return self.base.next(),
                Ordering::Equal => {
                    self.base.next();
                    if let Some(pair) = self.take_write() {
                        return Some(Ok(pair));
                    }
                }
                Ordering::Greater => {
                    if let Some(pair) = self.take_write() {
                        return Some(Ok(pair));
                    }
                }
            }
        }
    }
}

/// An in-memory, copy-on-write overlay for any `StateAccess`.
///
/// Reads consult the pending writes first and fall through to `base`.
/// Writes never touch `base`; they are released with `into_ordered_batch`
/// and applied by whoever owns the base.
#[derive(Clone)]
pub struct StateOverlay<'a> {
    base: &'a dyn StateAccess,
    // `None` is a tombstone. Ordered so commits are deterministic.
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> StateOverlay<'a> {
    /// Creates a new, empty overlay on top of a base state accessor.
    pub fn new(base: &'a dyn StateAccess) -> Self {
        Self {
            base,
            writes: BTreeMap::new(),
        }
    }

    /// Number of pending writes, tombstones included.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    /// Consumes the overlay and returns its writes in key order.
    pub fn into_ordered_batch(self) -> StateChangeSet {
        let mut inserts = Vec::new();
        let mut deletes = Vec::new();
        for (key, value) in self.writes {
            match value {
                Some(value) => inserts.push((key, value)),
                None => deletes.push(key),
            }
        }
        (inserts, deletes)
    }
}

impl<'a> StateAccess for StateOverlay<'a> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
        match self.writes.get(key) {
            Some(pending) => Ok(pending.clone()),
            None => self.base.get(key),
        }
    }

    fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StateError> {
        self.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<StateScanIter<'_>, StateError> {
        let base = self.base.prefix_scan(prefix)?.fuse().peekable();
        let end = match prefix_upper_bound(prefix) {
            Some(bound) => Excluded(bound),
            None => Unbounded,
        };
        let writes = self
            .writes
            .range((Included(prefix.to_vec()), end))
            .peekable();
        Ok(Box::new(OverlayScan { base, writes }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryState;
    use proptest::prelude::*;

    fn base() -> MemoryState {
        let mut state = MemoryState::new();
        state.insert(b"a::1", b"one").unwrap();
        state.insert(b"a::2", b"two").unwrap();
        state.insert(b"a::4", b"four").unwrap();
        state.insert(b"b::1", b"other").unwrap();
        state
    }

    fn scan(state: &dyn StateAccess, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        state
            .prefix_scan(prefix)
            .unwrap()
            .map(|r| {
                let (k, v) = r.unwrap();
                (k.to_vec(), v.to_vec())
            })
            .collect()
    }

    #[test]
    fn test_overlay_reads_shadow_base() {
        let base = base();
        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"a::1", b"ONE").unwrap();
        overlay.delete(b"a::2").unwrap();
        assert_eq!(overlay.get(b"a::1").unwrap(), Some(b"ONE".to_vec()));
        assert_eq!(overlay.get(b"a::2").unwrap(), None);
        assert_eq!(overlay.get(b"a::4").unwrap(), Some(b"four".to_vec()));
        assert_eq!(base.get(b"a::1").unwrap(), Some(b"one".to_vec()));
    }

    #[test]
    fn test_overlay_scan_merges_in_order() {
        let base = base();
        let mut overlay = StateOverlay::new(&base);
        overlay.insert(b"a::3", b"three").unwrap();
        overlay.delete(b"a::4").unwrap();
        overlay.insert(b"a::0", b"zero").unwrap();
        let keys: Vec<Vec<u8>> = scan(&overlay, b"a::").into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![b"a::0".to_vec(), b"a::1".to_vec(), b"a::2".to_vec(), b"a::3".to_vec()]
        );
    }

    #[test]
    fn test_nested_overlays_commit_upwards() {
        let mut base = base();
        let (inserts, deletes) = {
            let mut outer = StateOverlay::new(&base);
            outer.insert(b"a::5", b"five").unwrap();
            let (child_inserts, child_deletes) = {
                let mut inner = StateOverlay::new(&outer);
                inner.delete(b"a::1").unwrap();
                assert_eq!(inner.get(b"a::5").unwrap(), Some(b"five".to_vec()));
                inner.into_ordered_batch()
            };
            outer.batch_apply(&child_inserts, &child_deletes).unwrap();
            outer.into_ordered_batch()
        };
        base.batch_apply(&inserts, &deletes).unwrap();
        assert_eq!(base.get(b"a::1").unwrap(), None);
        assert_eq!(base.get(b"a::5").unwrap(), Some(b"five".to_vec()));
    }

    #[test]
    fn test_prefix_upper_bound() {
        assert_eq!(prefix_upper_bound(b"ab"), Some(b"ac".to_vec()));
        assert_eq!(prefix_upper_bound(&[0x01, 0xFF]), Some(vec![0x02]));
        assert_eq!(prefix_upper_bound(&[0xFF, 0xFF]), None);
        assert_eq!(prefix_upper_bound(b""), None);
    }

    fn edge_key() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(prop_oneof![Just(0x00u8), Just(0x01), Just(0xFE), Just(0xFF)], 0..4)
    }

    fn write() -> impl Strategy<Value = (Vec<u8>, Option<Vec<u8>>)> {
        (edge_key(), proptest::option::of(proptest::collection::vec(any::<u8>(), 0..3)))
    }

    proptest! {
        #[test]
        fn prop_overlay_scan_matches_model(
            seed in proptest::collection::vec((edge_key(), proptest::collection::vec(any::<u8>(), 0..3)), 0..12),
            writes in proptest::collection::vec(write(), 0..24),
            prefix in edge_key(),
        ) {
            let mut base = MemoryState::new();
            let mut model = BTreeMap::new();
            for (key, value) in &seed {
                base.insert(key, value).unwrap();
                model.insert(key.clone(), value.clone());
            }
            let mut overlay = StateOverlay::new(&base);
            for (key, value) in &writes {
                match value {
                    Some(value) => {
                        overlay.insert(key, value).unwrap();
                        model.insert(key.clone(), value.clone());
                    }
                    None => {
                        overlay.delete(key).unwrap();
                        model.remove(key);
                    }
                }
            }
            let expected: Vec<(Vec<u8>, Vec<u8>)> = model
                .iter()
                .filter(|(key, _)| key.starts_with(&prefix))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            prop_assert_eq!(scan(&overlay, &prefix), expected);
            for (key, value) in &model {
                let got = overlay.get(key).unwrap();
                prop_assert_eq!(got.as_ref(), Some(value));
            }
        }
    }
}
