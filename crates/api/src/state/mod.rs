// Path: crates/api/src/state/mod.rs
//! Key/value state access.
//!
//! - `StateAccess`: the byte-level key/value interface every backend implements.
//! - `MemoryState`: an ordered in-memory backend.
//! - `StateOverlay`: a copy-on-write layer used for transaction frames.

use std::sync::Arc;

pub use tessera_types::error::StateError;

/// An atomically reference-counted, owned key slice.
pub type StateKey = Arc<[u8]>;
/// An atomically reference-counted, owned value slice.
pub type StateVal = Arc<[u8]>;
/// An owned key-value pair from the state.
pub type StateKVPair = (StateKey, StateVal);
/// A streaming iterator over key-value pairs in ascending key order.
pub type StateScanIter<'a> = Box<dyn Iterator<Item = Result<StateKVPair, StateError>> + Send + 'a>;

mod accessor;
mod memory;
mod overlay;

pub use accessor::*;
pub use memory::*;
pub use overlay::*;
