// Path: crates/api/src/frame.rs

//! Transaction frames.
//!
//! Every call level runs in its own `CallFrame`: a copy-on-write overlay over
//! the parent's state plus the events the level emitted. A successful child
//! frame is absorbed into its parent; a failed one is simply dropped, taking
//! its writes and events with it.

use crate::state::{StateAccess, StateChangeSet, StateError, StateOverlay};
use tessera_types::StoreEvent;

/// The state changes and events released by a finished frame.
#[derive(Debug, Default)]
pub struct FrameOutput {
    /// Pending state writes in key order.
    pub changes: StateChangeSet,
    /// Buffered events in emission order.
    pub events: Vec<StoreEvent>,
}

/// One transactional call level.
pub struct CallFrame<'a> {
    state: StateOverlay<'a>,
    events: Vec<StoreEvent>,
}

impl<'a> CallFrame<'a> {
    /// Opens a frame over `base`.
    pub fn new(base: &'a dyn StateAccess) -> Self {
        Self {
            state: StateOverlay::new(base),
            events: Vec::new(),
        }
    }

    /// Opens a child frame that sees this frame's pending writes.
    pub fn child(&self) -> CallFrame<'_> {
        CallFrame::new(&self.state)
    }

    /// Read access to the frame's view of state.
    pub fn state(&self) -> &dyn StateAccess {
        &self.state
    }

    /// Write access to the frame's overlay.
    pub fn state_mut(&mut self) -> &mut dyn StateAccess {
        &mut self.state
    }

    /// Buffers an event.
    pub fn emit(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    /// Events buffered so far.
    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    /// Releases the frame's writes and events.
    pub fn finish(self) -> FrameOutput {
        FrameOutput {
            changes: self.state.into_ordered_batch(),
            events: self.events,
        }
    }

    /// Merges a finished child frame into this one.
    pub fn absorb(&mut self, output: FrameOutput) -> Result<(), StateError> {
        let (inserts, deletes) = output.changes;
        self.state.batch_apply(&inserts, &deletes)?;
        self.events.extend(output.events);
        Ok(())
    }
}
