// Path: crates/execution/src/context.rs

//! The explicit context threaded through every call boundary.

use crate::router::{Funding, Invocation, Router};
use crate::scoped::{RegistryHandle, ScopedStore};
use tessera_api::frame::CallFrame;
use tessera_types::error::CallError;
use tessera_types::{Address, ResourceId};

/// How a system runs, decided by the namespace of its id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    /// Non-root systems: substituted context, scoped store.
    Standard,
    /// Root-namespace systems: caller preserved, unscoped store and registry.
    Root,
}

impl CallMode {
    /// The mode a call to `target` runs in.
    pub fn for_target(target: &ResourceId) -> Self {
        if target.in_root_namespace() {
            CallMode::Root
        } else {
            CallMode::Standard
        }
    }
}

/// Everything a running system may see and touch.
pub struct CallContext<'a, 'f> {
    pub(crate) router: &'a Router,
    pub(crate) frame: &'a mut CallFrame<'f>,
    pub(crate) caller: Address,
    pub(crate) value: u128,
    pub(crate) target: ResourceId,
    pub(crate) executable: Address,
    pub(crate) mode: CallMode,
    pub(crate) depth: usize,
}

impl<'a, 'f> CallContext<'a, 'f> {
    /// The identity that made this call, as the system should see it.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// The value attached to this call.
    pub fn value(&self) -> u128 {
        self.value
    }

    /// The id of the running system.
    pub fn target(&self) -> ResourceId {
        self.target
    }

    /// The identity of the running code.
    pub fn executable(&self) -> Address {
        self.executable
    }

    /// The mode the system runs in.
    pub fn mode(&self) -> CallMode {
        self.mode
    }

    /// Nesting depth; a top-level call runs at depth 1.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The identity store and registry writes are checked against.
    fn acting_identity(&self) -> Address {
        match self.mode {
            CallMode::Standard => self.executable,
            CallMode::Root => self.caller,
        }
    }

    /// The record store as this system may use it. In standard mode every
    /// write is checked against the system's executable; in root mode writes
    /// are unchecked.
    pub fn store(&mut self) -> ScopedStore<'_, 'f> {
        let checked = self.mode == CallMode::Standard;
        ScopedStore::new(&mut *self.frame, self.executable, checked)
    }

    /// Direct access to the call frame. Root mode only; standard systems get
    /// `RootModeMisuse`.
    pub fn root_store(&mut self) -> Result<&mut CallFrame<'f>, CallError> {
        match self.mode {
            CallMode::Root => Ok(&mut *self.frame),
            CallMode::Standard => Err(CallError::RootModeMisuse(self.target)),
        }
    }

    /// The registry, acting as the system's executable in standard mode and
    /// as the original caller in root mode.
    pub fn registry(&mut self) -> RegistryHandle<'_, 'f> {
        let identity = self.acting_identity();
        RegistryHandle::new(&mut *self.frame, identity)
    }

    /// Calls another system. The nested call runs in its own frame: if it
    /// fails, its writes and events are discarded and the error is returned
    /// here, where it may be handled or propagated.
    ///
    /// In standard mode the nested caller is this system's executable; in
    /// root mode the original caller is passed through. Attached value is
    /// paid from this system's namespace.
    pub fn call(&mut self, target: &ResourceId, input: &[u8], value: u128) -> Result<Vec<u8>, CallError> {
        let caller = self.acting_identity();
        let invocation = Invocation {
            caller,
            target: *target,
            input,
            value,
            funding: Funding::Transfer {
                from: self.target.namespace_id(),
                spender: self.executable,
            },
            allow_root: true,
        };
        self.router.invoke(&mut *self.frame, invocation, self.depth + 1)
    }
}
