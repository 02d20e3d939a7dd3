// Path: crates/execution/src/directory.rs

//! The executable directory: the code deployed in the execution environment,
//! keyed by executable identity.

use crate::context::CallContext;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tessera_types::error::CallError;
use tessera_types::Address;

/// Invocable logic. One value may be deployed under several identities; the
/// registry decides which system id an identity currently backs.
pub trait System: Send + Sync {
    /// Runs the system with its call context and raw input, returning raw output.
    fn call(&self, ctx: &mut CallContext<'_, '_>, input: &[u8]) -> Result<Vec<u8>, CallError>;
}

/// Deployed executables by identity.
#[derive(Clone, Default)]
pub struct ExecutableDirectory {
    executables: BTreeMap<Address, Arc<dyn System>>,
}

impl fmt::Debug for ExecutableDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutableDirectory")
            .field("executables", &self.executables.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExecutableDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploys `system` under `executable`, replacing whatever was there.
    pub fn deploy(&mut self, executable: Address, system: Arc<dyn System>) {
        self.executables.insert(executable, system);
    }

    /// Builder form of [`deploy`](Self::deploy).
    pub fn with(mut self, executable: Address, system: Arc<dyn System>) -> Self {
        self.deploy(executable, system);
        self
    }

    /// Looks up the code deployed under `executable`.
    pub fn get(&self, executable: &Address) -> Option<Arc<dyn System>> {
        self.executables.get(executable).cloned()
    }

    /// Number of deployed executables.
    pub fn len(&self) -> usize {
        self.executables.len()
    }

    /// Returns true if nothing is deployed.
    pub fn is_empty(&self) -> bool {
        self.executables.is_empty()
    }
}
