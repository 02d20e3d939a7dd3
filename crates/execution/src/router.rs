// Path: crates/execution/src/router.rs

//! Call dispatch.
//!
//! Every entry point funnels into [`Router::invoke`]. The mode is a property
//! of the target, not of the entry point; entry points differ only in which
//! targets they accept and who the caller is.

use crate::context::{CallContext, CallMode};
use crate::directory::ExecutableDirectory;
use parity_scale_codec::{Decode, Encode};
use tessera_api::frame::CallFrame;
use tessera_registry::{credit_balance, get_system, has_delegation, is_authorized, transfer_balance};
use tessera_types::config::WorldConfig;
use tessera_types::error::{CallError, RegistryError};
use tessera_types::{Address, ResourceId};

/// One call in a batch.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct SystemCall {
    /// The system to call.
    pub target: ResourceId,
    /// Raw input handed to the system.
    pub input: Vec<u8>,
    /// Value attached to the call.
    pub value: u128,
}

/// Where the value attached to an invocation comes from.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Funding {
    /// Top-level value, credited to the target's namespace.
    Credit,
    /// Nested value, paid from a namespace by a spender.
    Transfer { from: ResourceId, spender: Address },
}

pub(crate) struct Invocation<'i> {
    pub(crate) caller: Address,
    pub(crate) target: ResourceId,
    pub(crate) input: &'i [u8],
    pub(crate) value: u128,
    pub(crate) funding: Funding,
    pub(crate) allow_root: bool,
}

/// Resolves system ids to code and runs them.
#[derive(Debug)]
pub struct Router {
    directory: ExecutableDirectory,
    config: WorldConfig,
}

impl Router {
    /// Creates a router over the deployed executables.
    pub fn new(directory: ExecutableDirectory, config: WorldConfig) -> Self {
        Self { directory, config }
    }

    /// The deployed executables.
    pub fn directory(&self) -> &ExecutableDirectory {
        &self.directory
    }

    /// Mutable access to the deployed executables.
    pub fn directory_mut(&mut self) -> &mut ExecutableDirectory {
        &mut self.directory
    }

    /// The router's limits.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The generic entry point. Runs any target in the mode its namespace
    /// selects.
    pub fn call(
        &self,
        frame: &mut CallFrame<'_>,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        self.top_level(frame, caller, target, input, value, true)
    }

    /// The narrow entry point for root systems. Non-root targets are refused
    /// with `RootModeMisuse`.
    pub fn call_root(
        &self,
        frame: &mut CallFrame<'_>,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        if CallMode::for_target(target) != CallMode::Root {
            return Err(CallError::RootModeMisuse(*target));
        }
        self.top_level(frame, caller, target, input, value, true)
    }

    /// Runs a list of calls in order, stopping at the first failure. Root
    /// targets are refused.
    pub fn batch_call(
        &self,
        frame: &mut CallFrame<'_>,
        caller: Address,
        calls: &[SystemCall],
    ) -> Result<Vec<Vec<u8>>, CallError> {
        if calls.len() > self.config.max_batch_calls {
            return Err(CallError::BatchTooLarge {
                max: self.config.max_batch_calls,
                got: calls.len(),
            });
        }
        if let Some(root) = calls.iter().find(|c| c.target.in_root_namespace()) {
            return Err(CallError::RootModeMisuse(root.target));
        }
        calls
            .iter()
            .map(|c| self.top_level(frame, caller, &c.target, &c.input, c.value, false))
            .collect()
    }

    /// Calls on behalf of `delegator`. `caller` must hold a delegation from
    /// it. Root targets are refused.
    pub fn call_from(
        &self,
        frame: &mut CallFrame<'_>,
        delegator: Address,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
    ) -> Result<Vec<u8>, CallError> {
        if target.in_root_namespace() {
            return Err(CallError::RootModeMisuse(*target));
        }
        if delegator != caller && !has_delegation(frame.state(), delegator, caller)? {
            return Err(RegistryError::DelegationNotFound {
                delegator,
                delegatee: caller,
            }
            .into());
        }
        tracing::debug!(target: "router", delegator = %delegator, delegatee = %caller, "delegated call");
        self.top_level(frame, delegator, target, input, value, false)
    }

    fn top_level(
        &self,
        frame: &mut CallFrame<'_>,
        caller: Address,
        target: &ResourceId,
        input: &[u8],
        value: u128,
        allow_root: bool,
    ) -> Result<Vec<u8>, CallError> {
        let invocation = Invocation {
            caller,
            target: *target,
            input,
            value,
            funding: Funding::Credit,
            allow_root,
        };
        self.invoke(frame, invocation, 1)
    }

    /// The single dispatch path. Resolves the target, checks the caller, runs
    /// the system in a child of `parent` and absorbs the child on success.
    pub(crate) fn invoke(
        &self,
        parent: &mut CallFrame<'_>,
        invocation: Invocation<'_>,
        depth: usize,
    ) -> Result<Vec<u8>, CallError> {
        let target = invocation.target;
        if depth > self.config.max_call_depth {
            return Err(CallError::CallDepthExceeded(depth));
        }
        let mode = CallMode::for_target(&target);
        if mode == CallMode::Root && !invocation.allow_root {
            return Err(CallError::RootModeMisuse(target));
        }
        let system = get_system(parent.state(), &target)?.ok_or(RegistryError::NotRegistered(target))?;
        if !is_authorized(parent.state(), &target, invocation.caller)? {
            tracing::debug!(target: "router", system = %target, caller = %invocation.caller, "call denied");
            return Err(RegistryError::AccessDenied {
                resource: target,
                caller: invocation.caller,
            }
            .into());
        }
        let code = self
            .directory
            .get(&system.executable)
            .ok_or(CallError::ExecutableMissing {
                system: target,
                executable: system.executable,
            })?;

        let (output, changes) = {
            let mut child = parent.child();
            match invocation.funding {
                Funding::Credit => credit_balance(&mut child, &target.namespace_id(), invocation.value)?,
                Funding::Transfer { from, spender } => transfer_balance(
                    &mut child,
                    spender,
                    &from,
                    &target.namespace_id(),
                    invocation.value,
                )?,
            }
            let output = {
                let mut ctx = CallContext {
                    router: self,
                    frame: &mut child,
                    caller: invocation.caller,
                    value: invocation.value,
                    target,
                    executable: system.executable,
                    mode,
                    depth,
                };
                code.call(&mut ctx, invocation.input)?
            };
            (output, child.finish())
        };
        let emitted = changes.events.len();
        parent.absorb(changes)?;
        tracing::debug!(
            target: "router",
            system = %target,
            caller = %invocation.caller,
            mode = ?mode,
            depth,
            events = emitted,
            "call succeeded"
        );
        Ok(output)
    }
}
