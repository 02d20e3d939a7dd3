// Path: crates/types/src/error/mod.rs
//! Core error types for Tessera.
//!
//! Every error maps to one of four classes. Validation errors reject malformed
//! input, authorization errors reject the caller, state errors reject an
//! operation the current state does not allow, and execution errors report a
//! failed inner invocation.

use crate::resource::{Address, ResourceId, ResourceType};
use thiserror::Error;

/// The four failure classes every error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Malformed key tuple, length mismatch, unknown table or resource.
    Validation,
    /// Access denied, ownership required, root-mode misuse.
    Authorization,
    /// Duplicate registration, burned namespace, unregistered resource.
    State,
    /// An inner invocation reverted.
    Execution,
}

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;

    /// Returns the failure class of this error.
    fn class(&self) -> ErrorClass;
}

/// Errors building or decoding a `ResourceId`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceIdError {
    /// The namespace segment exceeds 14 bytes.
    #[error("Namespace '{0}' exceeds 14 bytes")]
    NamespaceTooLong(String),
    /// The name segment exceeds 16 bytes.
    #[error("Name '{0}' exceeds 16 bytes")]
    NameTooLong(String),
    /// The type tag is not a known resource type.
    #[error("Unknown resource type tag {0:?}")]
    UnknownType([u8; 2]),
}

impl ErrorCode for ResourceIdError {
    fn code(&self) -> &'static str {
        match self {
            Self::NamespaceTooLong(_) => "RESOURCE_NAMESPACE_TOO_LONG",
            Self::NameTooLong(_) => "RESOURCE_NAME_TOO_LONG",
            Self::UnknownType(_) => "RESOURCE_UNKNOWN_TYPE",
        }
    }

    fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

/// Errors in field layouts, schemas and typed value encoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// More fields than a packed layout can describe.
    #[error("Too many fields: {0}")]
    TooManyFields(usize),
    /// More dynamic fields than the length header can hold.
    #[error("Too many dynamic fields: {0}")]
    TooManyDynamicFields(usize),
    /// A static field width is zero or above 32 bytes.
    #[error("Static field {index} has invalid width {width}")]
    InvalidStaticWidth {
        /// Position of the field.
        index: usize,
        /// The rejected width.
        width: usize,
    },
    /// The total static width does not fit the layout header.
    #[error("Total static width {0} exceeds 65535 bytes")]
    StaticWidthOverflow(usize),
    /// A type id does not name a known schema type.
    #[error("Invalid schema type id {0}")]
    InvalidTypeId(u8),
    /// A value list has the wrong number of entries.
    #[error("Expected {expected} values, got {got}")]
    ValueCount {
        /// Number of fields in the schema.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },
    /// A value does not match its field type.
    #[error("Value for field {index} does not match type {expected}")]
    TypeMismatch {
        /// Position of the field.
        index: usize,
        /// The declared type.
        expected: String,
    },
    /// A numeric value does not fit its declared width.
    #[error("Value for field {index} is out of range")]
    ValueOutOfRange {
        /// Position of the field.
        index: usize,
    },
    /// Encoded data is malformed.
    #[error("Malformed encoding: {0}")]
    Malformed(String),
}

impl ErrorCode for SchemaError {
    fn code(&self) -> &'static str {
        match self {
            Self::TooManyFields(_) => "SCHEMA_TOO_MANY_FIELDS",
            Self::TooManyDynamicFields(_) => "SCHEMA_TOO_MANY_DYNAMIC_FIELDS",
            Self::InvalidStaticWidth { .. } => "SCHEMA_INVALID_STATIC_WIDTH",
            Self::StaticWidthOverflow(_) => "SCHEMA_STATIC_WIDTH_OVERFLOW",
            Self::InvalidTypeId(_) => "SCHEMA_INVALID_TYPE_ID",
            Self::ValueCount { .. } => "SCHEMA_VALUE_COUNT",
            Self::TypeMismatch { .. } => "SCHEMA_TYPE_MISMATCH",
            Self::ValueOutOfRange { .. } => "SCHEMA_VALUE_OUT_OF_RANGE",
            Self::Malformed(_) => "SCHEMA_MALFORMED",
        }
    }

    fn class(&self) -> ErrorClass {
        ErrorClass::Validation
    }
}

/// Errors raised by a key/value state backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// An error occurred in the state backend.
    #[error("State backend error: {0}")]
    Backend(String),
    /// A persisted value could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The operation was denied by the state accessor.
    #[error("Permission denied for state key: {0}")]
    PermissionDenied(String),
}

impl ErrorCode for StateError {
    fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "STATE_BACKEND_ERROR",
            Self::Decode(_) => "STATE_DECODE_ERROR",
            Self::PermissionDenied(_) => "STATE_PERMISSION_DENIED",
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::PermissionDenied(_) => ErrorClass::Authorization,
            _ => ErrorClass::State,
        }
    }
}

/// Errors raised by the record store and the shared splice logic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No field layout is registered for the table.
    #[error("Unknown table {0}")]
    UnknownTable(ResourceId),
    /// The table is already registered.
    #[error("Table {0} already exists")]
    TableExists(ResourceId),
    /// The resource is not a table.
    #[error("Resource {0} is not a table")]
    NotATable(ResourceId),
    /// Static data does not match the table's static width.
    #[error("Static data length mismatch: expected {expected}, got {got}")]
    StaticLengthMismatch {
        /// The table's static width.
        expected: usize,
        /// The supplied length.
        got: usize,
    },
    /// A byte range falls outside its region.
    #[error("Range [{start}, {end}) is out of bounds for region of {bound} bytes")]
    IndexOutOfBounds {
        /// Start of the range.
        start: u64,
        /// End of the range (exclusive).
        end: u64,
        /// Length of the region.
        bound: u64,
    },
    /// The length header disagrees with the dynamic data.
    #[error("Length header mismatch: header declares {declared} bytes, data has {actual}")]
    LengthsMismatch {
        /// Total declared by the header.
        declared: u64,
        /// Actual dynamic length.
        actual: u64,
    },
    /// The key tuple has the wrong number of atoms.
    #[error("Invalid key tuple: expected {expected} atoms, got {got}")]
    InvalidKeyTuple {
        /// Number of key fields in the table's key schema.
        expected: usize,
        /// Number of atoms supplied.
        got: usize,
    },
    /// A field index is outside the table's value schema.
    #[error("Field index {index} out of range for {fields} fields")]
    FieldIndexOutOfRange {
        /// The requested field.
        index: usize,
        /// Number of fields of the requested kind.
        fields: usize,
    },
    /// The operation is not available on offchain tables.
    #[error("Operation unsupported on offchain table {0}")]
    OffchainUnsupported(ResourceId),
    /// Schema or encoding failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// Invalid resource id.
    #[error(transparent)]
    ResourceId(#[from] ResourceIdError),
    /// A persisted record could not be decoded.
    #[error("Record decode error: {0}")]
    Decode(String),
    /// The underlying state backend failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTable(_) => "STORE_UNKNOWN_TABLE",
            Self::TableExists(_) => "STORE_TABLE_EXISTS",
            Self::NotATable(_) => "STORE_NOT_A_TABLE",
            Self::StaticLengthMismatch { .. } => "STORE_STATIC_LENGTH_MISMATCH",
            Self::IndexOutOfBounds { .. } => "STORE_INDEX_OUT_OF_BOUNDS",
            Self::LengthsMismatch { .. } => "STORE_LENGTHS_MISMATCH",
            Self::InvalidKeyTuple { .. } => "STORE_INVALID_KEY_TUPLE",
            Self::FieldIndexOutOfRange { .. } => "STORE_FIELD_INDEX_OUT_OF_RANGE",
            Self::OffchainUnsupported(_) => "STORE_OFFCHAIN_UNSUPPORTED",
            Self::Schema(e) => e.code(),
            Self::ResourceId(e) => e.code(),
            Self::Decode(_) => "STORE_DECODE_ERROR",
            Self::State(e) => e.code(),
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::TableExists(_) => ErrorClass::State,
            Self::State(e) => e.class(),
            _ => ErrorClass::Validation,
        }
    }
}

/// Errors raised by the access-controlled resource registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The resource is already registered.
    #[error("Resource {0} is already registered")]
    DuplicateRegistration(ResourceId),
    /// The resource is not registered.
    #[error("Resource {0} is not registered")]
    NotRegistered(ResourceId),
    /// The caller does not own the namespace.
    #[error("Caller {caller} does not own {resource}")]
    NotOwner {
        /// The namespace whose ownership was required.
        resource: ResourceId,
        /// The rejected caller.
        caller: Address,
    },
    /// The caller has no access to the resource.
    #[error("Caller {caller} has no access to {resource}")]
    AccessDenied {
        /// The guarded resource.
        resource: ResourceId,
        /// The rejected caller.
        caller: Address,
    },
    /// The namespace's ownership has been burned.
    #[error("Namespace {0} is burned")]
    NamespaceBurned(ResourceId),
    /// The resource id has the wrong type for the operation.
    #[error("Resource {resource} is not a {expected:?}")]
    InvalidResourceType {
        /// The rejected id.
        resource: ResourceId,
        /// The type the operation requires.
        expected: ResourceType,
    },
    /// The null identity cannot back a system.
    #[error("Invalid executable {0}")]
    InvalidExecutable(Address),
    /// The executable already backs another system.
    #[error("Executable {executable} already backs system {system}")]
    ExecutableInUse {
        /// The executable identity.
        executable: Address,
        /// The system it is registered under.
        system: ResourceId,
    },
    /// No delegation exists between the two identities.
    #[error("No delegation from {delegator} to {delegatee}")]
    DelegationNotFound {
        /// The identity on whose behalf the call was made.
        delegator: Address,
        /// The identity making the call.
        delegatee: Address,
    },
    /// A namespace balance would overflow.
    #[error("Balance overflow in {0}")]
    BalanceOverflow(ResourceId),
    /// A namespace balance is too small for a transfer.
    #[error("Namespace {namespace} holds {balance}, needs {required}")]
    InsufficientBalance {
        /// The debited namespace.
        namespace: ResourceId,
        /// Its current balance.
        balance: u128,
        /// The requested amount.
        required: u128,
    },
    /// The underlying record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateRegistration(_) => "REGISTRY_DUPLICATE_REGISTRATION",
            Self::NotRegistered(_) => "REGISTRY_NOT_REGISTERED",
            Self::NotOwner { .. } => "REGISTRY_NOT_OWNER",
            Self::AccessDenied { .. } => "REGISTRY_ACCESS_DENIED",
            Self::NamespaceBurned(_) => "REGISTRY_NAMESPACE_BURNED",
            Self::InvalidResourceType { .. } => "REGISTRY_INVALID_RESOURCE_TYPE",
            Self::InvalidExecutable(_) => "REGISTRY_INVALID_EXECUTABLE",
            Self::ExecutableInUse { .. } => "REGISTRY_EXECUTABLE_IN_USE",
            Self::DelegationNotFound { .. } => "REGISTRY_DELEGATION_NOT_FOUND",
            Self::BalanceOverflow(_) => "REGISTRY_BALANCE_OVERFLOW",
            Self::InsufficientBalance { .. } => "REGISTRY_INSUFFICIENT_BALANCE",
            Self::Store(e) => e.code(),
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::NotOwner { .. } | Self::AccessDenied { .. } | Self::DelegationNotFound { .. } => {
                ErrorClass::Authorization
            }
            Self::DuplicateRegistration(_)
            | Self::NotRegistered(_)
            | Self::NamespaceBurned(_)
            | Self::ExecutableInUse { .. }
            | Self::BalanceOverflow(_)
            | Self::InsufficientBalance { .. } => ErrorClass::State,
            Self::InvalidResourceType { .. } | Self::InvalidExecutable(_) => ErrorClass::Validation,
            Self::Store(e) => e.class(),
        }
    }
}

/// Errors returned by the call router and by invoked systems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    /// A registry check or mutation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A record store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A root-namespace system was reached through an entry point that may not use root mode,
    /// or a standard-mode system requested unscoped storage.
    #[error("Root mode is not available for {0} on this path")]
    RootModeMisuse(ResourceId),
    /// The system's executable is not deployed in the execution environment.
    /// Classed as a state error: the registration is valid but the
    /// environment does not hold the code it points at.
    #[error("Executable {executable} for system {system} is not deployed")]
    ExecutableMissing {
        /// The system being called.
        system: ResourceId,
        /// The executable it resolved to.
        executable: Address,
    },
    /// The nested call chain is deeper than the configured maximum.
    #[error("Call depth {0} exceeds the configured maximum")]
    CallDepthExceeded(usize),
    /// A batch holds more calls than the configured maximum.
    #[error("Batch of {got} calls exceeds the maximum of {max}")]
    BatchTooLarge {
        /// The configured maximum.
        max: usize,
        /// The number of calls supplied.
        got: usize,
    },
    /// The call input could not be decoded by the target.
    #[error("Invalid call input: {0}")]
    InvalidInput(String),
    /// The target reverted with a reason.
    #[error("Execution reverted: {0}")]
    Revert(String),
    /// Committed events could not be appended to the event log.
    #[error(transparent)]
    Log(#[from] LogError),
}

impl ErrorCode for CallError {
    fn code(&self) -> &'static str {
        match self {
            Self::Registry(e) => e.code(),
            Self::Store(e) => e.code(),
            Self::RootModeMisuse(_) => "CALL_ROOT_MODE_MISUSE",
            Self::ExecutableMissing { .. } => "CALL_EXECUTABLE_MISSING",
            Self::CallDepthExceeded(_) => "CALL_DEPTH_EXCEEDED",
            Self::BatchTooLarge { .. } => "CALL_BATCH_TOO_LARGE",
            Self::InvalidInput(_) => "CALL_INVALID_INPUT",
            Self::Revert(_) => "CALL_REVERTED",
            Self::Log(e) => e.code(),
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::Registry(e) => e.class(),
            Self::Store(e) => e.class(),
            Self::RootModeMisuse(_) => ErrorClass::Authorization,
            Self::ExecutableMissing { .. } => ErrorClass::State,
            Self::BatchTooLarge { .. } | Self::InvalidInput(_) => ErrorClass::Validation,
            Self::CallDepthExceeded(_) | Self::Revert(_) => ErrorClass::Execution,
            Self::Log(e) => e.class(),
        }
    }
}

impl From<StateError> for CallError {
    fn from(e: StateError) -> Self {
        CallError::Store(StoreError::State(e))
    }
}

impl From<SchemaError> for CallError {
    fn from(e: SchemaError) -> Self {
        CallError::Store(StoreError::Schema(e))
    }
}

impl From<ResourceIdError> for CallError {
    fn from(e: ResourceIdError) -> Self {
        CallError::Store(StoreError::ResourceId(e))
    }
}

impl From<StateError> for RegistryError {
    fn from(e: StateError) -> Self {
        RegistryError::Store(StoreError::State(e))
    }
}

/// Errors raised by an event log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// Appending to the log failed.
    #[error("Event log append failed: {0}")]
    Append(String),
    /// A logged event could not be decoded.
    #[error("Event {id} could not be decoded: {reason}")]
    Decode {
        /// Position of the event.
        id: u64,
        /// The decoder's message.
        reason: String,
    },
}

impl ErrorCode for LogError {
    fn code(&self) -> &'static str {
        match self {
            Self::Append(_) => "LOG_APPEND_FAILED",
            Self::Decode { .. } => "LOG_DECODE_FAILED",
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::Append(_) => ErrorClass::State,
            Self::Decode { .. } => ErrorClass::Validation,
        }
    }
}

/// Errors raised while replaying events into a replica.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicaError {
    /// An event targets a table whose layout the replica has not seen.
    #[error("Replica has no layout for table {0}")]
    UnknownTable(ResourceId),
    /// Applying an event violated the record encoding rules.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Reading from the event log failed.
    #[error(transparent)]
    Log(#[from] LogError),
    /// A snapshot could not be decoded.
    #[error("Snapshot decode error: {0}")]
    Snapshot(String),
}

impl ErrorCode for ReplicaError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownTable(_) => "REPLICA_UNKNOWN_TABLE",
            Self::Store(e) => e.code(),
            Self::Log(e) => e.code(),
            Self::Snapshot(_) => "REPLICA_SNAPSHOT_DECODE",
        }
    }

    fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownTable(_) | Self::Snapshot(_) => ErrorClass::Validation,
            Self::Store(e) => e.class(),
            Self::Log(e) => e.class(),
        }
    }
}
