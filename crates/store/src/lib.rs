// Path: crates/store/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # Tessera Record Store
//!
//! The keyed byte-record engine. Records are addressed by a table id and a key
//! tuple and mutated only through four primitives (`set_record`,
//! `splice_static`, `splice_dynamic`, `delete_record`), each of which writes
//! the frame's state and buffers exactly one `StoreEvent`.
//!
//! Writes take a `CallFrame`; reads take any `StateAccess`. This crate
//! performs no authorization: permission checks belong to the caller.

/// Field-level helpers built on the primitives.
pub mod fields;
/// The four mutation primitives.
pub mod primitives;
/// Record reads and table scans.
pub mod read;
/// Table definitions and the built-in store tables.
pub mod tables;

pub use fields::{
    get_dynamic_field, get_dynamic_field_length, get_field, get_static_field, get_values,
    pop_from_dynamic_field, push_to_dynamic_field, set_dynamic_field, set_field,
    set_static_field, set_values, splice_dynamic_field,
};
pub use primitives::{delete_record, set_record, splice_dynamic, splice_static};
pub use read::{get_record, scan_table};
pub use tables::{
    get_field_layout, get_table, register_store_tables, register_table, resource_exists,
    set_resource_exists, tables_definition, TableDefinition, RESOURCE_IDS_TABLE, STORE_NAMESPACE, TABLES_TABLE,
};
