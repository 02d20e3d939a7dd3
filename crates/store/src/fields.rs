// Path: crates/store/src/fields.rs

//! Field-level helpers.
//!
//! Every write here is expressed through one primitive, so the event stream
//! only ever carries the four primitive events.

use crate::primitives::{set_record, splice_dynamic, splice_static};
use crate::read::get_record;
use crate::tables::{get_table, resolve};
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_types::error::StoreError;
use tessera_types::schema::{DynamicValue, StaticValue};
use tessera_types::{FieldLayout, Record, ResourceId, Word};

fn current_record(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
    layout: &FieldLayout,
) -> Result<Record, StoreError> {
    Ok(get_record(state, table, key_tuple)?.unwrap_or_else(|| Record::empty(layout)))
}

fn out_of_bounds(start: u64, end: u64, bound: u64) -> StoreError {
    StoreError::IndexOutOfBounds { start, end, bound }
}

/// Overwrites static field `index` with `data`, which must be exactly the field's width.
pub fn set_static_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    data: &[u8],
) -> Result<(), StoreError> {
    let layout = resolve(frame.state(), table)?.layout;
    let out_of_range = StoreError::FieldIndexOutOfRange {
        index,
        fields: layout.num_static_fields(),
    };
    let offset = layout.static_field_offset(index).ok_or(out_of_range.clone())?;
    let width = layout.static_field_width(index).ok_or(out_of_range)?;
    if data.len() != width {
        return Err(StoreError::StaticLengthMismatch {
            expected: width,
            got: data.len(),
        });
    }
    splice_static(frame, table, key_tuple, offset as u64, data)
}

/// Replaces dynamic field `index` with `data`.
pub fn set_dynamic_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    data: &[u8],
) -> Result<(), StoreError> {
    let layout = resolve(frame.state(), table)?.layout;
    let record = current_record(frame.state(), table, key_tuple, &layout)?;
    let offset = record.dynamic_field_offset(&layout, index)?;
    let old_len = record.encoded_lengths.at(index);
    let lengths = record.encoded_lengths.with_length(index, data.len() as u64)?;
    splice_dynamic(frame, table, key_tuple, offset, old_len, lengths, data)
}

/// Writes field `index` of the value schema, static fields first.
pub fn set_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    data: &[u8],
) -> Result<(), StoreError> {
    let layout = resolve(frame.state(), table)?.layout;
    let num_static = layout.num_static_fields();
    if index < num_static {
        set_static_field(frame, table, key_tuple, index, data)
    } else if index < layout.num_fields() {
        set_dynamic_field(frame, table, key_tuple, index - num_static, data)
    } else {
        Err(StoreError::FieldIndexOutOfRange {
            index,
            fields: layout.num_fields(),
        })
    }
}

/// Deletes `delete_count` bytes at `start` within dynamic field `index` and
/// inserts `data` there.
pub fn splice_dynamic_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    start: u64,
    delete_count: u64,
    data: &[u8],
) -> Result<(), StoreError> {
    let layout = resolve(frame.state(), table)?.layout;
    let record = current_record(frame.state(), table, key_tuple, &layout)?;
    let offset = record.dynamic_field_offset(&layout, index)?;
    let field_len = record.encoded_lengths.at(index);
    let end = start
        .checked_add(delete_count)
        .ok_or_else(|| out_of_bounds(start, u64::MAX, field_len))?;
    if end > field_len {
        return Err(out_of_bounds(start, end, field_len));
    }
    let new_len = field_len - delete_count + data.len() as u64;
    let lengths = record.encoded_lengths.with_length(index, new_len)?;
    splice_dynamic(frame, table, key_tuple, offset + start, delete_count, lengths, data)
}

/// Appends `data` to dynamic field `index`.
pub fn push_to_dynamic_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    data: &[u8],
) -> Result<(), StoreError> {
    let field_len = get_dynamic_field_length(frame.state(), table, key_tuple, index)?;
    splice_dynamic_field(frame, table, key_tuple, index, field_len, 0, data)
}

/// Removes the last `count` bytes of dynamic field `index`.
pub fn pop_from_dynamic_field(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
    count: u64,
) -> Result<(), StoreError> {
    let field_len = get_dynamic_field_length(frame.state(), table, key_tuple, index)?;
    let start = field_len
        .checked_sub(count)
        .ok_or_else(|| out_of_bounds(0, count, field_len))?;
    splice_dynamic_field(frame, table, key_tuple, index, start, count, &[])
}

/// Reads static field `index`. Missing records read as zeroes.
pub fn get_static_field(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
) -> Result<Vec<u8>, StoreError> {
    let layout = resolve(state, table)?.layout;
    let record = current_record(state, table, key_tuple, &layout)?;
    record.static_field(&layout, index).map(<[u8]>::to_vec)
}

/// Reads dynamic field `index`. Missing records read as empty.
pub fn get_dynamic_field(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
) -> Result<Vec<u8>, StoreError> {
    let layout = resolve(state, table)?.layout;
    let record = current_record(state, table, key_tuple, &layout)?;
    record.dynamic_field(&layout, index).map(<[u8]>::to_vec)
}

/// The byte length of dynamic field `index`.
pub fn get_dynamic_field_length(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
) -> Result<u64, StoreError> {
    let layout = resolve(state, table)?.layout;
    let record = current_record(state, table, key_tuple, &layout)?;
    record.dynamic_field_offset(&layout, index)?;
    Ok(record.encoded_lengths.at(index))
}

/// Reads field `index` of the value schema, static fields first.
pub fn get_field(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
    index: usize,
) -> Result<Vec<u8>, StoreError> {
    let layout = resolve(state, table)?.layout;
    let num_static = layout.num_static_fields();
    if index < num_static {
        get_static_field(state, table, key_tuple, index)
    } else if index < layout.num_fields() {
        get_dynamic_field(state, table, key_tuple, index - num_static)
    } else {
        Err(StoreError::FieldIndexOutOfRange {
            index,
            fields: layout.num_fields(),
        })
    }
}

/// Encodes typed values with the table's value schema and sets the record.
pub fn set_values(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    static_values: &[StaticValue],
    dynamic_values: &[DynamicValue],
) -> Result<(), StoreError> {
    let definition = get_table(frame.state(), table)?.ok_or(StoreError::UnknownTable(*table))?;
    let record = definition
        .value_schema
        .encode_record(static_values, dynamic_values)?;
    set_record(
        frame,
        table,
        key_tuple,
        &record.static_data,
        record.encoded_lengths,
        &record.dynamic_data,
    )
}

/// Reads a record and decodes it with the table's value schema.
pub fn get_values(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
) -> Result<Option<(Vec<StaticValue>, Vec<DynamicValue>)>, StoreError> {
    let definition = get_table(state, table)?.ok_or(StoreError::UnknownTable(*table))?;
    match get_record(state, table, key_tuple)? {
        Some(record) => Ok(Some(definition.value_schema.decode_record(&record)?)),
        None => Ok(None),
    }
}
