// Path: crates/store/src/primitives.rs

//! The four record mutation primitives.
//!
//! Each primitive validates everything before touching state, so a failed
//! call mutates nothing and emits nothing. On success it writes the frame's
//! overlay (unless the table is offchain) and buffers exactly one event whose
//! replay through `Record::splice_*` yields the stored bytes.

use crate::tables::resolve;
use tessera_api::frame::CallFrame;
use tessera_api::state::StateAccess;
use tessera_types::codec::{from_bytes_canonical, to_bytes_canonical};
use tessera_types::error::StoreError;
use tessera_types::keys::record_state_key;
use tessera_types::{EncodedLengths, Record, ResourceId, StoreEvent, Word};

pub(crate) fn load(
    state: &dyn StateAccess,
    table: &ResourceId,
    key_tuple: &[Word],
) -> Result<Option<Record>, StoreError> {
    state
        .get(&record_state_key(table, key_tuple))?
        .map(|bytes| from_bytes_canonical::<Record>(&bytes).map_err(StoreError::Decode))
        .transpose()
}

fn persist(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    record: &Record,
) -> Result<(), StoreError> {
    frame
        .state_mut()
        .insert(&record_state_key(table, key_tuple), &to_bytes_canonical(record))?;
    Ok(())
}

/// Replaces a whole record.
///
/// Fails with `StaticLengthMismatch` if the static data is not the table's
/// static width, and with `LengthsMismatch` if the header disagrees with the
/// dynamic data or declares fields the table does not have.
pub fn set_record(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    static_data: &[u8],
    encoded_lengths: EncodedLengths,
    dynamic_data: &[u8],
) -> Result<(), StoreError> {
    let resolved = resolve(frame.state(), table)?;
    resolved.check_key(key_tuple)?;
    let record = Record {
        static_data: static_data.to_vec(),
        encoded_lengths,
        dynamic_data: dynamic_data.to_vec(),
    };
    record.validate(&resolved.layout)?;
    if !resolved.offchain {
        persist(frame, table, key_tuple, &record)?;
    }
    tracing::trace!(
        target: "store",
        table = %table,
        static_len = record.static_data.len(),
        dynamic_len = record.dynamic_data.len(),
        offchain = resolved.offchain,
        "set record"
    );
    frame.emit(StoreEvent::SetRecord {
        table: *table,
        key_tuple: key_tuple.to_vec(),
        static_data: record.static_data,
        encoded_lengths: record.encoded_lengths,
        dynamic_data: record.dynamic_data,
    });
    Ok(())
}

/// Overwrites `[start, start + data.len())` of the static region.
///
/// A missing record starts from zeroed static data. The static length never
/// changes; ranges past the static width fail with `IndexOutOfBounds`.
pub fn splice_static(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    start: u64,
    data: &[u8],
) -> Result<(), StoreError> {
    let resolved = resolve(frame.state(), table)?;
    resolved.check_key(key_tuple)?;
    if resolved.offchain {
        // Nothing is stored, but the range must still fit the layout.
        Record::empty(&resolved.layout).splice_static(start, data)?;
    } else {
        let mut record =
            load(frame.state(), table, key_tuple)?.unwrap_or_else(|| Record::empty(&resolved.layout));
        record.splice_static(start, data)?;
        persist(frame, table, key_tuple, &record)?;
    }
    tracing::trace!(target: "store", table = %table, start, len = data.len(), "splice static");
    frame.emit(StoreEvent::SpliceStaticData {
        table: *table,
        key_tuple: key_tuple.to_vec(),
        start,
        data: data.to_vec(),
    });
    Ok(())
}

/// Deletes `delete_count` bytes at `start` of the dynamic region, inserts
/// `data` there and installs `encoded_lengths`.
///
/// Requires `start + delete_count <= len(dynamic)` and a header whose total is
/// `old - delete_count + data.len()`. Refused on offchain tables.
pub fn splice_dynamic(
    frame: &mut CallFrame<'_>,
    table: &ResourceId,
    key_tuple: &[Word],
    start: u64,
    delete_count: u64,
    encoded_lengths: EncodedLengths,
    data: &[u8],
) -> Result<(), StoreError> {
    let resolved = resolve(frame.state(), table)?;
    resolved.check_key(key_tuple)?;
    if resolved.offchain {
        return Err(StoreError::OffchainUnsupported(*table));
    }
    let mut record =
        load(frame.state(), table, key_tuple)?.unwrap_or_else(|| Record::empty(&resolved.layout));
    record.splice_dynamic(&resolved.layout, start, delete_count, encoded_lengths, data)?;
    persist(frame, table, key_tuple, &record)?;
    tracing::trace!(
        target: "store",
        table = %table,
        start,
        delete_count,
        inserted = data.len(),
        "splice dynamic"
    );
    frame.emit(StoreEvent::SpliceDynamicData {
        table: *table,
        key_tuple: key_tuple.to_vec(),
        start,
        delete_count,
        encoded_lengths,
        data: data.to_vec(),
    });
    Ok(())
}

/// Removes a record. Emits `DeleteRecord` even if the record does not exist.
pub fn delete_record(frame: &mut CallFrame<'_>, table: &ResourceId, key_tuple: &[Word]) -> Result<(), StoreError> {
    let resolved = resolve(frame.state(), table)?;
    resolved.check_key(key_tuple)?;
    if !resolved.offchain {
        frame.state_mut().delete(&record_state_key(table, key_tuple))?;
    }
    tracing::trace!(target: "store", table = %table, "delete record");
    frame.emit(StoreEvent::DeleteRecord {
        table: *table,
        key_tuple: key_tuple.to_vec(),
    });
    Ok(())
}
