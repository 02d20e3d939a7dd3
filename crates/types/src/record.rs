// Path: crates/types/src/record.rs

//! The stored record value and its splice rules.
//!
//! These functions are the single implementation of the byte-level mutation
//! rules. The record store calls them when mutating state and the replicator
//! calls them when replaying events, so both sides produce identical bytes.

use crate::error::StoreError;
use crate::lengths::EncodedLengths;
use crate::resource::{ResourceId, Word};
use crate::schema::FieldLayout;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// The full value of one record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct Record {
    /// Concatenated fixed-width fields. Its length equals the layout's static width.
    pub static_data: Vec<u8>,
    /// Packed lengths of the dynamic fields.
    pub encoded_lengths: EncodedLengths,
    /// Concatenated dynamic fields, split by `encoded_lengths`.
    pub dynamic_data: Vec<u8>,
}

/// Identifies one record: a table plus its key tuple.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct RecordKey {
    /// The table the record belongs to.
    pub table: ResourceId,
    /// The key atoms.
    pub key_tuple: Vec<Word>,
}

impl RecordKey {
    /// Builds a record key.
    pub fn new(table: ResourceId, key_tuple: Vec<Word>) -> Self {
        Self { table, key_tuple }
    }
}

fn out_of_bounds(start: u64, end: u64, bound: usize) -> StoreError {
    StoreError::IndexOutOfBounds {
        start,
        end,
        bound: bound as u64,
    }
}

impl Record {
    /// The record a splice starts from when none exists: zeroed static data,
    /// no dynamic data.
    pub fn empty(layout: &FieldLayout) -> Self {
        Record {
            static_data: vec![0u8; layout.static_width()],
            encoded_lengths: EncodedLengths::empty(),
            dynamic_data: Vec::new(),
        }
    }

    /// Checks a full record against a layout.
    pub fn validate(&self, layout: &FieldLayout) -> Result<(), StoreError> {
        if self.static_data.len() != layout.static_width() {
            return Err(StoreError::StaticLengthMismatch {
                expected: layout.static_width(),
                got: self.static_data.len(),
            });
        }
        validate_lengths(&self.encoded_lengths, self.dynamic_data.len() as u64, layout)
    }

    /// Overwrites `[start, start + data.len())` of the static region in place.
    ///
    /// The static length never changes. Nothing is modified on failure.
    pub fn splice_static(&mut self, start: u64, data: &[u8]) -> Result<(), StoreError> {
        let end = start
            .checked_add(data.len() as u64)
            .ok_or_else(|| out_of_bounds(start, u64::MAX, self.static_data.len()))?;
        if end > self.static_data.len() as u64 {
            return Err(out_of_bounds(start, end, self.static_data.len()));
        }
        let range = start as usize..end as usize;
        if let Some(region) = self.static_data.get_mut(range) {
            region.copy_from_slice(data);
        }
        Ok(())
    }

    /// Removes `delete_count` bytes at `start` of the dynamic region, inserts
    /// `data` there and installs `encoded_lengths`.
    ///
    /// The new header's total must equal the resulting dynamic length. Nothing
    /// is modified on failure.
    pub fn splice_dynamic(
        &mut self,
        layout: &FieldLayout,
        start: u64,
        delete_count: u64,
        encoded_lengths: EncodedLengths,
        data: &[u8],
    ) -> Result<(), StoreError> {
        let old_len = self.dynamic_data.len() as u64;
        let end = start
            .checked_add(delete_count)
            .ok_or_else(|| out_of_bounds(start, u64::MAX, self.dynamic_data.len()))?;
        if end > old_len {
            return Err(out_of_bounds(start, end, self.dynamic_data.len()));
        }
        let new_len = old_len - delete_count + data.len() as u64;
        validate_lengths(&encoded_lengths, new_len, layout)?;
        self.dynamic_data
            .splice(start as usize..end as usize, data.iter().copied());
        self.encoded_lengths = encoded_lengths;
        Ok(())
    }

    /// The bytes of static field `index`.
    pub fn static_field(&self, layout: &FieldLayout, index: usize) -> Result<&[u8], StoreError> {
        let (offset, width) = layout
            .static_field_offset(index)
            .zip(layout.static_field_width(index))
            .ok_or(StoreError::FieldIndexOutOfRange {
                index,
                fields: layout.num_static_fields(),
            })?;
        self.static_data
            .get(offset..offset + width)
            .ok_or_else(|| out_of_bounds(offset as u64, (offset + width) as u64, self.static_data.len()))
    }

    /// Byte offset of dynamic field `index` within the dynamic region.
    pub fn dynamic_field_offset(&self, layout: &FieldLayout, index: usize) -> Result<u64, StoreError> {
        if index >= layout.num_dynamic_fields() {
            return Err(StoreError::FieldIndexOutOfRange {
                index,
                fields: layout.num_dynamic_fields(),
            });
        }
        Ok((0..index).map(|i| self.encoded_lengths.at(i)).sum())
    }

    /// The bytes of dynamic field `index`.
    pub fn dynamic_field(&self, layout: &FieldLayout, index: usize) -> Result<&[u8], StoreError> {
        let start = self.dynamic_field_offset(layout, index)?;
        let end = start + self.encoded_lengths.at(index);
        self.dynamic_data
            .get(start as usize..end as usize)
            .ok_or_else(|| out_of_bounds(start, end, self.dynamic_data.len()))
    }
}

fn validate_lengths(lengths: &EncodedLengths, actual: u64, layout: &FieldLayout) -> Result<(), StoreError> {
    // Headers off the wire are not validated at decode time.
    EncodedLengths::from_word(*lengths.as_word())?;
    if lengths.total() != actual {
        return Err(StoreError::LengthsMismatch {
            declared: lengths.total(),
            actual,
        });
    }
    lengths
        .validate_for(layout.num_dynamic_fields())
        .map_err(|_| StoreError::LengthsMismatch {
            declared: lengths.total(),
            actual,
        })
}
