// Path: crates/types/src/lengths.rs

//! The packed dynamic-field length header.
//!
//! The header is one 32-byte word read as a big-endian 256-bit integer. Bits
//! `[0, 56)` hold the total dynamic length and bits `[56 + 40*i, 96 + 40*i)`
//! hold the byte length of dynamic field `i`. In byte terms the total occupies
//! the last 7 bytes and field `i` the 5 bytes ending `7 + 5*i` bytes before
//! the end of the word.

use crate::error::StoreError;
use crate::resource::Word;
use crate::schema::MAX_DYNAMIC_FIELDS;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width in bytes of the total-length slot.
pub const TOTAL_LENGTH_BYTES: usize = 7;
/// Width in bytes of each per-field slot.
pub const FIELD_LENGTH_BYTES: usize = 5;
/// Largest length a per-field slot can hold.
pub const MAX_FIELD_LENGTH: u64 = (1 << 40) - 1;
/// Largest length the total slot can hold.
pub const MAX_TOTAL_LENGTH: u64 = (1 << 56) - 1;

/// The packed dynamic length header of a record.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
pub struct EncodedLengths(Word);

impl EncodedLengths {
    /// The header of a record without dynamic data.
    pub const fn empty() -> Self {
        EncodedLengths([0u8; 32])
    }

    /// Packs per-field lengths, computing the total.
    pub fn from_lengths(lengths: &[u64]) -> Result<Self, StoreError> {
        if lengths.len() > MAX_DYNAMIC_FIELDS {
            return Err(StoreError::FieldIndexOutOfRange {
                index: lengths.len(),
                fields: MAX_DYNAMIC_FIELDS,
            });
        }
        let mut header = Self::empty();
        let mut total: u64 = 0;
        for (index, length) in lengths.iter().enumerate() {
            if *length > MAX_FIELD_LENGTH {
                return Err(StoreError::LengthsMismatch {
                    declared: *length,
                    actual: MAX_FIELD_LENGTH,
                });
            }
            header.write_slot(field_slot(index), FIELD_LENGTH_BYTES, *length);
            total = total.saturating_add(*length);
        }
        if total > MAX_TOTAL_LENGTH {
            return Err(StoreError::LengthsMismatch {
                declared: total,
                actual: MAX_TOTAL_LENGTH,
            });
        }
        header.write_slot(32 - TOTAL_LENGTH_BYTES, TOTAL_LENGTH_BYTES, total);
        Ok(header)
    }

    /// Unpacks a header word, checking that the field lengths add up to the total.
    pub fn from_word(word: Word) -> Result<Self, StoreError> {
        let header = EncodedLengths(word);
        let sum: u64 = (0..MAX_DYNAMIC_FIELDS).map(|i| header.at(i)).sum();
        if sum != header.total() {
            return Err(StoreError::LengthsMismatch {
                declared: header.total(),
                actual: sum,
            });
        }
        Ok(header)
    }

    /// The raw header word.
    pub fn as_word(&self) -> &Word {
        &self.0
    }

    /// The total dynamic length declared by the header.
    pub fn total(&self) -> u64 {
        self.read_slot(32 - TOTAL_LENGTH_BYTES, TOTAL_LENGTH_BYTES)
    }

    /// The length of dynamic field `index`, zero for indices past the last slot.
    pub fn at(&self, index: usize) -> u64 {
        if index >= MAX_DYNAMIC_FIELDS {
            return 0;
        }
        self.read_slot(field_slot(index), FIELD_LENGTH_BYTES)
    }

    /// The lengths of the first `count` dynamic fields.
    pub fn lengths(&self, count: usize) -> Vec<u64> {
        (0..count).map(|i| self.at(i)).collect()
    }

    /// Returns a copy with field `index` set to `length` and the total adjusted.
    pub fn with_length(&self, index: usize, length: u64) -> Result<Self, StoreError> {
        if index >= MAX_DYNAMIC_FIELDS {
            return Err(StoreError::FieldIndexOutOfRange {
                index,
                fields: MAX_DYNAMIC_FIELDS,
            });
        }
        let mut lengths = self.lengths(MAX_DYNAMIC_FIELDS);
        if let Some(slot) = lengths.get_mut(index) {
            *slot = length;
        }
        Self::from_lengths(&lengths)
    }

    /// Checks that no slot beyond `dynamic_fields` carries a length.
    pub fn validate_for(&self, dynamic_fields: usize) -> Result<(), StoreError> {
        for index in dynamic_fields..MAX_DYNAMIC_FIELDS {
            let length = self.at(index);
            if length != 0 {
                return Err(StoreError::FieldIndexOutOfRange {
                    index,
                    fields: dynamic_fields,
                });
            }
        }
        Ok(())
    }

    fn read_slot(&self, offset: usize, width: usize) -> u64 {
        self.0[offset..offset + width]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    fn write_slot(&mut self, offset: usize, width: usize, value: u64) {
        let bytes = value.to_be_bytes();
        self.0[offset..offset + width].copy_from_slice(&bytes[8 - width..]);
    }
}

fn field_slot(index: usize) -> usize {
    32 - TOTAL_LENGTH_BYTES - FIELD_LENGTH_BYTES * (index + 1)
}

impl fmt::Debug for EncodedLengths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedLengths")
            .field("total", &self.total())
            .field("fields", &self.lengths(MAX_DYNAMIC_FIELDS))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_layout() {
        let header = EncodedLengths::from_lengths(&[3, 0x0102]).unwrap();
        let word = header.as_word();
        // total = 0x0105 in the last 7 bytes
        assert_eq!(&word[25..32], &[0, 0, 0, 0, 0, 0x01, 0x05]);
        // field 0 in bytes [20, 25)
        assert_eq!(&word[20..25], &[0, 0, 0, 0, 3]);
        // field 1 in bytes [15, 20)
        assert_eq!(&word[15..20], &[0, 0, 0, 0x01, 0x02]);
        assert_eq!(header.total(), 0x0105);
        assert_eq!(header.lengths(3), vec![3, 0x0102, 0]);
    }

    #[test]
    fn test_from_word_rejects_inconsistent_total() {
        let mut word = *EncodedLengths::from_lengths(&[4, 4]).unwrap().as_word();
        word[31] = 9;
        assert!(matches!(
            EncodedLengths::from_word(word),
            Err(StoreError::LengthsMismatch { declared: 9, actual: 8 })
        ));
    }

    #[test]
    fn test_with_length_updates_total() {
        let header = EncodedLengths::from_lengths(&[4, 10]).unwrap();
        let updated = header.with_length(1, 2).unwrap();
        assert_eq!(updated.lengths(2), vec![4, 2]);
        assert_eq!(updated.total(), 6);
        assert!(header.with_length(5, 1).is_err());
    }

    #[test]
    fn test_validate_for_rejects_extra_slots() {
        let header = EncodedLengths::from_lengths(&[1, 2, 3]).unwrap();
        assert!(header.validate_for(3).is_ok());
        assert!(matches!(
            header.validate_for(2),
            Err(StoreError::FieldIndexOutOfRange { index: 2, fields: 2 })
        ));
    }

    #[test]
    fn test_too_many_fields() {
        assert!(EncodedLengths::from_lengths(&[1, 1, 1, 1, 1, 1]).is_err());
    }
}
