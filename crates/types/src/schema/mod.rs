// Path: crates/types/src/schema/mod.rs

//! Typed table schemas.
//!
//! A `Schema` is the typed field list of a table's key or value. The
//! `FieldLayout` used by the store is derived from it and never stored per
//! record.

mod layout;
mod value;

pub use layout::{FieldLayout, MAX_DYNAMIC_FIELDS, MAX_STATIC_FIELD_WIDTH, MAX_TOTAL_FIELDS};
pub use value::{
    decode_dynamic, decode_key_atom, decode_static, encode_dynamic, encode_key_atom, encode_static,
    DynamicValue, StaticValue,
};

use crate::error::SchemaError;
use crate::record::Record;
use crate::resource::Word;
use serde::{Deserialize, Serialize};
use std::fmt;

const TYPE_ID_INT_BASE: u8 = 32;
const TYPE_ID_FIXED_BYTES_BASE: u8 = 64;
const TYPE_ID_BOOL: u8 = 96;
const TYPE_ID_ADDRESS: u8 = 97;
const TYPE_ID_ARRAY_BASE: u8 = 98;
const TYPE_ID_BYTES: u8 = 196;
const TYPE_ID_STRING: u8 = 197;

/// A fixed-width field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticType {
    /// Unsigned big-endian integer of the given byte width.
    Uint(u8),
    /// Two's complement big-endian integer of the given byte width.
    Int(u8),
    /// Raw bytes of the given width.
    FixedBytes(u8),
    /// A single byte, 0 or 1.
    Bool,
    /// A 20-byte identity.
    Address,
}

impl StaticType {
    /// The encoded width in bytes.
    pub fn width(&self) -> usize {
        match self {
            StaticType::Uint(w) | StaticType::Int(w) | StaticType::FixedBytes(w) => usize::from(*w),
            StaticType::Bool => 1,
            StaticType::Address => 20,
        }
    }

    /// The packed type id.
    pub fn type_id(&self) -> u8 {
        match self {
            StaticType::Uint(w) => w.wrapping_sub(1),
            StaticType::Int(w) => TYPE_ID_INT_BASE + w.wrapping_sub(1),
            StaticType::FixedBytes(w) => TYPE_ID_FIXED_BYTES_BASE + w.wrapping_sub(1),
            StaticType::Bool => TYPE_ID_BOOL,
            StaticType::Address => TYPE_ID_ADDRESS,
        }
    }

    /// Resolves a packed type id.
    pub fn from_type_id(id: u8) -> Result<Self, SchemaError> {
        match id {
            0..=31 => Ok(StaticType::Uint(id + 1)),
            32..=63 => Ok(StaticType::Int(id - TYPE_ID_INT_BASE + 1)),
            64..=95 => Ok(StaticType::FixedBytes(id - TYPE_ID_FIXED_BYTES_BASE + 1)),
            TYPE_ID_BOOL => Ok(StaticType::Bool),
            TYPE_ID_ADDRESS => Ok(StaticType::Address),
            _ => Err(SchemaError::InvalidTypeId(id)),
        }
    }

    fn validate(&self, index: usize) -> Result<(), SchemaError> {
        let width = self.width();
        if width == 0 || width > MAX_STATIC_FIELD_WIDTH {
            return Err(SchemaError::InvalidStaticWidth { index, width });
        }
        Ok(())
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Uint(w) => write!(f, "uint{}", u32::from(*w) * 8),
            StaticType::Int(w) => write!(f, "int{}", u32::from(*w) * 8),
            StaticType::FixedBytes(w) => write!(f, "bytes{}", w),
            StaticType::Bool => f.write_str("bool"),
            StaticType::Address => f.write_str("address"),
        }
    }
}

/// A variable-length field type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicType {
    /// Raw bytes.
    Bytes,
    /// UTF-8 text.
    String,
    /// Packed array of a static element type.
    Array(StaticType),
}

impl DynamicType {
    /// The packed type id.
    pub fn type_id(&self) -> u8 {
        match self {
            DynamicType::Bytes => TYPE_ID_BYTES,
            DynamicType::String => TYPE_ID_STRING,
            DynamicType::Array(elem) => TYPE_ID_ARRAY_BASE + elem.type_id(),
        }
    }

    /// Resolves a packed type id.
    pub fn from_type_id(id: u8) -> Result<Self, SchemaError> {
        match id {
            TYPE_ID_BYTES => Ok(DynamicType::Bytes),
            TYPE_ID_STRING => Ok(DynamicType::String),
            TYPE_ID_ARRAY_BASE..=195 => {
                Ok(DynamicType::Array(StaticType::from_type_id(id - TYPE_ID_ARRAY_BASE)?))
            }
            _ => Err(SchemaError::InvalidTypeId(id)),
        }
    }
}

impl fmt::Display for DynamicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicType::Bytes => f.write_str("bytes"),
            DynamicType::String => f.write_str("string"),
            DynamicType::Array(elem) => write!(f, "{}[]", elem),
        }
    }
}

/// The typed field list of a table key or value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Schema {
    static_fields: Vec<StaticType>,
    dynamic_fields: Vec<DynamicType>,
}

impl Schema {
    /// Builds a schema, validating field counts and widths.
    pub fn new(static_fields: Vec<StaticType>, dynamic_fields: Vec<DynamicType>) -> Result<Self, SchemaError> {
        for (index, ty) in static_fields.iter().enumerate() {
            ty.validate(index)?;
        }
        for ty in &dynamic_fields {
            if let DynamicType::Array(elem) = ty {
                elem.validate(0)?;
            }
        }
        let schema = Schema {
            static_fields,
            dynamic_fields,
        };
        // Counts and total width are checked by the derived layout.
        schema.field_layout()?;
        Ok(schema)
    }

    /// A schema with static fields only, as used for key schemas.
    pub fn static_only(static_fields: Vec<StaticType>) -> Result<Self, SchemaError> {
        Self::new(static_fields, Vec::new())
    }

    /// The static field types in declared order.
    pub fn static_fields(&self) -> &[StaticType] {
        &self.static_fields
    }

    /// The dynamic field types in declared order.
    pub fn dynamic_fields(&self) -> &[DynamicType] {
        &self.dynamic_fields
    }

    /// Total number of fields.
    pub fn num_fields(&self) -> usize {
        self.static_fields.len() + self.dynamic_fields.len()
    }

    /// Derives the field layout.
    pub fn field_layout(&self) -> Result<FieldLayout, SchemaError> {
        let widths: Vec<usize> = self.static_fields.iter().map(StaticType::width).collect();
        FieldLayout::new(&widths, self.dynamic_fields.len())
    }

    /// Packs the schema into a word:
    /// `[0..2]` static width, `[2]` static count, `[3]` dynamic count,
    /// `[4..]` one type id per field.
    pub fn encode(&self) -> Result<Word, SchemaError> {
        let layout = self.field_layout()?;
        let mut word = layout.encode();
        let ids = self
            .static_fields
            .iter()
            .map(StaticType::type_id)
            .chain(self.dynamic_fields.iter().map(DynamicType::type_id));
        for (slot, id) in word[4..].iter_mut().zip(ids) {
            *slot = id;
        }
        for slot in word[4 + self.num_fields()..].iter_mut() {
            *slot = 0;
        }
        Ok(word)
    }

    /// Unpacks a schema word.
    pub fn decode(word: &Word) -> Result<Self, SchemaError> {
        let declared = usize::from(u16::from_be_bytes([word[0], word[1]]));
        let num_static = usize::from(word[2]);
        let num_dynamic = usize::from(word[3]);
        if num_static + num_dynamic > MAX_TOTAL_FIELDS {
            return Err(SchemaError::TooManyFields(num_static + num_dynamic));
        }
        let ids = &word[4..4 + num_static + num_dynamic];
        let static_fields = ids[..num_static]
            .iter()
            .map(|id| StaticType::from_type_id(*id))
            .collect::<Result<Vec<_>, _>>()?;
        let dynamic_fields = ids[num_static..]
            .iter()
            .map(|id| DynamicType::from_type_id(*id))
            .collect::<Result<Vec<_>, _>>()?;
        let schema = Self::new(static_fields, dynamic_fields)?;
        let width = schema.field_layout()?.static_width();
        if width != declared {
            return Err(SchemaError::Malformed(format!(
                "schema declares static width {} but fields sum to {}",
                declared, width
            )));
        }
        Ok(schema)
    }

    /// Encodes typed values into a record.
    pub fn encode_record(
        &self,
        static_values: &[StaticValue],
        dynamic_values: &[DynamicValue],
    ) -> Result<Record, SchemaError> {
        let static_data = encode_static(&self.static_fields, static_values)?;
        let (encoded_lengths, dynamic_data) = encode_dynamic(&self.dynamic_fields, dynamic_values)?;
        Ok(Record {
            static_data,
            encoded_lengths,
            dynamic_data,
        })
    }

    /// Decodes a record into typed values.
    pub fn decode_record(&self, record: &Record) -> Result<(Vec<StaticValue>, Vec<DynamicValue>), SchemaError> {
        let static_values = decode_static(&self.static_fields, &record.static_data)?;
        let dynamic_values = decode_dynamic(&self.dynamic_fields, &record.encoded_lengths, &record.dynamic_data)?;
        Ok((static_values, dynamic_values))
    }

    /// Encodes a key tuple from typed values. Key schemas hold static fields only.
    pub fn encode_key(&self, values: &[StaticValue]) -> Result<Vec<Word>, SchemaError> {
        if values.len() != self.static_fields.len() {
            return Err(SchemaError::ValueCount {
                expected: self.static_fields.len(),
                got: values.len(),
            });
        }
        self.static_fields
            .iter()
            .zip(values)
            .enumerate()
            .map(|(index, (ty, value))| encode_key_atom(ty, value, index))
            .collect()
    }

    /// Decodes a key tuple into typed values.
    pub fn decode_key(&self, key_tuple: &[Word]) -> Result<Vec<StaticValue>, SchemaError> {
        if key_tuple.len() != self.static_fields.len() {
            return Err(SchemaError::ValueCount {
                expected: self.static_fields.len(),
                got: key_tuple.len(),
            });
        }
        self.static_fields
            .iter()
            .zip(key_tuple)
            .enumerate()
            .map(|(index, (ty, word))| decode_key_atom(ty, word, index))
            .collect()
    }
}
