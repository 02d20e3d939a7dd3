// Path: crates/types/src/schema/value.rs

//! Typed field values and their canonical byte encoding.
//!
//! Static values encode to the unpadded big-endian bytes of their declared
//! width. Dynamic values encode to their raw bytes, with boundaries recorded
//! in an `EncodedLengths` header.

use super::{DynamicType, StaticType};
use crate::error::SchemaError;
use crate::lengths::EncodedLengths;
use crate::resource::{Address, Word};
use serde::{Deserialize, Serialize};

/// A value of a static field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticValue {
    /// Unsigned integer.
    Uint(u128),
    /// Signed integer.
    Int(i128),
    /// Boolean.
    Bool(bool),
    /// Identity.
    Address(Address),
    /// Fixed-width bytes. The length must equal the declared width.
    FixedBytes(Vec<u8>),
}

/// A value of a dynamic field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DynamicValue {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    String(String),
    /// Packed static elements.
    Array(Vec<StaticValue>),
}

fn mismatch(index: usize, ty: impl ToString) -> SchemaError {
    SchemaError::TypeMismatch {
        index,
        expected: ty.to_string(),
    }
}

fn encode_uint(value: u128, width: usize, index: usize, out: &mut Vec<u8>) -> Result<(), SchemaError> {
    if width < 16 && value >> (8 * width) != 0 {
        return Err(SchemaError::ValueOutOfRange { index });
    }
    let bytes = value.to_be_bytes();
    if width > 16 {
        out.extend(std::iter::repeat(0u8).take(width - 16));
        out.extend_from_slice(&bytes);
    } else {
        out.extend_from_slice(&bytes[16 - width..]);
    }
    Ok(())
}

fn encode_int(value: i128, width: usize, index: usize, out: &mut Vec<u8>) -> Result<(), SchemaError> {
    if width < 16 {
        let bound = 1i128 << (8 * width - 1);
        if value < -bound || value >= bound {
            return Err(SchemaError::ValueOutOfRange { index });
        }
    }
    let bytes = value.to_be_bytes();
    if width > 16 {
        let fill = if value < 0 { 0xFF } else { 0x00 };
        out.extend(std::iter::repeat(fill).take(width - 16));
        out.extend_from_slice(&bytes);
    } else {
        out.extend_from_slice(&bytes[16 - width..]);
    }
    Ok(())
}

fn decode_uint(bytes: &[u8], index: usize) -> Result<u128, SchemaError> {
    let split = bytes.len().saturating_sub(16);
    let (high, low) = bytes.split_at(split);
    if high.iter().any(|b| *b != 0) {
        return Err(SchemaError::ValueOutOfRange { index });
    }
    let mut buf = [0u8; 16];
    buf[16 - low.len()..].copy_from_slice(low);
    Ok(u128::from_be_bytes(buf))
}

fn decode_int(bytes: &[u8], index: usize) -> Result<i128, SchemaError> {
    let split = bytes.len().saturating_sub(16);
    let (high, low) = bytes.split_at(split);
    let negative = low.first().is_some_and(|b| b & 0x80 != 0);
    let fill = if negative { 0xFF } else { 0x00 };
    if high.iter().any(|b| *b != fill) {
        return Err(SchemaError::ValueOutOfRange { index });
    }
    let mut buf = [fill; 16];
    buf[16 - low.len()..].copy_from_slice(low);
    Ok(i128::from_be_bytes(buf))
}

fn encode_static_value(
    ty: &StaticType,
    value: &StaticValue,
    index: usize,
    out: &mut Vec<u8>,
) -> Result<(), SchemaError> {
    match (ty, value) {
        (StaticType::Uint(_), StaticValue::Uint(v)) => encode_uint(*v, ty.width(), index, out),
        (StaticType::Int(_), StaticValue::Int(v)) => encode_int(*v, ty.width(), index, out),
        (StaticType::Bool, StaticValue::Bool(v)) => {
            out.push(u8::from(*v));
            Ok(())
        }
        (StaticType::Address, StaticValue::Address(a)) => {
            out.extend_from_slice(&a.0);
            Ok(())
        }
        (StaticType::FixedBytes(_), StaticValue::FixedBytes(b)) if b.len() == ty.width() => {
            out.extend_from_slice(b);
            Ok(())
        }
        _ => Err(mismatch(index, ty)),
    }
}

fn decode_static_value(ty: &StaticType, bytes: &[u8], index: usize) -> Result<StaticValue, SchemaError> {
    if bytes.len() != ty.width() {
        return Err(SchemaError::Malformed(format!(
            "field {} expects {} bytes, got {}",
            index,
            ty.width(),
            bytes.len()
        )));
    }
    match ty {
        StaticType::Uint(_) => decode_uint(bytes, index).map(StaticValue::Uint),
        StaticType::Int(_) => decode_int(bytes, index).map(StaticValue::Int),
        StaticType::Bool => match bytes {
            [0] => Ok(StaticValue::Bool(false)),
            [1] => Ok(StaticValue::Bool(true)),
            _ => Err(SchemaError::Malformed(format!("field {} is not a boolean", index))),
        },
        StaticType::Address => {
            let mut raw = [0u8; 20];
            raw.copy_from_slice(bytes);
            Ok(StaticValue::Address(Address(raw)))
        }
        StaticType::FixedBytes(_) => Ok(StaticValue::FixedBytes(bytes.to_vec())),
    }
}

/// Encodes static values into the unpadded concatenation of their fixed-width forms.
pub fn encode_static(types: &[StaticType], values: &[StaticValue]) -> Result<Vec<u8>, SchemaError> {
    if types.len() != values.len() {
        return Err(SchemaError::ValueCount {
            expected: types.len(),
            got: values.len(),
        });
    }
    let mut out = Vec::with_capacity(types.iter().map(StaticType::width).sum());
    for (index, (ty, value)) in types.iter().zip(values).enumerate() {
        encode_static_value(ty, value, index, &mut out)?;
    }
    Ok(out)
}

/// Decodes static data produced by `encode_static`.
pub fn decode_static(types: &[StaticType], data: &[u8]) -> Result<Vec<StaticValue>, SchemaError> {
    let expected: usize = types.iter().map(StaticType::width).sum();
    if data.len() != expected {
        return Err(SchemaError::Malformed(format!(
            "static data is {} bytes, schema expects {}",
            data.len(),
            expected
        )));
    }
    let mut offset = 0;
    let mut values = Vec::with_capacity(types.len());
    for (index, ty) in types.iter().enumerate() {
        let end = offset + ty.width();
        values.push(decode_static_value(ty, &data[offset..end], index)?);
        offset = end;
    }
    Ok(values)
}

fn encode_dynamic_value(ty: &DynamicType, value: &DynamicValue, index: usize) -> Result<Vec<u8>, SchemaError> {
    match (ty, value) {
        (DynamicType::Bytes, DynamicValue::Bytes(b)) => Ok(b.clone()),
        (DynamicType::String, DynamicValue::String(s)) => Ok(s.as_bytes().to_vec()),
        (DynamicType::Array(elem), DynamicValue::Array(items)) => {
            let mut out = Vec::with_capacity(items.len() * elem.width());
            for item in items {
                encode_static_value(elem, item, index, &mut out)?;
            }
            Ok(out)
        }
        _ => Err(mismatch(index, ty)),
    }
}

fn decode_dynamic_value(ty: &DynamicType, bytes: &[u8], index: usize) -> Result<DynamicValue, SchemaError> {
    match ty {
        DynamicType::Bytes => Ok(DynamicValue::Bytes(bytes.to_vec())),
        DynamicType::String => String::from_utf8(bytes.to_vec())
            .map(DynamicValue::String)
            .map_err(|e| SchemaError::Malformed(format!("field {} is not UTF-8: {}", index, e))),
        DynamicType::Array(elem) => {
            let width = elem.width();
            if bytes.len() % width != 0 {
                return Err(SchemaError::Malformed(format!(
                    "field {} length {} is not a multiple of element width {}",
                    index,
                    bytes.len(),
                    width
                )));
            }
            bytes
                .chunks_exact(width)
                .map(|chunk| decode_static_value(elem, chunk, index))
                .collect::<Result<Vec<_>, _>>()
                .map(DynamicValue::Array)
        }
    }
}

/// Encodes dynamic values, returning the length header and the concatenated bytes.
pub fn encode_dynamic(
    types: &[DynamicType],
    values: &[DynamicValue],
) -> Result<(EncodedLengths, Vec<u8>), SchemaError> {
    if types.len() != values.len() {
        return Err(SchemaError::ValueCount {
            expected: types.len(),
            got: values.len(),
        });
    }
    let mut data = Vec::new();
    let mut lengths = Vec::with_capacity(types.len());
    for (index, (ty, value)) in types.iter().zip(values).enumerate() {
        let bytes = encode_dynamic_value(ty, value, index)?;
        lengths.push(bytes.len() as u64);
        data.extend_from_slice(&bytes);
    }
    let header = EncodedLengths::from_lengths(&lengths).map_err(|e| SchemaError::Malformed(e.to_string()))?;
    Ok((header, data))
}

/// Splits dynamic data by its length header and decodes each field.
pub fn decode_dynamic(
    types: &[DynamicType],
    lengths: &EncodedLengths,
    data: &[u8],
) -> Result<Vec<DynamicValue>, SchemaError> {
    if lengths.total() != data.len() as u64 {
        return Err(SchemaError::Malformed(format!(
            "length header declares {} bytes, data has {}",
            lengths.total(),
            data.len()
        )));
    }
    let mut offset = 0usize;
    let mut values = Vec::with_capacity(types.len());
    for (index, ty) in types.iter().enumerate() {
        let end = offset + lengths.at(index) as usize;
        let bytes = data
            .get(offset..end)
            .ok_or_else(|| SchemaError::Malformed(format!("field {} overruns dynamic data", index)))?;
        values.push(decode_dynamic_value(ty, bytes, index)?);
        offset = end;
    }
    if offset != data.len() {
        return Err(SchemaError::Malformed("trailing dynamic data".into()));
    }
    Ok(values)
}

/// Encodes one key atom into a word.
///
/// Numeric, boolean and address values are right-aligned (integers
/// sign-extended), fixed bytes are left-aligned.
pub fn encode_key_atom(ty: &StaticType, value: &StaticValue, index: usize) -> Result<Word, SchemaError> {
    let mut packed = Vec::with_capacity(ty.width());
    encode_static_value(ty, value, index, &mut packed)?;
    let mut word = [0u8; 32];
    match ty {
        StaticType::FixedBytes(_) => word[..packed.len()].copy_from_slice(&packed),
        StaticType::Int(_) => {
            let mut wide = Vec::with_capacity(32);
            if let StaticValue::Int(v) = value {
                encode_int(*v, 32, index, &mut wide)?;
            }
            word.copy_from_slice(&wide);
        }
        _ => word[32 - packed.len()..].copy_from_slice(&packed),
    }
    Ok(word)
}

/// Decodes one key atom, rejecting atoms that do not fit the declared type.
pub fn decode_key_atom(ty: &StaticType, word: &Word, index: usize) -> Result<StaticValue, SchemaError> {
    let width = ty.width();
    let value = match ty {
        StaticType::FixedBytes(_) => {
            if word[width..].iter().any(|b| *b != 0) {
                return Err(SchemaError::ValueOutOfRange { index });
            }
            StaticValue::FixedBytes(word[..width].to_vec())
        }
        StaticType::Int(_) => StaticValue::Int(decode_int(word, index)?),
        StaticType::Uint(_) => StaticValue::Uint(decode_uint(word, index)?),
        StaticType::Bool | StaticType::Address => {
            if word[..32 - width].iter().any(|b| *b != 0) {
                return Err(SchemaError::ValueOutOfRange { index });
            }
            decode_static_value(ty, &word[32 - width..], index)?
        }
    };
    // Re-encoding at the declared width enforces its range.
    encode_static_value(ty, &value, index, &mut Vec::with_capacity(width))?;
    Ok(value)
}
