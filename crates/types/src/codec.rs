// Path: crates/types/src/codec.rs

//! Defines the canonical, deterministic binary codec for persisted state and events.
//!
//! This module provides thin wrappers around `parity-scale-codec` (SCALE), chosen
//! for its compact and deterministic properties. Every component that persists a
//! record or ships a `StoreEvent` goes through these two functions, so producer
//! and consumers agree on the exact bytes.

use parity_scale_codec::{Decode, DecodeAll, Encode};

/// Encodes a value into its canonical SCALE byte representation.
pub fn to_bytes_canonical<T: Encode>(v: &T) -> Vec<u8> {
    v.encode()
}

/// Decodes a value from its canonical byte representation.
///
/// Fails on any decoding error, including trailing bytes, returning a
/// descriptive string.
pub fn from_bytes_canonical<T: Decode>(b: &[u8]) -> Result<T, String> {
    T::decode_all(&mut &*b).map_err(|e| format!("canonical decode failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Encode, Decode, Debug, PartialEq, Eq)]
    struct Sample {
        id: u32,
        payload: Vec<u8>,
    }

    #[test]
    fn test_canonical_decode_rejects_trailing_bytes() {
        let mut encoded = to_bytes_canonical(&Sample {
            id: 7,
            payload: vec![1, 2, 3],
        });
        encoded.push(0xFF);
        let err = from_bytes_canonical::<Sample>(&encoded).unwrap_err();
        assert!(err.contains("canonical decode failed"));
    }

    #[test]
    fn test_canonical_decode_failure_on_truncation() {
        let mut encoded = to_bytes_canonical(&Sample {
            id: 99,
            payload: vec![10, 20, 30, 40],
        });
        encoded.pop();
        assert!(from_bytes_canonical::<Sample>(&encoded).is_err());
    }
}
