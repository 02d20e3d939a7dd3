// Path: crates/types/src/schema/layout.rs

//! The field layout of a table: static widths plus a dynamic field count.

use crate::error::SchemaError;
use crate::resource::Word;
use serde::{Deserialize, Serialize};

/// Maximum number of fields (static plus dynamic) in one layout.
pub const MAX_TOTAL_FIELDS: usize = 28;
/// Maximum number of dynamic fields in one layout.
pub const MAX_DYNAMIC_FIELDS: usize = 5;
/// Maximum width of a single static field.
pub const MAX_STATIC_FIELD_WIDTH: usize = 32;

/// How a table's record values are packed.
///
/// Derived once from the table definition and never varies per record. The
/// total static width is cached at construction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldLayout {
    static_widths: Vec<u8>,
    num_dynamic: u8,
    static_width: u16,
}

impl FieldLayout {
    /// Builds a layout, validating field counts and widths.
    pub fn new(static_widths: &[usize], num_dynamic: usize) -> Result<Self, SchemaError> {
        if num_dynamic > MAX_DYNAMIC_FIELDS {
            return Err(SchemaError::TooManyDynamicFields(num_dynamic));
        }
        let total_fields = static_widths.len() + num_dynamic;
        if total_fields > MAX_TOTAL_FIELDS {
            return Err(SchemaError::TooManyFields(total_fields));
        }
        let mut widths = Vec::with_capacity(static_widths.len());
        let mut static_width: usize = 0;
        for (index, width) in static_widths.iter().enumerate() {
            if *width == 0 || *width > MAX_STATIC_FIELD_WIDTH {
                return Err(SchemaError::InvalidStaticWidth {
                    index,
                    width: *width,
                });
            }
            widths.push(*width as u8);
            static_width += *width;
        }
        let static_width =
            u16::try_from(static_width).map_err(|_| SchemaError::StaticWidthOverflow(static_width))?;
        Ok(Self {
            static_widths: widths,
            num_dynamic: num_dynamic as u8,
            static_width,
        })
    }

    /// Total width of the static region in bytes.
    pub fn static_width(&self) -> usize {
        usize::from(self.static_width)
    }

    /// Number of static fields.
    pub fn num_static_fields(&self) -> usize {
        self.static_widths.len()
    }

    /// Number of dynamic fields.
    pub fn num_dynamic_fields(&self) -> usize {
        usize::from(self.num_dynamic)
    }

    /// Number of fields of both kinds.
    pub fn num_fields(&self) -> usize {
        self.num_static_fields() + self.num_dynamic_fields()
    }

    /// Ordered widths of the static fields.
    pub fn static_widths(&self) -> impl Iterator<Item = usize> + '_ {
        self.static_widths.iter().map(|w| usize::from(*w))
    }

    /// Width of static field `index`.
    pub fn static_field_width(&self, index: usize) -> Option<usize> {
        self.static_widths.get(index).map(|w| usize::from(*w))
    }

    /// Byte offset of static field `index` within the static region.
    pub fn static_field_offset(&self, index: usize) -> Option<usize> {
        if index >= self.static_widths.len() {
            return None;
        }
        Some(self.static_widths.iter().take(index).map(|w| usize::from(*w)).sum())
    }

    /// Packs the layout into a word:
    /// `[0..2]` total static width (big-endian), `[2]` static count,
    /// `[3]` dynamic count, `[4..4+n]` static widths.
    pub fn encode(&self) -> Word {
        let mut word = [0u8; 32];
        word[..2].copy_from_slice(&self.static_width.to_be_bytes());
        word[2] = self.static_widths.len() as u8;
        word[3] = self.num_dynamic;
        for (slot, width) in word[4..].iter_mut().zip(self.static_widths.iter()) {
            *slot = *width;
        }
        word
    }

    /// Unpacks a layout word, checking it is internally consistent.
    pub fn decode(word: &Word) -> Result<Self, SchemaError> {
        let declared = usize::from(u16::from_be_bytes([word[0], word[1]]));
        let num_static = usize::from(word[2]);
        let num_dynamic = usize::from(word[3]);
        if num_static + num_dynamic > MAX_TOTAL_FIELDS {
            return Err(SchemaError::TooManyFields(num_static + num_dynamic));
        }
        let widths: Vec<usize> = word[4..4 + num_static].iter().map(|w| usize::from(*w)).collect();
        let layout = Self::new(&widths, num_dynamic)?;
        if layout.static_width() != declared {
            return Err(SchemaError::Malformed(format!(
                "layout declares static width {} but fields sum to {}",
                declared,
                layout.static_width()
            )));
        }
        if word[4 + num_static..].iter().any(|b| *b != 0) {
            return Err(SchemaError::Malformed("trailing bytes in field layout".into()));
        }
        Ok(layout)
    }
}
