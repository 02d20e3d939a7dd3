// Path: crates/types/src/resource.rs

//! Resource identifiers and caller identities.
//!
//! A `ResourceId` is a fixed 32-byte value packed as
//! `type tag (2) | namespace (14) | name (16)`. Packing is direct, not hashed,
//! so encoding is injective and every id decodes back to its parts.

use crate::error::ResourceIdError;
use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte atom used for key tuples and packed headers.
pub type Word = [u8; 32];

/// Number of bytes used by the resource type tag.
pub const TYPE_BYTES: usize = 2;
/// Number of bytes used by the namespace segment.
pub const NAMESPACE_BYTES: usize = 14;
/// Number of bytes used by the name segment.
pub const NAME_BYTES: usize = 16;

/// The namespace segment of the root namespace.
pub const ROOT_NAMESPACE: [u8; NAMESPACE_BYTES] = [0u8; NAMESPACE_BYTES];

/// A 20-byte identity of a caller or an executable.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null identity. A namespace owned by it is burned.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Builds an address with every byte set to `byte`.
    pub const fn repeat_byte(byte: u8) -> Self {
        Address([byte; 20])
    }

    /// Returns true for the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Encodes the address as a right-aligned key atom.
    pub fn to_word(&self) -> Word {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    /// Decodes a right-aligned key atom. The 12 leading bytes are ignored.
    pub fn from_word(word: &Word) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// The kind of resource a `ResourceId` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    /// A table whose records are persisted.
    Table,
    /// A table whose records are only emitted as events.
    OffchainTable,
    /// An ownable container of other resources.
    Namespace,
    /// Invocable logic registered under a stable id.
    System,
    /// An installable bundle of tables and systems.
    Module,
}

impl ResourceType {
    /// The two-byte tag stored at the front of a `ResourceId`.
    pub const fn tag(self) -> [u8; TYPE_BYTES] {
        match self {
            ResourceType::Table => *b"tb",
            ResourceType::OffchainTable => *b"ot",
            ResourceType::Namespace => *b"ns",
            ResourceType::System => *b"sy",
            ResourceType::Module => *b"md",
        }
    }

    /// Resolves a two-byte tag back to its type.
    pub fn from_tag(tag: [u8; TYPE_BYTES]) -> Option<Self> {
        match &tag {
            b"tb" => Some(ResourceType::Table),
            b"ot" => Some(ResourceType::OffchainTable),
            b"ns" => Some(ResourceType::Namespace),
            b"sy" => Some(ResourceType::System),
            b"md" => Some(ResourceType::Module),
            _ => None,
        }
    }

    /// Returns true for both persisted and offchain tables.
    pub fn is_table(self) -> bool {
        matches!(self, ResourceType::Table | ResourceType::OffchainTable)
    }
}

/// A fixed-width identifier for exactly one resource.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
pub struct ResourceId(pub Word);

impl ResourceId {
    /// Packs a type, namespace and name into an id.
    pub fn encode(
        resource_type: ResourceType,
        namespace: &[u8; NAMESPACE_BYTES],
        name: &[u8; NAME_BYTES],
    ) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..TYPE_BYTES].copy_from_slice(&resource_type.tag());
        bytes[TYPE_BYTES..TYPE_BYTES + NAMESPACE_BYTES].copy_from_slice(namespace);
        bytes[TYPE_BYTES + NAMESPACE_BYTES..].copy_from_slice(name);
        ResourceId(bytes)
    }

    /// Builds an id from string segments, zero-padding them on the right.
    pub fn new(resource_type: ResourceType, namespace: &str, name: &str) -> Result<Self, ResourceIdError> {
        let namespace = pad_segment::<NAMESPACE_BYTES>(namespace)
            .ok_or_else(|| ResourceIdError::NamespaceTooLong(namespace.to_string()))?;
        let name = pad_segment::<NAME_BYTES>(name)
            .ok_or_else(|| ResourceIdError::NameTooLong(name.to_string()))?;
        Ok(Self::encode(resource_type, &namespace, &name))
    }

    /// Builds an id from literal segments at compile time, for well-known
    /// resources. Segments that do not fit fail const evaluation.
    pub const fn literal(resource_type: ResourceType, namespace: &str, name: &str) -> Self {
        let namespace = namespace.as_bytes();
        let name = name.as_bytes();
        assert!(namespace.len() <= NAMESPACE_BYTES, "namespace segment too long");
        assert!(name.len() <= NAME_BYTES, "name segment too long");
        let tag = resource_type.tag();
        let mut bytes = [0u8; 32];
        bytes[0] = tag[0];
        bytes[1] = tag[1];
        let mut i = 0;
        while i < namespace.len() {
            bytes[TYPE_BYTES + i] = namespace[i];
            i += 1;
        }
        let mut j = 0;
        while j < name.len() {
            bytes[TYPE_BYTES + NAMESPACE_BYTES + j] = name[j];
            j += 1;
        }
        ResourceId(bytes)
    }

    /// Builds the id of a namespace.
    pub fn namespace(namespace: &str) -> Result<Self, ResourceIdError> {
        Self::new(ResourceType::Namespace, namespace, "")
    }

    /// The id of the root namespace.
    pub fn root_namespace() -> Self {
        Self::encode(ResourceType::Namespace, &ROOT_NAMESPACE, &[0u8; NAME_BYTES])
    }

    /// Unpacks the id into its type, namespace and name segments.
    pub fn decode(&self) -> Result<(ResourceType, [u8; NAMESPACE_BYTES], [u8; NAME_BYTES]), ResourceIdError> {
        let resource_type = self.resource_type()?;
        Ok((resource_type, self.namespace_bytes(), self.name_bytes()))
    }

    /// Returns the resource type encoded in the tag.
    pub fn resource_type(&self) -> Result<ResourceType, ResourceIdError> {
        let tag = [self.0[0], self.0[1]];
        ResourceType::from_tag(tag).ok_or(ResourceIdError::UnknownType(tag))
    }

    /// Returns the raw namespace segment.
    pub fn namespace_bytes(&self) -> [u8; NAMESPACE_BYTES] {
        let mut out = [0u8; NAMESPACE_BYTES];
        out.copy_from_slice(&self.0[TYPE_BYTES..TYPE_BYTES + NAMESPACE_BYTES]);
        out
    }

    /// Returns the raw name segment.
    pub fn name_bytes(&self) -> [u8; NAME_BYTES] {
        let mut out = [0u8; NAME_BYTES];
        out.copy_from_slice(&self.0[TYPE_BYTES + NAMESPACE_BYTES..]);
        out
    }

    /// Returns the id of the namespace containing this resource.
    /// For a namespace id this is the id itself.
    pub fn namespace_id(&self) -> ResourceId {
        Self::encode(ResourceType::Namespace, &self.namespace_bytes(), &[0u8; NAME_BYTES])
    }

    /// Returns true if the resource lives in the root namespace.
    pub fn in_root_namespace(&self) -> bool {
        self.namespace_bytes() == ROOT_NAMESPACE
    }

    /// The id as a key atom.
    pub fn to_word(&self) -> Word {
        self.0
    }
}

fn pad_segment<const N: usize>(segment: &str) -> Option<[u8; N]> {
    let bytes = segment.as_bytes();
    if bytes.len() > N {
        return None;
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Some(out)
}

fn segment_label(segment: &[u8]) -> String {
    let end = segment.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    let trimmed = &segment[..end];
    match std::str::from_utf8(trimmed) {
        Ok(s) => s.to_string(),
        Err(_) => format!("0x{}", hex::encode(trimmed)),
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = segment_label(&self.0[..TYPE_BYTES]);
        write!(
            f,
            "{}:{}:{}",
            tag,
            segment_label(&self.namespace_bytes()),
            segment_label(&self.name_bytes())
        )
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let id = ResourceId::new(ResourceType::System, "app", "Counter").unwrap();
        let (ty, ns, name) = id.decode().unwrap();
        assert_eq!(ty, ResourceType::System);
        assert_eq!(ResourceId::encode(ty, &ns, &name), id);
        assert_eq!(&id.0[..2], b"sy");
        assert_eq!(&ns[..3], b"app");
        assert_eq!(&name[..7], b"Counter");
        assert_eq!(id.to_string(), "sy:app:Counter");
    }

    #[test]
    fn test_literal_matches_new() {
        const TASKS: ResourceId = ResourceId::literal(ResourceType::Table, "app", "Tasks");
        assert_eq!(TASKS, ResourceId::new(ResourceType::Table, "app", "Tasks").unwrap());
    }

    #[test]
    fn test_distinct_parts_never_collide() {
        let a = ResourceId::new(ResourceType::Table, "ab", "c").unwrap();
        let b = ResourceId::new(ResourceType::Table, "a", "bc").unwrap();
        let c = ResourceId::new(ResourceType::OffchainTable, "ab", "c").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_segment_length_limits() {
        assert!(ResourceId::new(ResourceType::Table, "fourteen_bytes", "sixteen_bytes___").is_ok());
        assert!(matches!(
            ResourceId::new(ResourceType::Table, "fifteen_bytes__", "x"),
            Err(ResourceIdError::NamespaceTooLong(_))
        ));
        assert!(matches!(
            ResourceId::new(ResourceType::Table, "ns", "seventeen_bytes__"),
            Err(ResourceIdError::NameTooLong(_))
        ));
    }

    #[test]
    fn test_namespace_id_and_root() {
        let table = ResourceId::new(ResourceType::Table, "app", "Tasks").unwrap();
        assert_eq!(table.namespace_id(), ResourceId::namespace("app").unwrap());
        assert!(!table.in_root_namespace());

        let root_sys = ResourceId::new(ResourceType::System, "", "Admin").unwrap();
        assert!(root_sys.in_root_namespace());
        assert_eq!(root_sys.namespace_id(), ResourceId::root_namespace());
    }

    #[test]
    fn test_unknown_type_tag() {
        let mut raw = [0u8; 32];
        raw[0] = b'z';
        raw[1] = b'z';
        assert!(matches!(
            ResourceId(raw).resource_type(),
            Err(ResourceIdError::UnknownType(_))
        ));
    }

    #[test]
    fn test_address_word_roundtrip() {
        let addr = Address::repeat_byte(0xAB);
        let word = addr.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(Address::from_word(&word), addr);
        assert!(Address::ZERO.is_zero());
    }
}
