//! Types for the sidechain DB parameters.

use std::{fmt, str::FromStr};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::TagError;

/// Index of a registered sidechain.
///
/// Indices are assigned externally when a sidechain is registered and stay stable for the lifetime
/// of the sidechain.
pub type SidechainIdx = u8;

/// Default tag size in bytes.
pub const TAG_SIZE: usize = 4;

/// Wrapper around a 4-byte tag (magic bytes) used to identify relevant output scripts.
///
/// Tags are (de)serialized as hex strings so that non-printable flags such as the deposit flag can
/// be written into a params file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Tag([u8; TAG_SIZE]);

impl Tag {
    /// Creates a new Tag from a byte array.
    pub const fn new(bytes: [u8; TAG_SIZE]) -> Self {
        Tag(bytes)
    }

    /// Returns the tag as a byte slice.
    pub const fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the tag as a byte array.
    pub const fn as_array(&self) -> &[u8; TAG_SIZE] {
        &self.0
    }

    /// Returns true if `bytes` starts with this tag.
    pub fn is_prefix_of(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(&self.0)
    }

    /// Returns the length of the tag in bytes (always 4).
    pub const fn len(&self) -> usize {
        TAG_SIZE
    }

    /// Returns true if the tag contains all zero bytes.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl TryFrom<&[u8]> for Tag {
    type Error = TagError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != TAG_SIZE {
            return Err(TagError::InvalidSize(bytes.len()));
        }
        let array: [u8; TAG_SIZE] = bytes.try_into().map_err(|_| TagError::ConversionFailed)?;
        Ok(Tag(array))
    }
}

impl TryFrom<Vec<u8>> for Tag {
    type Error = TagError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        bytes.as_slice().try_into()
    }
}

impl FromStr for Tag {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| TagError::ConversionFailed)?;
        bytes.try_into()
    }
}

impl From<[u8; TAG_SIZE]> for Tag {
    fn from(bytes: [u8; TAG_SIZE]) -> Self {
        Tag(bytes)
    }
}

impl From<Tag> for [u8; TAG_SIZE] {
    fn from(tag: Tag) -> Self {
        tag.0
    }
}

impl AsRef<[u8]> for Tag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag_str = String::deserialize(deserializer)?;
        Tag::from_str(&tag_str).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_is_empty() {
        let empty_tag = Tag::new([0, 0, 0, 0]);
        assert!(empty_tag.is_empty());

        let non_empty_tag = Tag::new([0x0e, 0x0d, 0x0d, 0x0e]);
        assert!(!non_empty_tag.is_empty());

        let partial_zero_tag = Tag::new([0, 1, 0, 0]);
        assert!(!partial_zero_tag.is_empty());
    }

    #[test]
    fn tag_hex_roundtrip() {
        let tag = Tag::from_str("0e0d0d0e").unwrap();
        assert_eq!(tag.as_array(), &[0x0e, 0x0d, 0x0d, 0x0e]);
        assert_eq!(tag.to_string(), "0e0d0d0e");

        let prefixed = Tag::from_str("0x53434442").unwrap();
        assert_eq!(prefixed.as_bytes(), b"SCDB");
    }

    #[test]
    fn tag_rejects_wrong_size() {
        assert!(matches!(
            Tag::from_str("0e0d0d"),
            Err(TagError::InvalidSize(3))
        ));
        assert!(matches!(
            Tag::try_from(vec![0u8; 5]),
            Err(TagError::InvalidSize(5))
        ));
        assert!(Tag::from_str("not hex").is_err());
    }

    #[test]
    fn tag_prefix() {
        let tag = Tag::new(*b"SCDB");
        assert!(tag.is_prefix_of(b"SCDB and more"));
        assert!(!tag.is_prefix_of(b"SCD"));
        assert!(!tag.is_prefix_of(b"WTPR...."));
    }
}
