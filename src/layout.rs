//! Version resolver: the 6-byte prefix determines header length and layout.
//!
//! Every lrzip archive starts with the `LRZI` signature followed by a
//! (major, minor) version pair. The minor version alone selects how long the
//! fixed header is and where every field sits:
//!
//! | minor | length | layout |
//! |-------|--------|--------|
//! | ≤6    | 24     | legacy, no filter byte |
//! | 7     | 24     | legacy, filter byte at 16 shifts the tail by one |
//! | 8     | 18     | packed props/filter/hash/encryption bytes |
//! | 9–10  | 20     | v8 plus levels and comment-length bytes |
//! | ≥11   | 21     | explicit compression-method byte, comment |
//!
//! The v6/v7 pair is the one case resolved by offset arithmetic (a filter
//! offset of 0 or 1 shifting all later fields) rather than table lookup.

use std::fmt;

use crate::error::MagicError;

/// Signature at byte 0 of every archive.
pub const MAGIC_SIGNATURE: &[u8; 4] = b"LRZI";
/// Signature plus the version pair.
pub const PREFIX_LEN: usize = 6;
/// Longest fixed header across all revisions (v6/v7).
pub const MAX_FIXED_LEN: usize = 24;
/// The stored-size field: 8 little-endian bytes at offset 6 in every revision.
pub const SIZE_OFFSET: u64 = 6;
pub const SIZE_LEN: usize = 8;

/// The (major, minor) tag at bytes 4-5. Immutable once read; every later
/// interpretation decision keys off `minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderVersion {
    pub major: u8,
    pub minor: u8,
}

impl HeaderVersion {
    /// v0.12 changed the filter-byte encoding (raw values above 7 always
    /// mean Delta, and code 7 became ARM64).
    pub fn has_packed_filter(self) -> bool {
        self.minor >= 12
    }
}

impl fmt::Display for HeaderVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Layout variant resolved once per decode and consumed uniformly by the
/// field decoder. Minor versions the codec has not explicitly modeled fall
/// through to the newest layout rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// v0.6/v0.7: 24 bytes, five-byte LZMA properties, MD5 and encryption
    /// flag bytes at the tail. `filter_offset` is 1 exactly when the v7
    /// filter byte at offset 16 shifts everything after it.
    Legacy { filter_offset: usize },
    /// v0.8: 18 bytes.
    V8,
    /// v0.9/v0.10: 20 bytes, adds packed levels and a comment.
    V9,
    /// v0.11 onward: 21 bytes, explicit compression-method byte.
    V11,
}

impl HeaderLayout {
    pub fn for_version(version: HeaderVersion) -> Self {
        match version.minor {
            0..=6 => HeaderLayout::Legacy { filter_offset: 0 },
            7 => HeaderLayout::Legacy { filter_offset: 1 },
            8 => HeaderLayout::V8,
            9 | 10 => HeaderLayout::V9,
            _ => HeaderLayout::V11,
        }
    }

    /// Fixed header length, comment tail excluded.
    pub fn total_len(self) -> usize {
        match self {
            HeaderLayout::Legacy { .. } => 24,
            HeaderLayout::V8 => 18,
            HeaderLayout::V9 => 20,
            HeaderLayout::V11 => 21,
        }
    }

    /// Offset of the comment length byte, for the layouts that carry one.
    pub fn comment_len_offset(self) -> Option<usize> {
        match self {
            HeaderLayout::V9 => Some(19),
            HeaderLayout::V11 => Some(20),
            _ => None,
        }
    }
}

/// Validate the signature and resolve version and layout from the prefix.
pub fn resolve_prefix(prefix: &[u8; PREFIX_LEN]) -> Result<(HeaderVersion, HeaderLayout), MagicError> {
    if &prefix[..4] != MAGIC_SIGNATURE {
        return Err(MagicError::NotAnArchive);
    }
    let version = HeaderVersion { major: prefix[4], minor: prefix[5] };
    Ok((version, HeaderLayout::for_version(version)))
}
