//! Magic-header read and decode.
//!
//! A decode is at most three bounded reads: the 6-byte prefix resolves the
//! layout, the remainder of the fixed header follows, and a comment tail is
//! read only when the layout supports one and its length byte is nonzero.
//! Decoding the fixed fields is a pure function of the bytes already in
//! memory — the only fallible steps are the signature check and running out
//! of bytes.

use std::io::{self, Read};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::MagicError;
use crate::fields::{
    CompressionInfo, EncryptionMode, FilterKind, HashAlgorithm, Levels, SaltField,
};
use crate::layout::{resolve_prefix, HeaderLayout, HeaderVersion, MAX_FIXED_LEN, PREFIX_LEN};

/// Write-side cap on comment length. The length byte is still authoritative
/// on read, so longer declared comments are consumed in full.
pub const MAX_COMMENT_LEN: usize = 64;

// ── RawHeader ────────────────────────────────────────────────────────────────

/// Fixed-capacity buffer holding one archive's fixed header region, filled
/// to exactly the length its own version tag resolves to.
#[derive(Debug, Clone)]
pub struct RawHeader {
    buf: [u8; MAX_FIXED_LEN],
    version: HeaderVersion,
    layout: HeaderLayout,
}

impl RawHeader {
    /// Read the 6-byte prefix, resolve the layout, then read the remainder
    /// of the fixed header. A bad signature stops before any further read.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MagicError> {
        let mut buf = [0u8; MAX_FIXED_LEN];
        let got = read_up_to(reader, &mut buf[..PREFIX_LEN])?;
        if got >= 4 && &buf[..4] != crate::layout::MAGIC_SIGNATURE {
            return Err(MagicError::NotAnArchive);
        }
        if got < PREFIX_LEN {
            return Err(MagicError::Truncated { needed: PREFIX_LEN, got });
        }

        let prefix: [u8; PREFIX_LEN] = buf[..PREFIX_LEN].try_into().unwrap();
        let (version, layout) = resolve_prefix(&prefix)?;
        let needed = layout.total_len();
        let got = PREFIX_LEN + read_up_to(reader, &mut buf[PREFIX_LEN..needed])?;
        if got < needed {
            return Err(MagicError::Truncated { needed, got });
        }
        Ok(RawHeader { buf, version, layout })
    }

    /// Build from an in-memory slice; the same validation as [`read_from`].
    ///
    /// [`read_from`]: RawHeader::read_from
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MagicError> {
        if bytes.len() >= 4 && &bytes[..4] != crate::layout::MAGIC_SIGNATURE {
            return Err(MagicError::NotAnArchive);
        }
        if bytes.len() < PREFIX_LEN {
            return Err(MagicError::Truncated { needed: PREFIX_LEN, got: bytes.len() });
        }
        let prefix: [u8; PREFIX_LEN] = bytes[..PREFIX_LEN].try_into().unwrap();
        let (version, layout) = resolve_prefix(&prefix)?;
        let needed = layout.total_len();
        if bytes.len() < needed {
            return Err(MagicError::Truncated { needed, got: bytes.len() });
        }
        let mut buf = [0u8; MAX_FIXED_LEN];
        buf[..needed].copy_from_slice(&bytes[..needed]);
        Ok(RawHeader { buf, version, layout })
    }

    pub fn version(&self) -> HeaderVersion {
        self.version
    }

    pub fn layout(&self) -> HeaderLayout {
        self.layout
    }

    /// The fixed header bytes, exactly `layout().total_len()` long.
    pub fn bytes(&self) -> &[u8] {
        &self.buf[..self.layout.total_len()]
    }

    /// Declared comment length, for layouts that carry one.
    pub fn comment_len(&self) -> Option<usize> {
        self.layout.comment_len_offset().map(|off| usize::from(self.buf[off]))
    }
}

// ── MagicHeader ──────────────────────────────────────────────────────────────

/// Fully decoded view of one archive's magic header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicHeader {
    pub version: HeaderVersion,
    pub layout: HeaderLayout,
    /// Present exactly when the archive is not encrypted.
    pub stored_size: Option<u64>,
    pub encryption: EncryptionMode,
    /// Key material occupying the size field of encrypted archives.
    pub salt: Option<SaltField>,
    /// Recorded from v0.8 on; the legacy layouts carry only the MD5 flag.
    pub hash: Option<HashAlgorithm>,
    /// v6/v7 MD5-at-EOF flag byte. Always `None` from v0.8 on.
    pub md5_at_eof: Option<bool>,
    pub filter: FilterKind,
    pub compression: CompressionInfo,
    pub levels: Option<Levels>,
    pub comment: Option<String>,
}

impl MagicHeader {
    /// One-shot decode: raw header, fixed fields, then the comment tail.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, MagicError> {
        let raw = RawHeader::read_from(reader)?;
        let mut header = Self::decode(&raw)?;
        if let Some(declared) = raw.comment_len() {
            header.comment = read_comment(reader, declared)?;
        }
        Ok(header)
    }

    /// Decode the fixed fields. Pure: no I/O, no state beyond the bytes.
    pub fn decode(raw: &RawHeader) -> Result<Self, MagicError> {
        let bytes = raw.bytes();
        let version = raw.version();
        let layout = raw.layout();

        let (encryption, hash, md5_at_eof, filter, compression, levels) = match layout {
            HeaderLayout::Legacy { filter_offset: fo } => {
                let encryption = if bytes[22 + fo] != 0 {
                    EncryptionMode::Aes128
                } else {
                    EncryptionMode::None
                };
                let filter = if fo == 1 {
                    FilterKind::from_legacy_byte(bytes[16])
                } else {
                    FilterKind::None
                };
                let props: [u8; 5] = bytes[16 + fo..21 + fo].try_into().unwrap();
                let compression = CompressionInfo::from_legacy_props(&props);
                let md5_at_eof = Some(bytes[21 + fo] != 0);
                (encryption, None, md5_at_eof, filter, compression, None)
            }
            HeaderLayout::V8 | HeaderLayout::V9 => {
                let compression = CompressionInfo::from_props_byte(bytes[14]);
                let filter = FilterKind::from_legacy_byte(bytes[15]);
                let hash = Some(HashAlgorithm::from_code(bytes[16]));
                let encryption = EncryptionMode::from_code(bytes[17]);
                let levels = (layout == HeaderLayout::V9).then(|| Levels::from_byte(bytes[18]));
                (encryption, hash, None, filter, compression, levels)
            }
            HeaderLayout::V11 => {
                let hash = Some(HashAlgorithm::from_code(bytes[14]));
                let filter = if version.has_packed_filter() {
                    FilterKind::from_packed_byte(bytes[15])
                } else {
                    FilterKind::from_legacy_byte(bytes[15])
                };
                let encryption = EncryptionMode::from_code(bytes[16]);
                let compression = CompressionInfo::from_method_bytes(bytes[17], bytes[18]);
                let levels = Some(Levels::from_byte(bytes[19]));
                (encryption, hash, None, filter, compression, levels)
            }
        };

        let size_field: [u8; 8] = bytes[6..14].try_into().unwrap();
        let (stored_size, salt) = if encryption.is_encrypted() {
            (None, Some(SaltField::from_bytes(&size_field)))
        } else {
            (Some(LittleEndian::read_u64(&size_field)), None)
        };

        Ok(MagicHeader {
            version,
            layout,
            stored_size,
            encryption,
            salt,
            hash,
            md5_at_eof,
            filter,
            compression,
            levels,
            comment: None,
        })
    }

    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_encrypted()
    }

    /// Re-encode the fixed header. Inverse of [`decode`] for every field the
    /// codec models losslessly; the comment tail is not included.
    ///
    /// [`decode`]: MagicHeader::decode
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.layout.total_len()];
        bytes[..4].copy_from_slice(crate::layout::MAGIC_SIGNATURE);
        bytes[4] = self.version.major;
        bytes[5] = self.version.minor;
        match (self.stored_size, self.salt) {
            (Some(size), _) => LittleEndian::write_u64(&mut bytes[6..14], size),
            (None, Some(salt)) => bytes[6..14].copy_from_slice(&salt.to_bytes()),
            (None, None) => {}
        }

        match self.layout {
            HeaderLayout::Legacy { filter_offset: fo } => {
                if fo == 1 {
                    bytes[16] = self.filter.to_byte();
                }
                bytes[16 + fo..21 + fo].copy_from_slice(&self.compression.to_legacy_props());
                bytes[21 + fo] = u8::from(self.md5_at_eof.unwrap_or(false));
                bytes[22 + fo] = u8::from(self.is_encrypted());
            }
            HeaderLayout::V8 | HeaderLayout::V9 => {
                bytes[14] = self.compression.to_props_byte();
                bytes[15] = self.filter.to_byte();
                bytes[16] = self.hash.map_or(0, HashAlgorithm::code);
                bytes[17] = self.encryption.code();
                if self.layout == HeaderLayout::V9 {
                    bytes[18] = self.levels.map_or(0, Levels::to_byte);
                }
            }
            HeaderLayout::V11 => {
                bytes[14] = self.hash.map_or(0, HashAlgorithm::code);
                bytes[15] = self.filter.to_byte();
                bytes[16] = self.encryption.code();
                let (method, props) = self.compression.to_method_bytes();
                bytes[17] = method;
                bytes[18] = props;
                bytes[19] = self.levels.map_or(0, Levels::to_byte);
            }
        }
        if let Some(off) = self.layout.comment_len_offset() {
            bytes[off] = self.comment.as_deref().map_or(0, |c| c.len() as u8);
        }
        bytes
    }
}

// ── Comment reader ───────────────────────────────────────────────────────────

/// Read the comment tail that immediately follows the fixed header. A zero
/// declared length is "no comment", not an error.
pub fn read_comment<R: Read>(reader: &mut R, declared: usize) -> Result<Option<String>, MagicError> {
    if declared == 0 {
        return Ok(None);
    }
    let mut buf = vec![0u8; declared];
    let got = read_up_to(reader, &mut buf)?;
    if got < declared {
        return Err(MagicError::Truncated { needed: declared, got });
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Fill as much of `buf` as the reader can provide, reporting the count
/// instead of failing on a short read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
