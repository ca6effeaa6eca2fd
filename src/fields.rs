//! Decoded header fields: packed bytes become explicit enums at this
//! boundary, so no raw bit-mask logic leaks into the rest of the crate.
//!
//! # Encodings covered
//!   - Hash algorithm and encryption mode index bytes (with unknown-code
//!     fallbacks — future minor versions must not fail here).
//!   - The filter byte, in both its pre-v12 and v12 encodings, including
//!     the Delta offset formula.
//!   - Compression metadata in all three historical shapes: the v6/v7
//!     five-byte LZMA properties, the v8–v10 bit-pattern byte, and the
//!     v11+ explicit method/properties byte pair.
//!   - The packed rzip/lrzip level nibbles.
//!
//! # Sentinels
//! LZMA property byte 40 and BZIP3 nibble 8 both mean "unbounded" and
//! decode to `u32::MAX`.

use std::fmt;

// ── Hash algorithms ──────────────────────────────────────────────────────────

/// Hash recorded in the header from v0.8 on, one index byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Crc,
    Md5,
    Ripemd,
    Sha256,
    Sha384,
    Sha512,
    Sha3_256,
    Sha3_512,
    Shake128_16,
    Shake128_32,
    Shake128_64,
    Shake256_8,
    Shake256_32,
    Shake256_64,
    Unknown(u8),
}

impl HashAlgorithm {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => HashAlgorithm::Crc,
            1 => HashAlgorithm::Md5,
            2 => HashAlgorithm::Ripemd,
            3 => HashAlgorithm::Sha256,
            4 => HashAlgorithm::Sha384,
            5 => HashAlgorithm::Sha512,
            6 => HashAlgorithm::Sha3_256,
            7 => HashAlgorithm::Sha3_512,
            8 => HashAlgorithm::Shake128_16,
            9 => HashAlgorithm::Shake128_32,
            10 => HashAlgorithm::Shake128_64,
            11 => HashAlgorithm::Shake256_8,
            12 => HashAlgorithm::Shake256_32,
            13 => HashAlgorithm::Shake256_64,
            other => HashAlgorithm::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            HashAlgorithm::Crc => 0,
            HashAlgorithm::Md5 => 1,
            HashAlgorithm::Ripemd => 2,
            HashAlgorithm::Sha256 => 3,
            HashAlgorithm::Sha384 => 4,
            HashAlgorithm::Sha512 => 5,
            HashAlgorithm::Sha3_256 => 6,
            HashAlgorithm::Sha3_512 => 7,
            HashAlgorithm::Shake128_16 => 8,
            HashAlgorithm::Shake128_32 => 9,
            HashAlgorithm::Shake128_64 => 10,
            HashAlgorithm::Shake256_8 => 11,
            HashAlgorithm::Shake256_32 => 12,
            HashAlgorithm::Shake256_64 => 13,
            HashAlgorithm::Unknown(code) => code,
        }
    }

    /// Human-readable name (for diagnostics only — never parsed).
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Crc => "CRC",
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Ripemd => "RIPEMD",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_512 => "SHA3-512",
            HashAlgorithm::Shake128_16 => "SHAKE128_16",
            HashAlgorithm::Shake128_32 => "SHAKE128_32",
            HashAlgorithm::Shake128_64 => "SHAKE128_64",
            HashAlgorithm::Shake256_8 => "SHAKE256_8",
            HashAlgorithm::Shake256_32 => "SHAKE256_32",
            HashAlgorithm::Shake256_64 => "SHAKE256_64",
            HashAlgorithm::Unknown(_) => "unknown",
        }
    }
}

// ── Encryption modes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionMode {
    None,
    Aes128,
    Aes256,
    Unknown(u8),
}

impl EncryptionMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => EncryptionMode::None,
            1 => EncryptionMode::Aes128,
            2 => EncryptionMode::Aes256,
            other => EncryptionMode::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            EncryptionMode::None => 0,
            EncryptionMode::Aes128 => 1,
            EncryptionMode::Aes256 => 2,
            EncryptionMode::Unknown(code) => code,
        }
    }

    /// Any nonzero mode byte means the size field holds key material,
    /// including modes this build does not know.
    pub fn is_encrypted(self) -> bool {
        !matches!(self, EncryptionMode::None)
    }

    pub fn name(self) -> &'static str {
        match self {
            EncryptionMode::None => "none",
            EncryptionMode::Aes128 => "AES128",
            EncryptionMode::Aes256 => "AES256",
            EncryptionMode::Unknown(_) => "unknown",
        }
    }
}

// ── Filters ──────────────────────────────────────────────────────────────────

/// Pre-compression data transform recorded so decompression can reverse it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    None,
    X86,
    Arm,
    ArmThumb,
    Arm64,
    Ppc,
    Sparc,
    Ia64,
    /// Delta filter. `offset` is `None` exactly on the pre-v12 `>16` code
    /// branch, where the original computes an offset and never stores it.
    Delta { offset: Option<u32> },
}

impl FilterKind {
    fn from_table_code(code: u8) -> Self {
        match code {
            1 => FilterKind::X86,
            2 => FilterKind::Arm,
            3 => FilterKind::ArmThumb,
            4 => FilterKind::Ppc,
            5 => FilterKind::Sparc,
            6 => FilterKind::Ia64,
            7 => FilterKind::Arm64,
            _ => FilterKind::None,
        }
    }

    /// Pre-v12 encoding: the low 3 bits select the filter, and value 7
    /// means Delta with the offset code in the high bits.
    pub fn from_legacy_byte(raw: u8) -> Self {
        match raw & 0b0000_0111 {
            7 => {
                let code = u32::from(raw >> 3);
                // The original computes (code - 16 + 1) * 16 for code > 16
                // but never stores the result, so the offset is unspecified
                // there. Preserved as-is for format compatibility.
                let offset = if code <= 16 { Some(code + 1) } else { None };
                FilterKind::Delta { offset }
            }
            code => Self::from_table_code(code),
        }
    }

    /// v12 encoding: any raw value above 7 means Delta, and code 7 is ARM64.
    pub fn from_packed_byte(raw: u8) -> Self {
        if raw > 7 {
            let code = u32::from(raw >> 3);
            let offset = if code <= 16 { code + 1 } else { (code - 15) * 16 };
            FilterKind::Delta { offset: Some(offset) }
        } else {
            Self::from_table_code(raw)
        }
    }

    /// Re-encode into the raw filter byte. The unspecified Delta branch has
    /// no recoverable code; 17, the smallest code that maps to it, stands in.
    pub fn to_byte(self) -> u8 {
        match self {
            FilterKind::None => 0,
            FilterKind::X86 => 1,
            FilterKind::Arm => 2,
            FilterKind::ArmThumb => 3,
            FilterKind::Ppc => 4,
            FilterKind::Sparc => 5,
            FilterKind::Ia64 => 6,
            FilterKind::Arm64 => 7,
            FilterKind::Delta { offset } => {
                let code = match offset {
                    Some(o) if o <= 17 => o - 1,
                    Some(o) => o / 16 + 15,
                    None => 17,
                };
                ((code as u8) << 3) | 7
            }
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::None => write!(f, "none"),
            FilterKind::X86 => write!(f, "x86"),
            FilterKind::Arm => write!(f, "ARM"),
            FilterKind::ArmThumb => write!(f, "ARM Thumb"),
            FilterKind::Arm64 => write!(f, "ARM64"),
            FilterKind::Ppc => write!(f, "PPC"),
            FilterKind::Sparc => write!(f, "SPARC"),
            FilterKind::Ia64 => write!(f, "IA64"),
            FilterKind::Delta { offset: Some(o) } => write!(f, "delta (offset {o})"),
            FilterKind::Delta { offset: None } => write!(f, "delta (offset unspecified)"),
        }
    }
}

// ── Compression metadata ─────────────────────────────────────────────────────

/// LZMA dictionary size from the one-byte property. 40 is the unbounded
/// sentinel; the rest follow the mantissa/exponent formula.
pub fn lzma_dict_size(prop: u8) -> u32 {
    if prop == 40 {
        u32::MAX
    } else {
        (2 | (u32::from(prop) & 1)) << (u32::from(prop) / 2 + 11)
    }
}

/// BZIP3 block size from the low nibble. 8 is the unbounded sentinel.
pub fn bzip3_block_size(nibble: u8) -> u32 {
    if nibble == 8 {
        u32::MAX
    } else {
        (2 | (u32::from(nibble) & 1)) << (u32::from(nibble) / 2 + 24)
    }
}

/// Compression metadata in whichever shape the header revision records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionInfo {
    /// Nothing recorded — the none/bzip2/gzip/lzo backends store no
    /// parameters in any revision.
    Unrecorded,
    /// v6/v7 five-byte LZMA properties.
    LegacyLzma { lc: u8, lp: u8, pb: u8, dict_size: u32 },
    /// v8+ one-byte dictionary property.
    Lzma { dict_prop: u8, dict_size: u32 },
    Zpaq { level: u8, block_size_code: u8 },
    Bzip3 { block_size_code: u8, block_size: u32 },
    /// v11+ only.
    Zstd { strategy: u8, level: u8 },
    /// v11+ method codes this build does not model.
    Unknown { method: u8, props: u8 },
}

impl CompressionInfo {
    /// v6/v7: the first byte packs (lc, lp, pb), the rest is the
    /// little-endian dictionary size. All-zero properties mean the archive
    /// was not LZMA compressed.
    pub fn from_legacy_props(props: &[u8; 5]) -> Self {
        if props.iter().all(|&b| b == 0) {
            return CompressionInfo::Unrecorded;
        }
        let mut d = props[0];
        let lc = d % 9;
        d /= 9;
        let pb = d / 5;
        let lp = d % 5;
        let dict_size = u32::from_le_bytes([props[1], props[2], props[3], props[4]]);
        CompressionInfo::LegacyLzma { lc, lp, pb, dict_size }
    }

    /// v8–v10 bit-pattern byte: bit 7 tags ZPAQ, bit 6 tags BZIP3, anything
    /// else nonzero is an LZMA dictionary property.
    pub fn from_props_byte(raw: u8) -> Self {
        if raw == 0 {
            CompressionInfo::Unrecorded
        } else if raw & 0b1000_0000 != 0 {
            CompressionInfo::Zpaq {
                level: (raw >> 4) & 0b0111,
                block_size_code: raw & 0x0F,
            }
        } else if raw & 0b0100_0000 != 0 {
            let code = raw & 0x0F;
            CompressionInfo::Bzip3 { block_size_code: code, block_size: bzip3_block_size(code) }
        } else {
            CompressionInfo::Lzma { dict_prop: raw, dict_size: lzma_dict_size(raw) }
        }
    }

    /// v11+: the low 3 bits of the method byte select the backend, the next
    /// byte carries its parameters. ZSTD also claims the method byte's high
    /// 4 bits for its strategy code.
    pub fn from_method_bytes(method: u8, props: u8) -> Self {
        match method & 0b0000_0111 {
            0 => CompressionInfo::Unrecorded,
            1 => CompressionInfo::Lzma { dict_prop: props, dict_size: lzma_dict_size(props) },
            2 => CompressionInfo::Zpaq {
                level: (props >> 4) & 0b0111,
                block_size_code: props & 0x0F,
            },
            3 => {
                let code = props & 0x0F;
                CompressionInfo::Bzip3 { block_size_code: code, block_size: bzip3_block_size(code) }
            }
            4 => CompressionInfo::Zstd { strategy: method >> 4, level: props },
            code => CompressionInfo::Unknown { method: code, props },
        }
    }

    /// Re-encode into the v8–v10 single byte.
    pub fn to_props_byte(self) -> u8 {
        match self {
            CompressionInfo::Zpaq { level, block_size_code } => {
                0b1000_0000 | (level << 4) | block_size_code
            }
            CompressionInfo::Bzip3 { block_size_code, .. } => 0b0100_0000 | block_size_code,
            CompressionInfo::Lzma { dict_prop, .. } => dict_prop,
            _ => 0,
        }
    }

    /// Re-encode into the v11+ (method, props) byte pair.
    pub fn to_method_bytes(self) -> (u8, u8) {
        match self {
            CompressionInfo::Unrecorded => (0, 0),
            CompressionInfo::Lzma { dict_prop, .. } => (1, dict_prop),
            CompressionInfo::Zpaq { level, block_size_code } => (2, (level << 4) | block_size_code),
            CompressionInfo::Bzip3 { block_size_code, .. } => (3, block_size_code),
            CompressionInfo::Zstd { strategy, level } => (4 | (strategy << 4), level),
            CompressionInfo::Unknown { method, props } => (method, props),
            // The legacy quintuple never appears alongside a method byte.
            CompressionInfo::LegacyLzma { .. } => (0, 0),
        }
    }

    /// Re-encode the v6/v7 five-byte properties.
    pub fn to_legacy_props(self) -> [u8; 5] {
        match self {
            CompressionInfo::LegacyLzma { lc, lp, pb, dict_size } => {
                let d = (pb * 5 + lp) * 9 + lc;
                let ds = dict_size.to_le_bytes();
                [d, ds[0], ds[1], ds[2], ds[3]]
            }
            _ => [0; 5],
        }
    }
}

impl fmt::Display for CompressionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn size(v: u32) -> String {
            if v == u32::MAX { "unbounded".into() } else { v.to_string() }
        }
        match self {
            CompressionInfo::Unrecorded => write!(f, "not recorded"),
            CompressionInfo::LegacyLzma { lc, lp, pb, dict_size } => {
                write!(f, "LZMA (lc={lc}, lp={lp}, pb={pb}, dictionary size {dict_size})")
            }
            CompressionInfo::Lzma { dict_prop, dict_size } => {
                write!(f, "LZMA (dictionary size {}, property {dict_prop})", size(*dict_size))
            }
            CompressionInfo::Zpaq { level, block_size_code } => {
                write!(f, "ZPAQ (level {level}, block size code {block_size_code})")
            }
            CompressionInfo::Bzip3 { block_size_code, block_size } => {
                write!(f, "BZIP3 (block size {}, code {block_size_code})", size(*block_size))
            }
            CompressionInfo::Zstd { strategy, level } => {
                write!(f, "ZSTD (strategy {strategy}, level {level})")
            }
            CompressionInfo::Unknown { method, props } => {
                write!(f, "unknown method {method} (props {props:#04x})")
            }
        }
    }
}

// ── Levels ───────────────────────────────────────────────────────────────────

/// The two 4-bit compression levels packed into one byte from v0.9 on:
/// rzip in the high nibble, lrzip in the low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    pub rzip: u8,
    pub lrzip: u8,
}

impl Levels {
    pub fn from_byte(raw: u8) -> Self {
        Levels { rzip: raw >> 4, lrzip: raw & 0x0F }
    }

    pub fn to_byte(self) -> u8 {
        (self.rzip << 4) | (self.lrzip & 0x0F)
    }
}

// ── Key material ─────────────────────────────────────────────────────────────

/// Key-derivation bytes that occupy the size field of encrypted archives:
/// two hash-loop bytes followed by six salt bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaltField {
    pub loops: [u8; 2],
    pub salt: [u8; 6],
}

impl SaltField {
    pub fn from_bytes(bytes: &[u8; 8]) -> Self {
        SaltField {
            loops: [bytes[0], bytes[1]],
            salt: [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]],
        }
    }

    pub fn to_bytes(self) -> [u8; 8] {
        let [l0, l1] = self.loops;
        let [s0, s1, s2, s3, s4, s5] = self.salt;
        [l0, l1, s0, s1, s2, s3, s4, s5]
    }

    /// Hash loop count: mantissa byte shifted by the exponent byte.
    pub fn loop_count(self) -> u64 {
        u64::from(self.loops[1])
            .checked_shl(u32::from(self.loops[0]))
            .unwrap_or(u64::MAX)
    }
}
