use std::fs::{File, OpenOptions};
use std::io::Read;

use tempfile::NamedTempFile;

use lrzmagic::error::MagicError;
use lrzmagic::fields::{CompressionInfo, EncryptionMode, FilterKind, HashAlgorithm, Levels};
use lrzmagic::header::{MagicHeader, RawHeader};
use lrzmagic::patch::patch_size;

// ── fixture builders ─────────────────────────────────────────────────────────

fn base_image(minor: u8, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    bytes[..4].copy_from_slice(b"LRZI");
    bytes[4] = 0;
    bytes[5] = minor;
    bytes
}

fn v6_image(stored_size: u64) -> Vec<u8> {
    let mut bytes = base_image(6, 24);
    bytes[6..14].copy_from_slice(&stored_size.to_le_bytes());
    bytes
}

fn v9_image(stored_size: u64) -> Vec<u8> {
    let mut bytes = base_image(9, 20);
    bytes[6..14].copy_from_slice(&stored_size.to_le_bytes());
    bytes[14] = 30; // LZMA dictionary property
    bytes[16] = 3; // SHA-256
    bytes
}

fn write_archive(bytes: &[u8]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(file.path(), bytes).unwrap();
    file
}

fn open_rw(file: &NamedTempFile) -> File {
    OpenOptions::new().read(true).write(true).open(file.path()).unwrap()
}

// ── patch scenarios ──────────────────────────────────────────────────────────

#[test]
fn patch_minor6_stream_archive() {
    let mut image = v6_image(0);
    image.extend_from_slice(b"rzip stream payload");
    let file = write_archive(&image);

    let mut handle = open_rw(&file);
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.stored_size, Some(0));
    assert_eq!(header.md5_at_eof, Some(false));

    let written = patch_size(&mut handle, &header, 1_000_000, false).unwrap();
    assert_eq!(written, [0x40, 0x42, 0x0F, 0x00, 0x00, 0x00, 0x00, 0x00]);
    drop(handle);

    let patched = std::fs::read(file.path()).unwrap();
    assert_eq!(&patched[6..14], &written);
    assert_eq!(&patched[..6], &image[..6]);
    assert_eq!(&patched[14..], &image[14..]);

    // Patch-then-decode reads the new size back.
    let mut handle = File::open(file.path()).unwrap();
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.stored_size, Some(1_000_000));
}

#[test]
fn patch_rejects_encrypted_archive() {
    let mut image = base_image(10, 20);
    image[6..14].copy_from_slice(&[9, 4, 0x10, 0x20, 0x30, 0x40, 0x50, 0x60]);
    image[17] = 1; // AES128
    image.extend_from_slice(b"ciphertext");
    let file = write_archive(&image);

    let mut handle = open_rw(&file);
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.encryption, EncryptionMode::Aes128);
    assert_eq!(header.stored_size, None);
    assert_eq!(header.salt.unwrap().loops, [9, 4]);

    let err = patch_size(&mut handle, &header, 12345, true).unwrap_err();
    assert!(matches!(err, MagicError::Encrypted));
    drop(handle);
    assert_eq!(std::fs::read(file.path()).unwrap(), image);
}

#[test]
fn patch_rejects_same_size_even_with_force() {
    let mut image = v9_image(42);
    image.extend_from_slice(b"payload");
    let file = write_archive(&image);

    let mut handle = open_rw(&file);
    let header = MagicHeader::read_from(&mut handle).unwrap();
    let err = patch_size(&mut handle, &header, 42, true).unwrap_err();
    assert!(matches!(err, MagicError::AlreadySet(42)));
    drop(handle);
    assert_eq!(std::fs::read(file.path()).unwrap(), image);
}

#[test]
fn patch_protects_existing_size_without_force() {
    let mut image = v9_image(7);
    image.extend_from_slice(b"payload");
    let file = write_archive(&image);

    let mut handle = open_rw(&file);
    let header = MagicHeader::read_from(&mut handle).unwrap();
    let err = patch_size(&mut handle, &header, 9, false).unwrap_err();
    assert!(matches!(err, MagicError::SizeProtected(7)));
    drop(handle);
    assert_eq!(std::fs::read(file.path()).unwrap(), image);

    // With force, exactly bytes 6-13 change.
    let mut handle = open_rw(&file);
    let header = MagicHeader::read_from(&mut handle).unwrap();
    patch_size(&mut handle, &header, 9, true).unwrap();
    drop(handle);
    let patched = std::fs::read(file.path()).unwrap();
    assert_eq!(&patched[6..14], &9u64.to_le_bytes());
    assert_eq!(&patched[..6], &image[..6]);
    assert_eq!(&patched[14..], &image[14..]);
}

// ── decode scenarios ─────────────────────────────────────────────────────────

#[test]
fn rejects_non_archive_file() {
    let file = write_archive(b"definitely not an lrzip archive");
    let mut handle = File::open(file.path()).unwrap();
    let err = MagicHeader::read_from(&mut handle).unwrap_err();
    assert!(matches!(err, MagicError::NotAnArchive));
}

#[test]
fn rejects_truncated_header() {
    let file = write_archive(b"LRZI\x00\x0b\x01\x02\x03\x04\x05");
    let mut handle = File::open(file.path()).unwrap();
    let err = MagicHeader::read_from(&mut handle).unwrap_err();
    assert!(matches!(err, MagicError::Truncated { needed: 21, got: 11 }));
}

#[test]
fn decodes_v11_zstd_archive() {
    let mut image = base_image(11, 21);
    image[6..14].copy_from_slice(&500u64.to_le_bytes());
    image[14] = 5; // SHA-512
    image[17] = 0b0010_0100; // method 4 = ZSTD, strategy 2
    image[18] = 19;
    image[19] = 0x79;
    let file = write_archive(&image);

    let mut handle = File::open(file.path()).unwrap();
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.hash, Some(HashAlgorithm::Sha512));
    assert_eq!(header.compression, CompressionInfo::Zstd { strategy: 2, level: 19 });
    assert_eq!(header.levels, Some(Levels { rzip: 7, lrzip: 9 }));
}

#[test]
fn reads_comment_tail_from_file() {
    let mut image = v9_image(0);
    image[19] = 5;
    image.extend_from_slice(b"hello");
    image.extend_from_slice(b"payload after the comment");
    let file = write_archive(&image);

    let mut handle = File::open(file.path()).unwrap();
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.comment.as_deref(), Some("hello"));
    // The comment consumed exactly its declared length.
    let mut rest = Vec::new();
    handle.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"payload after the comment");
}

#[test]
fn unknown_codes_decode_forward_tolerantly() {
    let mut image = base_image(11, 21);
    image[14] = 99; // future hash
    image[16] = 5; // future encryption mode
    image[17] = 6; // future method
    let file = write_archive(&image);

    let mut handle = File::open(file.path()).unwrap();
    let header = MagicHeader::read_from(&mut handle).unwrap();
    assert_eq!(header.hash, Some(HashAlgorithm::Unknown(99)));
    assert_eq!(header.encryption, EncryptionMode::Unknown(5));
    assert!(header.is_encrypted());
    assert_eq!(header.compression, CompressionInfo::Unknown { method: 6, props: 0 });
}

// ── round-trip property ──────────────────────────────────────────────────────

/// Decoding and re-encoding the fixed header preserves every byte the codec
/// models, across all layout revisions.
#[test]
fn fixed_fields_reencode_losslessly() {
    let mut v7 = base_image(7, 24);
    v7[6..14].copy_from_slice(&77u64.to_le_bytes());
    v7[16] = 1; // x86 filter
    v7[17..22].copy_from_slice(&[93, 0x00, 0x00, 0x80, 0x00]);
    v7[22] = 1; // MD5 at EOF

    let mut v8 = base_image(8, 18);
    v8[6..14].copy_from_slice(&88u64.to_le_bytes());
    v8[14] = 0b1011_0100; // ZPAQ level 3, block size 4
    v8[15] = (5 << 3) | 7; // delta, offset 6
    v8[16] = 1; // MD5

    let mut v9 = v9_image(99);
    v9[15] = 3; // ARM Thumb
    v9[18] = 0x79;
    v9[19] = 5; // declared comment length

    let mut v10 = base_image(10, 20);
    v10[6..14].copy_from_slice(&[2, 3, 0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6]);
    v10[14] = 0b0100_0011; // BZIP3 block size code 3
    v10[17] = 2; // AES256

    let mut v11 = base_image(11, 21);
    v11[6..14].copy_from_slice(&111u64.to_le_bytes());
    v11[14] = 3;
    v11[15] = (4 << 3) | 7; // delta, offset 5
    v11[17] = 0b0011_0100; // ZSTD strategy 3
    v11[18] = 22;
    v11[19] = 0x45;

    let mut v12 = base_image(12, 21);
    v12[6..14].copy_from_slice(&121u64.to_le_bytes());
    v12[14] = 7; // SHA3-512
    v12[15] = 7; // ARM64 under v12 rules
    v12[17] = 1; // LZMA
    v12[18] = 12;
    v12[19] = 0x11;

    for image in [v6_image(66), v7, v8, v9, v10, v11, v12] {
        let raw = RawHeader::from_bytes(&image).unwrap();
        let mut header = MagicHeader::decode(&raw).unwrap();
        if let Some(declared) = raw.comment_len() {
            // Fabricate a comment of the declared length so the length byte
            // re-encodes; the tail itself is outside the fixed header.
            if declared > 0 {
                header.comment = Some("x".repeat(declared));
            }
        }
        assert_eq!(header.to_bytes(), image, "round-trip failed for minor {}", image[5]);
    }
}

#[test]
fn legacy_delta_quirk_branch_reports_unspecified_offset() {
    let mut image = v9_image(0);
    image[15] = (20 << 3) | 7; // delta code above 16
    let raw = RawHeader::from_bytes(&image).unwrap();
    let header = MagicHeader::decode(&raw).unwrap();
    assert_eq!(header.filter, FilterKind::Delta { offset: None });
}
