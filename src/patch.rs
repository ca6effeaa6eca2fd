//! In-place size patching — the one mutating operation of the tool.
//!
//! The guards run in order and the first match wins; nothing is written
//! unless every guard passes. The overwrite itself touches exactly the
//! 8 size bytes at offset 6, so the handle must be opened read+update
//! (never truncate or append).

use std::io::{Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::MagicError;
use crate::header::MagicHeader;
use crate::layout::{SIZE_LEN, SIZE_OFFSET};

/// Store `new_size` in the header's size field.
///
/// Rejected when the archive is encrypted, when `new_size` is already
/// stored (even with `force`), or when a different nonzero size is stored
/// and `force` is not set. On success returns the 8 bytes as written.
pub fn patch_size<W: Write + Seek>(
    file: &mut W,
    header: &MagicHeader,
    new_size: u64,
    force: bool,
) -> Result<[u8; SIZE_LEN], MagicError> {
    if header.is_encrypted() {
        return Err(MagicError::Encrypted);
    }
    match header.stored_size {
        Some(stored) if stored == new_size => return Err(MagicError::AlreadySet(stored)),
        Some(stored) if stored != 0 && !force => return Err(MagicError::SizeProtected(stored)),
        _ => {}
    }

    file.seek(SeekFrom::Start(SIZE_OFFSET))?;
    file.write_u64::<LittleEndian>(new_size)?;
    file.flush()?;
    Ok(new_size.to_le_bytes())
}
