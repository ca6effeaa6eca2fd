//! Error taxonomy for header inspection and patching.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MagicError {
    /// Bytes 0-3 are not the `LRZI` signature.
    #[error("Not an lrzip archive (bad magic signature)")]
    NotAnArchive,
    /// The file ended before the resolved header length.
    #[error("Truncated header: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },
    /// Encrypted archives keep key-derivation bytes where the size field
    /// would be, so there is nothing to patch.
    #[error("File is encrypted — the size field holds key material and cannot be patched")]
    Encrypted,
    #[error("Size {0} is already stored in the header")]
    AlreadySet(u64),
    #[error("A nonzero size {0} is already stored — use force to overwrite")]
    SizeProtected(u64),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
