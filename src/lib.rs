pub mod error;
pub mod fields;
pub mod header;
pub mod layout;
pub mod patch;

pub use error::MagicError;
pub use fields::{CompressionInfo, EncryptionMode, FilterKind, HashAlgorithm, Levels, SaltField};
pub use header::{MagicHeader, RawHeader, MAX_COMMENT_LEN};
pub use layout::{HeaderLayout, HeaderVersion};
pub use patch::patch_size;
