//! Dense, non byte-aligned bit packing used by every wire message.

mod buffer;
mod error;

pub use buffer::{BitBuffer, MAX_STRING_BYTES, bits_required};
pub use error::CodecError;
