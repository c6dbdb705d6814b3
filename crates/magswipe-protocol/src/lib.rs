//! Track data decoding for magnetic-stripe swipes.
//!
//! The reader driver hands over the raw characters it decoded from a swipe.
//! [`TrackParser`] turns them into a [`CardRecord`] or rejects them with a
//! [`DecodeError`]; it holds no state and never panics on malformed input.

pub mod parser;
pub mod record;

pub use parser::{DecodeError, TrackParser};
pub use record::CardRecord;
