//! Channel layer: the expect engine and its consume-on-match buffer.

mod buffer;
mod expect;

pub use buffer::ExpectBuffer;
pub use expect::{ExpectEngine, ExpectMatch};
