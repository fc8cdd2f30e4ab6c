//! Client-side decoding of relay response bodies.

pub mod decoder;
pub mod framing;
pub mod sources;
pub mod suggestions;

pub use decoder::{DecodedState, StreamDecoder};
