//! Narration lookup, storage, decoding and mixing.

pub mod media;
pub mod mix;
pub mod resolve;
pub mod store;
