//! Payload codec for coinmeta.
//!
//! A spend carries its payload as a serialized program: a binary tree of
//! atoms (byte strings) and pairs. Metadata lives in that tree as a list of
//! `(key . value)` pairs. This crate converts between the wire bytes, the
//! [`Program`] tree, and the ordered [`MetadataNode`] map.
//!
//! # Type inference
//!
//! Atoms carry no type. Decoding reads a value as UTF-8 text when it can and
//! otherwise as a big-endian unsigned integer rendered in decimal. Integer
//! values therefore never look like identifiers and are never expanded.

pub mod error;
pub mod metadata;
pub mod program;
pub mod serialized;

pub use error::{CodecError, CodecResult};
pub use metadata::{
    decode_metadata, encode_metadata, solution_metadata, MetadataNode, MetadataValue,
};
pub use program::Program;
pub use serialized::SerializedProgram;
