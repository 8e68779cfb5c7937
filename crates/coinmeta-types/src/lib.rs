//! Foundation types for coinmeta.
//!
//! Every other coinmeta crate depends on `coinmeta-types`. It holds the pure
//! conversions the resolver needs at its edges: hex and address parsing for
//! identifiers, and the integer encodings used on the wire.
//!
//! # Key Types
//!
//! - [`Identifier`] — fixed 32-byte content address (puzzle hash or coin name)
//! - [`encode_address`] / [`decode_address`] — bech32m human-readable addresses
//! - [`int_to_bytes`] — minimal big-endian two's-complement integer encoding

pub mod address;
pub mod error;
pub mod identifier;
pub mod int;

pub use address::{decode_address, encode_address, DEFAULT_ADDRESS_PREFIX};
pub use error::TypeError;
pub use identifier::{hexstr_to_bytes, Identifier, IDENTIFIER_LEN};
pub use int::{be_bytes_to_decimal, decimal_to_be_bytes, int_to_bytes};
