//! Recursive metadata resolution for coinmeta.
//!
//! Metadata documents are scattered across the ledger: the latest spend of a
//! record under some puzzle hash carries a key/value payload, and any value
//! in it that parses as an identifier may point at another such record.
//! [`Resolver`] starts from a root identifier and stitches those payloads
//! back into one nested [`MetadataNode`](coinmeta_codec::MetadataNode).
//!
//! # Guarantees
//!
//! - Each identifier is entered at most once per [`TraversalContext`], so
//!   cyclic and shared references terminate and are fetched once.
//! - Failures are contained per identifier: an unreachable, undecodable or
//!   absent child leaves its original string in place and never disturbs
//!   its siblings.
//! - Recursion depth is bounded by [`ResolverConfig::max_depth`].

pub mod context;
pub mod error;
pub mod resolver;

pub use context::{ResolveStats, TraversalContext};
pub use error::{ResolveError, ResolveResult};
pub use resolver::{
    parse_child_identifier, select_authoritative, Resolver, ResolverConfig, MAX_DEPTH_CEILING,
};
