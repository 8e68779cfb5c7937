use coinmeta_codec::CodecError;
use coinmeta_store::StoreError;
use coinmeta_types::{Identifier, TypeError};
use thiserror::Error;

/// Why an identifier did not resolve.
///
/// Below the root every variant degrades to "absent" for that branch. At the
/// root only [`ResolveError::Transport`] and
/// [`ResolveError::MalformedIdentifier`] reach the caller.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No record, no spent record, or no payload at this identifier.
    #[error("nothing to resolve at {0}")]
    NotFound(Identifier),

    /// Already entered during this traversal.
    #[error("{0} already visited")]
    AlreadyVisited(Identifier),

    #[error("{id} is deeper than the limit of {limit}")]
    DepthExceeded { id: Identifier, limit: usize },

    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] TypeError),

    /// The record store could not answer.
    #[error("record store failed for {id}: {source}")]
    Transport { id: Identifier, source: StoreError },

    /// The spend payload is not a metadata list.
    #[error("payload of {id} did not decode: {source}")]
    Decode { id: Identifier, source: CodecError },
}

/// Result alias for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;
