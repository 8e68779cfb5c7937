use coinmeta_types::TypeError;
use thiserror::Error;

/// Errors from payload encoding and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input at offset {0}")]
    Truncated(usize),

    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),

    #[error("atom too large: {0} bytes")]
    AtomTooLarge(u64),

    #[error("expected a pair, found an atom")]
    ExpectedPair,

    #[error("list is not nil-terminated")]
    ImproperList,

    #[error("metadata key is not a UTF-8 atom")]
    InvalidKey,

    #[error("metadata nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("invalid integer value: {0}")]
    InvalidInteger(String),

    #[error("invalid hex: {0}")]
    Hex(#[from] TypeError),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
