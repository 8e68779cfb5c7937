/// Errors from record store operations.
///
/// Every variant is a transport-level failure from the resolver's point of
/// view. Absence is never an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The node answered with `success: false` or a non-200 status.
    #[error("RPC {endpoint} failed: {message}")]
    Rpc { endpoint: String, message: String },

    /// The node answered with a body we could not interpret.
    #[error("invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// The store is unreachable (connection refused, injected failure, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
