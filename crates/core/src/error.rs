/// Error taxonomy shared by the relay and the API.
///
/// Delivery failures to a single connection are not represented here; they
/// live next to the transport seam and never leave the relay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Connection already registered: {0}")]
    DuplicateConnection(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience alias for fallible core operations.
pub type CoreResult<T> = Result<T, CoreError>;
