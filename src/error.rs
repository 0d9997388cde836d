use thiserror::Error;

/// Errors produced while decoding remote framebuffer tiles.
///
/// The enum is `Clone` because fatal errors raised from a hardware completion are kept on
/// the decode context and reported again on every later call until the context is reset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RfbError {
    /// Malformed elementary stream (forbidden bit set, missing start code, truncated unit)
    #[error("parser error: {0}")]
    Parser(String),

    /// Codec level failure (session configuration, chunk submission, inflate)
    #[error("codec error: {0}")]
    Codec(String),

    /// The hardware decode session reported an asynchronous error
    #[error("hardware decoder error: {0}")]
    Hardware(String),

    /// A completion did not match the oldest pending submission
    #[error("decoder desynchronized: {0}")]
    Desync(String),

    /// Wire-level inconsistency in the framebuffer stream
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid caller input
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<flate2::DecompressError> for RfbError {
    fn from(err: flate2::DecompressError) -> Self {
        RfbError::Codec(format!("inflate failed: {}", err))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, RfbError>;
