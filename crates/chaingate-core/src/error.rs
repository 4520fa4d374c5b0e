//! Error types for `ChainGate` core library.

use thiserror::Error;

/// Result type alias using `ChainGate` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `ChainGate` operations.
///
/// ABI failures have their own [`AbiError`](crate::abi::AbiError) so the
/// registry client can classify them without going through this type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (unreadable file, bad value, failed validation)
    #[error("Configuration error: {0}")]
    Config(String),
}
