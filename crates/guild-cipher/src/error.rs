//! Error types for guild encryption.

/// Errors produced while encrypting or decrypting guild messages.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("authentication tag mismatch")]
    TagMismatch,

    #[error("invalid padding")]
    Padding,

    #[error("plaintext is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}
