use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no private keys configured, set PRIVATE_KEYS or PRIVATE_KEY")]
    NoSigningKeys,

    #[error("private key #{index} is invalid: {reason}")]
    InvalidKey { index: usize, reason: String },

    #[error("invalid amount range: {0}")]
    InvalidAmount(String),

    #[error("invalid daily target: {0}")]
    InvalidTarget(String),

    #[error("invalid fee policy: {0}")]
    InvalidFee(String),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("retry policy needs at least one attempt")]
    ZeroRetryAttempts,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address must have 40 hex digits, got {0}")]
    BadLength(usize),

    #[error("address contains non-hex characters")]
    NotHex,

    #[error("address checksum mismatch")]
    BadChecksum,
}
