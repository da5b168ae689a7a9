use thiserror::Error;

/// Chyby konfigurace. Vznikají vždy dřív, než se sáhne na jakoukoliv paměť.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("size must be specified")]
    SizeMissing,

    #[error("invalid memory size format: {0}")]
    InvalidSize(String),

    #[error("please provide a positive value for memory to consume")]
    NonPositiveSize,

    #[error("memory size is too large for this platform: {0}")]
    SizeTooLarge(String),

    #[error("wait time must be non-negative, got {0}")]
    NegativeWait(i64),

    #[error("grow time must be non-negative, got {0}")]
    NegativeGrowTime(i64),
}
