use thiserror::Error;

/// Errors raised while configuring playout strategies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayoutError {
    #[error("Unknown playout strategy: {0}")]
    UnknownStrategy(String),

    #[error("No playout strategy name given")]
    MissingStrategy,

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Convenience Result type for playout configuration.
pub type Result<T> = std::result::Result<T, PlayoutError>;
