//! Error types for Anugami

use thiserror::Error;

/// Anugami error type
#[derive(Error, Debug)]
pub enum FollowError {
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Control loop unavailable: {0}")]
    Channel(String),
}

impl From<toml::de::Error> for FollowError {
    fn from(e: toml::de::Error) -> Self {
        FollowError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FollowError>;
