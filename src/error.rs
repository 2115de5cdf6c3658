//! Error types shared by the loaders, the read index and the configuration layer.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GamlError>;

#[derive(Error, Debug)]
pub enum GamlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record ended early or could not be parsed; everything before `line`
    /// was consumed.
    #[error("truncated input in {source_name} at line {line}: {reason}")]
    TruncatedInput {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("read index error: {0}")]
    Index(String),
}

impl GamlError {
    pub fn truncated<S: Into<String>, R: Into<String>>(source_name: S, line: usize, reason: R) -> Self {
        Self::TruncatedInput {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }
}

impl From<bincode::Error> for GamlError {
    fn from(e: bincode::Error) -> Self {
        Self::Index(e.to_string())
    }
}

impl From<toml::de::Error> for GamlError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}
