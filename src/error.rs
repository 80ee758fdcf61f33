use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum EmuError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read trace file '{}': {source}", path.display())]
    TraceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Usage: {0}")]
    Usage(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for EmuError {
    fn from(err: toml::de::Error) -> Self {
        EmuError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EmuError>;
