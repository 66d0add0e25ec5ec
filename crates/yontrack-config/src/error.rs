use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot serialize configuration: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("Home directory not found")]
    NoHomeDirectory,

    #[error("No current configuration")]
    NoSelection,

    #[error("No configuration named {0}")]
    NotFound(String),

    #[error("Configuration with name {0} already exists")]
    AlreadyExists(String),
}
