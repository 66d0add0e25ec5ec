use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CiError>;

#[derive(Debug, Error)]
pub enum CiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse initial YAML: {0}")]
    ParseInitial(#[source] serde_yaml::Error),

    #[error("failed to read file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML from {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("circular reference to {}", .0.display())]
    Cycle(PathBuf),

    #[error("failed to marshal expanded YAML: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("invalid env format at line {line}: {content} (expected KEY=VALUE)")]
    EnvFormat { line: usize, content: String },

    #[error("empty key at line {0}")]
    EmptyKey(usize),

    #[error("invalid env format: {0} (expected KEY=VALUE)")]
    EnvAssignment(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid JUnit report {}: {message}", path.display())]
    JUnit { path: PathBuf, message: String },
}
