#![doc = include_str!("../README.md")]

pub mod error;
mod store;
mod types;

pub use error::{ConfigError, Result};
pub use store::{CONFIG_FILE_NAME, ConfigStore};
pub use types::{Config, ConnectionRetry, RootConfig};
