#![doc = include_str!("../README.md")]

mod env;
pub mod error;
mod expand;
mod junit;

pub use env::{EnvSources, collect_env, parse_env_assignment, read_env_file};
pub use error::{CiError, Result};
pub use expand::{expand_config, expand_config_from};
pub use junit::{TestSummary, read_report, summarize_junit};
