#![doc = include_str!("../README.md")]

pub mod branches;
pub mod builds;
pub mod ci;
mod client;
pub mod error;
pub mod info;
pub mod projects;
pub mod promotions;
pub mod properties;
mod refs;
mod run_info;
pub mod transport;
pub mod validation_stamps;
pub mod validations;

#[cfg(test)]
mod testing;

pub use client::{Client, Payload};
pub use error::{ClientError, ErrorList, GraphError, Result, check_data_errors};
pub use refs::{BranchRef, BuildRef, Id, normalize_branch_name};
pub use run_info::RunInfo;
pub use transport::{HttpTransport, Transport};
