#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod contract;
mod storage;

pub use contract::*;
pub use storage::*;

use thiserror::Error;
use trustvote_interface::services::contract::TxHash;
use trustvote_interface::ElectionId;

/// Errors returned by the mock adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockError {
    /// Simulated network or node failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Simulated wallet rejection of a submission.
    #[error("submission rejected: {0}")]
    Rejected(String),
    /// The election does not exist or its read was made to fail.
    #[error("failed to read election {0}")]
    ElectionRead(ElectionId),
    /// No transaction with this hash was submitted.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxHash),
    /// The upload of this file was made to fail.
    #[error("failed to upload {0}")]
    Upload(String),
    /// The content address cannot be resolved.
    #[error("cannot resolve content address {0:?}")]
    Resolve(String),
}
