#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

mod contract;
mod service;

pub use contract::TrustVoteContract;
pub use service::*;

use thiserror::Error;

/// Errors returned by the EVM adapter.
#[derive(Debug, Error)]
pub enum EvmAdapterError {
    /// The bundled ABI could not be parsed.
    #[error("invalid contract ABI: {0}")]
    Abi(#[from] serde_json::Error),
    /// Encoding call data or decoding a return value failed.
    #[error("ABI codec error in `{function}`: {source}")]
    Codec {
        /// Contract function being encoded or decoded.
        function: String,
        /// Underlying ABI error.
        #[source]
        source: ethers_core::abi::Error,
    },
    /// The contract returned a value of an unexpected shape.
    #[error("unexpected return value from `{function}`: {reason}")]
    UnexpectedOutput {
        /// Contract function whose output was decoded.
        function: String,
        /// What did not match.
        reason: String,
    },
    /// The node or the wallet reported an error.
    #[error("middleware error: {0}")]
    Middleware(String),
    /// The transaction disappeared from the mempool before it was included.
    #[error("transaction {0} was dropped before inclusion")]
    Dropped(String),
}
