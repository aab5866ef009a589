use std::fmt::Display;

use thiserror::Error;
use trustvote_interface::services::contract::TxHash;
use trustvote_interface::ElectionId;

use crate::creation::ValidationError;
use crate::scope::Cancelled;

/// Errors surfaced by the controllers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The creation form failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A photo could not be uploaded, so nothing was submitted.
    #[error("failed to upload {file}: {message}")]
    Upload {
        /// File that failed.
        file: String,
        /// Storage error.
        message: String,
    },
    /// The wallet or the node refused the transaction.
    #[error("failed to submit transaction: {0}")]
    Submission(String),
    /// Waiting for the transaction to be included failed.
    #[error("failed to confirm transaction: {0}")]
    Confirmation(String),
    /// The transaction was included but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    /// Reading contract state failed.
    #[error("failed to read contract state: {0}")]
    Read(String),
    /// The election's voting window has closed.
    #[error("voting for election {0} has ended")]
    VotingClosed(ElectionId),
    /// Another submission from this view is still in flight.
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    /// The view was closed before the operation finished.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl ClientError {
    pub(crate) fn read(err: impl Display) -> Self {
        ClientError::Read(err.to_string())
    }

    pub(crate) fn submission(err: impl Display) -> Self {
        ClientError::Submission(err.to_string())
    }

    pub(crate) fn confirmation(err: impl Display) -> Self {
        ClientError::Confirmation(err.to_string())
    }
}
