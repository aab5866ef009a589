//! Read and write access to the voting contract.
use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{AccountAddress, Candidate, CandidateId, Election, ElectionDraft, ElectionId};

/// Hash of a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub [u8; 32]);

impl Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl FromStr for TxHash {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(TxHash(bytes))
    }
}

/// Outcome of waiting for a transaction to be included in a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confirmation {
    /// The transaction was included and executed successfully.
    Succeeded,
    /// The transaction was included but reverted.
    Reverted,
}

/// The read side of the voting contract.
#[async_trait]
pub trait ContractReader: Send + Sync + 'static {
    /// The error type for fallible methods.
    type Error: Debug + Display + Send + Sync;

    /// Identifiers of the elections created by `organizer`, in contract order.
    async fn organizer_elections(
        &self,
        organizer: AccountAddress,
    ) -> Result<Vec<ElectionId>, Self::Error>;

    /// Identifiers of the elections `voter` is whitelisted for, in contract order.
    async fn voter_elections(&self, voter: AccountAddress) -> Result<Vec<ElectionId>, Self::Error>;

    /// The detail record of one election.
    async fn election(&self, id: ElectionId) -> Result<Election, Self::Error>;

    /// The candidates of one election, with their current vote counts.
    async fn candidates(&self, id: ElectionId) -> Result<Vec<Candidate>, Self::Error>;

    /// The active elections with the most votes, as ranked by the contract.
    async fn top_voted_active_elections(&self) -> Result<Vec<Election>, Self::Error>;

    /// Fetches many detail records at once.
    ///
    /// The outer `Result` reports a failure of the batch as a whole; the inner
    /// results report each record individually, in the order of `ids`. The
    /// default implementation issues the single reads concurrently.
    async fn elections(
        &self,
        ids: &[ElectionId],
    ) -> Result<Vec<Result<Election, Self::Error>>, Self::Error> {
        let reads = ids.iter().map(|id| self.election(*id));
        Ok(futures::future::join_all(reads).await)
    }
}

/// The write side of the voting contract.
///
/// Submitting returns as soon as the transaction has been accepted by the
/// node; [`ContractWriter::wait_for_confirmation`] resolves once it has been
/// included in a block.
#[async_trait]
pub trait ContractWriter: Send + Sync + 'static {
    /// The error type for fallible methods.
    type Error: Debug + Display + Send + Sync;

    /// Submits an election-creation transaction.
    async fn create_election(&self, draft: &ElectionDraft) -> Result<TxHash, Self::Error>;

    /// Submits a vote for `candidate` in `election`.
    async fn cast_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<TxHash, Self::Error>;

    /// Waits until `tx_hash` is included and reports whether it succeeded.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, Self::Error>;
}
