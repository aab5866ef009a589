use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, Eip1559TransactionRequest, H256, U64};
use ethers_providers::{Middleware, PendingTransaction};
use trustvote_interface::services::contract::{
    Confirmation, ContractReader, ContractWriter, TxHash,
};
use trustvote_interface::{
    AccountAddress, Candidate, CandidateId, Election, ElectionDraft, ElectionId,
};

use crate::contract::{GET_ELECTIONS_BY_ORGANIZER, GET_ELECTIONS_BY_VOTER};
use crate::{EvmAdapterError, TrustVoteContract};

/// Blocks to wait for after inclusion before a transaction counts as confirmed.
pub const DEFAULT_CONFIRMATIONS: usize = 1;

/// The TrustVote contract reached through an `ethers` middleware stack.
#[derive(Debug, Clone)]
pub struct EvmTrustVote<M> {
    client: Arc<M>,
    address: Address,
    contract: TrustVoteContract,
    confirmations: usize,
}

impl<M: Middleware + 'static> EvmTrustVote<M> {
    /// Binds the contract deployed at `address`.
    pub fn new(client: Arc<M>, address: AccountAddress) -> Result<Self, EvmAdapterError> {
        Ok(Self {
            client,
            address: Address::from(*address.as_bytes()),
            contract: TrustVoteContract::new()?,
            confirmations: DEFAULT_CONFIRMATIONS,
        })
    }

    /// Sets how many blocks [`ContractWriter::wait_for_confirmation`] waits for.
    pub fn with_confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations.max(1);
        self
    }

    /// Address of the bound contract.
    pub fn contract_address(&self) -> AccountAddress {
        AccountAddress::new(self.address.0)
    }

    fn request(&self, data: Bytes) -> TypedTransaction {
        Eip1559TransactionRequest::new()
            .to(self.address)
            .data(data)
            .into()
    }

    async fn call(&self, data: Bytes) -> Result<Bytes, EvmAdapterError> {
        self.client
            .call(&self.request(data), None)
            .await
            .map_err(|e| EvmAdapterError::Middleware(e.to_string()))
    }

    async fn send(&self, data: Bytes) -> Result<TxHash, EvmAdapterError> {
        let pending = self
            .client
            .send_transaction(self.request(data), None)
            .await
            .map_err(|e| EvmAdapterError::Middleware(e.to_string()))?;
        let tx_hash = TxHash(pending.tx_hash().0);
        tracing::info!(%tx_hash, "Submitted transaction");
        Ok(tx_hash)
    }
}

#[async_trait]
impl<M: Middleware + 'static> ContractReader for EvmTrustVote<M> {
    type Error = EvmAdapterError;

    async fn organizer_elections(
        &self,
        organizer: AccountAddress,
    ) -> Result<Vec<ElectionId>, Self::Error> {
        let data = self.contract.organizer_elections_call_data(&organizer)?;
        let output = self.call(data).await?;
        self.contract
            .decode_election_ids(GET_ELECTIONS_BY_ORGANIZER, &output)
    }

    async fn voter_elections(&self, voter: AccountAddress) -> Result<Vec<ElectionId>, Self::Error> {
        let data = self.contract.voter_elections_call_data(&voter)?;
        let output = self.call(data).await?;
        self.contract
            .decode_election_ids(GET_ELECTIONS_BY_VOTER, &output)
    }

    async fn election(&self, id: ElectionId) -> Result<Election, Self::Error> {
        let data = self.contract.get_election_call_data(id)?;
        let output = self.call(data).await?;
        self.contract.decode_election(&output)
    }

    async fn candidates(&self, id: ElectionId) -> Result<Vec<Candidate>, Self::Error> {
        let data = self.contract.get_candidates_call_data(id)?;
        let output = self.call(data).await?;
        self.contract.decode_candidates(&output)
    }

    async fn top_voted_active_elections(&self) -> Result<Vec<Election>, Self::Error> {
        let data = self.contract.top_voted_call_data()?;
        let output = self.call(data).await?;
        self.contract.decode_top_voted(&output)
    }
}

#[async_trait]
impl<M: Middleware + 'static> ContractWriter for EvmTrustVote<M> {
    type Error = EvmAdapterError;

    async fn create_election(&self, draft: &ElectionDraft) -> Result<TxHash, Self::Error> {
        let data = self.contract.create_election_call_data(draft)?;
        self.send(data).await
    }

    async fn cast_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<TxHash, Self::Error> {
        let data = self.contract.vote_call_data(election, candidate)?;
        self.send(data).await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, Self::Error> {
        let receipt = PendingTransaction::new(H256(tx_hash.0), self.client.provider())
            .confirmations(self.confirmations)
            .await
            .map_err(|e| EvmAdapterError::Middleware(e.to_string()))?
            .ok_or_else(|| EvmAdapterError::Dropped(tx_hash.to_string()))?;

        let confirmation = if receipt.status == Some(U64::from(1)) {
            Confirmation::Succeeded
        } else {
            Confirmation::Reverted
        };
        tracing::info!(%tx_hash, block = ?receipt.block_number, ?confirmation, "Transaction included");
        Ok(confirmation)
    }
}
