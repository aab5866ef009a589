use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sha2::Digest;
use tokio::sync::RwLock;
use trustvote_interface::services::contract::{
    Confirmation, ContractReader, ContractWriter, TxHash,
};
use trustvote_interface::{
    AccountAddress, Candidate, CandidateId, Clock, Election, ElectionDraft, ElectionId,
    ElectionStatus,
};

use crate::MockError;

/// How many elections `top_voted_active_elections` returns.
pub const TOP_VOTED_LIMIT: usize = 3;

#[derive(Debug, Clone)]
struct StoredElection {
    election: Election,
    candidates: Vec<Candidate>,
    whitelist: HashSet<AccountAddress>,
    // Kept in insertion order so voter enumeration is stable.
    whitelist_order: Vec<AccountAddress>,
    voted: HashSet<AccountAddress>,
}

#[derive(Debug, Default)]
struct ContractState {
    elections: Vec<StoredElection>,
    receipts: HashMap<TxHash, Confirmation>,
    nonce: u64,
}

impl ContractState {
    fn next_tx_hash(&mut self, sender: &AccountAddress) -> TxHash {
        self.nonce += 1;
        let mut hasher = sha2::Sha256::new();
        hasher.update(sender.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        TxHash(hasher.finalize().into())
    }

    fn find_mut(&mut self, id: ElectionId) -> Option<&mut StoredElection> {
        self.elections.iter_mut().find(|e| e.election.id == id)
    }
}

#[derive(Debug, Default)]
struct FailurePlan {
    transport_down: bool,
    failing_reads: HashSet<ElectionId>,
    reject_submissions: Option<String>,
    revert_confirmations: bool,
    batch_down: bool,
}

/// In-memory stand-in for the deployed voting contract.
///
/// Clones share state. Use [`MockTrustVote::with_sender`] to act as a
/// different account against the same contract.
#[derive(Clone)]
pub struct MockTrustVote {
    sender: AccountAddress,
    clock: Arc<dyn Clock>,
    state: Arc<RwLock<ContractState>>,
    failures: Arc<Mutex<FailurePlan>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
}

impl MockTrustVote {
    /// Creates an empty contract whose transactions are sent by `sender`.
    pub fn new(sender: AccountAddress, clock: impl Clock) -> Self {
        Self {
            sender,
            clock: Arc::new(clock),
            state: Arc::new(RwLock::new(ContractState::default())),
            failures: Arc::new(Mutex::new(FailurePlan::default())),
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A handle to the same contract that signs as `sender`.
    pub fn with_sender(&self, sender: AccountAddress) -> Self {
        Self {
            sender,
            ..self.clone()
        }
    }

    /// The account this handle submits transactions as.
    pub fn sender(&self) -> AccountAddress {
        self.sender
    }

    /// Makes every call fail with a transport error until reset.
    pub fn set_transport_down(&self, down: bool) {
        self.plan().transport_down = down;
    }

    /// Makes detail reads of `id` fail.
    pub fn fail_election_read(&self, id: ElectionId) {
        self.plan().failing_reads.insert(id);
    }

    /// Makes batched detail reads fail as a whole while single reads keep working.
    pub fn fail_batch_reads(&self, fail: bool) {
        self.plan().batch_down = fail;
    }

    /// Makes every submission fail as if the wallet rejected it.
    pub fn reject_submissions(&self, reason: Option<&str>) {
        self.plan().reject_submissions = reason.map(str::to_owned);
    }

    /// Makes every confirmation report a revert.
    pub fn revert_confirmations(&self, revert: bool) {
        self.plan().revert_confirmations = revert;
    }

    /// Number of read calls served so far, across all handles.
    pub fn read_calls(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of write calls (submissions) received so far, across all handles.
    pub fn write_calls(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Whitelisted addresses of an election, in creation order.
    pub async fn whitelist(&self, id: ElectionId) -> Option<Vec<AccountAddress>> {
        let state = self.state.read().await;
        state
            .elections
            .iter()
            .find(|e| e.election.id == id)
            .map(|e| e.whitelist_order.clone())
    }

    fn plan(&self) -> std::sync::MutexGuard<'_, FailurePlan> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_transport(&self) -> Result<(), MockError> {
        if self.plan().transport_down {
            return Err(MockError::Transport("node unreachable".to_string()));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<(), MockError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_transport()
    }

    fn begin_write(&self) -> Result<(), MockError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_transport()?;
        if let Some(reason) = self.plan().reject_submissions.clone() {
            return Err(MockError::Rejected(reason));
        }
        Ok(())
    }

    fn apply_create(&self, state: &mut ContractState, draft: &ElectionDraft) -> Confirmation {
        let valid = !draft.title.trim().is_empty()
            && !draft.description.trim().is_empty()
            && draft.start < draft.end
            && (2..=3).contains(&draft.candidates.len())
            && !draft.whitelist.is_empty();
        if !valid {
            tracing::debug!("Reverting invalid createElection");
            return Confirmation::Reverted;
        }

        let id = ElectionId(state.elections.len() as u64 + 1);
        let candidates = draft
            .candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| Candidate {
                id: CandidateId(idx as u64 + 1),
                name: c.name.clone(),
                photo: c.photo.clone(),
                votes: 0,
            })
            .collect();
        let mut whitelist = HashSet::new();
        let whitelist_order = draft
            .whitelist
            .iter()
            .copied()
            .filter(|addr| whitelist.insert(*addr))
            .collect::<Vec<_>>();

        state.elections.push(StoredElection {
            election: Election {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                start: draft.start,
                end: draft.end,
                organizer: self.sender,
                total_voters: whitelist_order.len() as u64,
                total_voted: 0,
            },
            candidates,
            whitelist,
            whitelist_order,
            voted: HashSet::new(),
        });
        tracing::debug!(election_id = %id, "Created election");
        Confirmation::Succeeded
    }

    fn apply_vote(
        &self,
        state: &mut ContractState,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Confirmation {
        let now = self.clock.now();
        let sender = self.sender;
        let Some(stored) = state.find_mut(election) else {
            return Confirmation::Reverted;
        };
        if stored.election.status(now) != ElectionStatus::Active
            || !stored.whitelist.contains(&sender)
            || stored.voted.contains(&sender)
        {
            return Confirmation::Reverted;
        }
        let Some(target) = stored.candidates.iter_mut().find(|c| c.id == candidate) else {
            return Confirmation::Reverted;
        };
        target.votes += 1;
        stored.voted.insert(sender);
        stored.election.total_voted += 1;
        Confirmation::Succeeded
    }
}

#[async_trait]
impl ContractReader for MockTrustVote {
    type Error = MockError;

    async fn organizer_elections(
        &self,
        organizer: AccountAddress,
    ) -> Result<Vec<ElectionId>, Self::Error> {
        self.begin_read()?;
        let state = self.state.read().await;
        Ok(state
            .elections
            .iter()
            .filter(|e| e.election.organizer == organizer)
            .map(|e| e.election.id)
            .collect())
    }

    async fn voter_elections(&self, voter: AccountAddress) -> Result<Vec<ElectionId>, Self::Error> {
        self.begin_read()?;
        let state = self.state.read().await;
        Ok(state
            .elections
            .iter()
            .filter(|e| e.whitelist.contains(&voter))
            .map(|e| e.election.id)
            .collect())
    }

    async fn election(&self, id: ElectionId) -> Result<Election, Self::Error> {
        self.begin_read()?;
        if self.plan().failing_reads.contains(&id) {
            return Err(MockError::ElectionRead(id));
        }
        let state = self.state.read().await;
        state
            .elections
            .iter()
            .find(|e| e.election.id == id)
            .map(|e| e.election.clone())
            .ok_or(MockError::ElectionRead(id))
    }

    async fn candidates(&self, id: ElectionId) -> Result<Vec<Candidate>, Self::Error> {
        self.begin_read()?;
        let state = self.state.read().await;
        state
            .elections
            .iter()
            .find(|e| e.election.id == id)
            .map(|e| e.candidates.clone())
            .ok_or(MockError::ElectionRead(id))
    }

    async fn top_voted_active_elections(&self) -> Result<Vec<Election>, Self::Error> {
        self.begin_read()?;
        let now = self.clock.now();
        let state = self.state.read().await;
        let mut active: Vec<Election> = state
            .elections
            .iter()
            .filter(|e| e.election.status(now) == ElectionStatus::Active)
            .map(|e| e.election.clone())
            .collect();
        // Stable sort keeps creation order between ties.
        active.sort_by(|a, b| b.total_voted.cmp(&a.total_voted));
        active.truncate(TOP_VOTED_LIMIT);
        Ok(active)
    }

    async fn elections(
        &self,
        ids: &[ElectionId],
    ) -> Result<Vec<Result<Election, Self::Error>>, Self::Error> {
        // The batch itself goes over the same transport as the single reads.
        self.check_transport()?;
        if self.plan().batch_down {
            return Err(MockError::Transport("batch request failed".to_string()));
        }
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            out.push(self.election(*id).await);
        }
        Ok(out)
    }
}

#[async_trait]
impl ContractWriter for MockTrustVote {
    type Error = MockError;

    async fn create_election(&self, draft: &ElectionDraft) -> Result<TxHash, Self::Error> {
        self.begin_write()?;
        let mut state = self.state.write().await;
        let tx_hash = state.next_tx_hash(&self.sender);
        let outcome = self.apply_create(&mut state, draft);
        state.receipts.insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn cast_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<TxHash, Self::Error> {
        self.begin_write()?;
        let mut state = self.state.write().await;
        let tx_hash = state.next_tx_hash(&self.sender);
        let outcome = self.apply_vote(&mut state, election, candidate);
        state.receipts.insert(tx_hash, outcome);
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, Self::Error> {
        self.check_transport()?;
        if self.plan().revert_confirmations {
            return Ok(Confirmation::Reverted);
        }
        let state = self.state.read().await;
        state
            .receipts
            .get(&tx_hash)
            .copied()
            .ok_or(MockError::UnknownTransaction(tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use trustvote_interface::{CandidateDraft, ContentId, ManualClock, Timestamp};

    use super::*;

    fn addr(byte: u8) -> AccountAddress {
        AccountAddress::new([byte; 20])
    }

    fn draft(start: u64, end: u64, whitelist: Vec<AccountAddress>) -> ElectionDraft {
        ElectionDraft {
            title: "Board".to_string(),
            description: "Yearly board election".to_string(),
            start: Timestamp::from_secs(start),
            end: Timestamp::from_secs(end),
            whitelist,
            candidates: vec![
                CandidateDraft {
                    name: "Ada".to_string(),
                    photo: ContentId("cid-a".to_string()),
                },
                CandidateDraft {
                    name: "Grace".to_string(),
                    photo: ContentId("cid-b".to_string()),
                },
            ],
        }
    }

    #[tokio::test]
    async fn create_then_read_back() {
        let clock = ManualClock::new(Timestamp::from_secs(100));
        let contract = MockTrustVote::new(addr(1), clock);
        let tx = contract
            .create_election(&draft(50, 200, vec![addr(2), addr(3)]))
            .await
            .unwrap();
        assert_eq!(
            contract.wait_for_confirmation(tx).await.unwrap(),
            Confirmation::Succeeded
        );

        let ids = contract.organizer_elections(addr(1)).await.unwrap();
        assert_eq!(ids, vec![ElectionId(1)]);
        let election = contract.election(ElectionId(1)).await.unwrap();
        assert_eq!(election.total_voters, 2);
        assert_eq!(election.organizer, addr(1));
        assert_eq!(
            contract.voter_elections(addr(3)).await.unwrap(),
            vec![ElectionId(1)]
        );
        assert!(contract.voter_elections(addr(9)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn votes_are_counted_once_per_whitelisted_account() {
        let clock = ManualClock::new(Timestamp::from_secs(100));
        let organizer = MockTrustVote::new(addr(1), clock.clone());
        organizer
            .create_election(&draft(50, 200, vec![addr(2)]))
            .await
            .unwrap();

        let voter = organizer.with_sender(addr(2));
        let tx = voter.cast_vote(ElectionId(1), CandidateId(2)).await.unwrap();
        assert_eq!(
            voter.wait_for_confirmation(tx).await.unwrap(),
            Confirmation::Succeeded
        );
        let again = voter.cast_vote(ElectionId(1), CandidateId(1)).await.unwrap();
        assert_eq!(
            voter.wait_for_confirmation(again).await.unwrap(),
            Confirmation::Reverted
        );

        let stranger = organizer.with_sender(addr(7));
        let tx = stranger.cast_vote(ElectionId(1), CandidateId(1)).await.unwrap();
        assert_eq!(
            stranger.wait_for_confirmation(tx).await.unwrap(),
            Confirmation::Reverted
        );

        let candidates = organizer.candidates(ElectionId(1)).await.unwrap();
        assert_eq!(candidates[0].votes, 0);
        assert_eq!(candidates[1].votes, 1);
        assert_eq!(
            organizer.election(ElectionId(1)).await.unwrap().total_voted,
            1
        );
    }

    #[tokio::test]
    async fn votes_outside_the_window_revert() {
        let clock = ManualClock::new(Timestamp::from_secs(300));
        let contract = MockTrustVote::new(addr(1), clock);
        contract
            .create_election(&draft(50, 200, vec![addr(1)]))
            .await
            .unwrap();
        let tx = contract
            .cast_vote(ElectionId(1), CandidateId(1))
            .await
            .unwrap();
        assert_eq!(
            contract.wait_for_confirmation(tx).await.unwrap(),
            Confirmation::Reverted
        );
    }

    #[tokio::test]
    async fn injected_failures() {
        let clock = ManualClock::new(Timestamp::from_secs(100));
        let contract = MockTrustVote::new(addr(1), clock);
        contract
            .create_election(&draft(50, 200, vec![addr(2)]))
            .await
            .unwrap();

        contract.fail_election_read(ElectionId(1));
        assert_eq!(
            contract.election(ElectionId(1)).await,
            Err(MockError::ElectionRead(ElectionId(1)))
        );

        contract.reject_submissions(Some("user denied"));
        assert!(matches!(
            contract.create_election(&draft(50, 200, vec![addr(2)])).await,
            Err(MockError::Rejected(_))
        ));
        contract.reject_submissions(None);

        contract.fail_batch_reads(true);
        assert!(matches!(
            contract.elections(&[ElectionId(1)]).await,
            Err(MockError::Transport(_))
        ));
        contract.fail_batch_reads(false);

        contract.set_transport_down(true);
        assert!(matches!(
            contract.elections(&[ElectionId(1)]).await,
            Err(MockError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn top_voted_ranks_active_elections() {
        let clock = ManualClock::new(Timestamp::from_secs(100));
        let contract = MockTrustVote::new(addr(1), clock);
        for _ in 0..2 {
            contract
                .create_election(&draft(50, 200, vec![addr(2), addr(3)]))
                .await
                .unwrap();
        }
        // Already finished.
        contract
            .create_election(&draft(10, 20, vec![addr(2)]))
            .await
            .unwrap();

        for voter in [addr(2), addr(3)] {
            contract
                .with_sender(voter)
                .cast_vote(ElectionId(2), CandidateId(1))
                .await
                .unwrap();
        }

        let top = contract.top_voted_active_elections().await.unwrap();
        let ids: Vec<_> = top.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![ElectionId(2), ElectionId(1)]);
    }
}
