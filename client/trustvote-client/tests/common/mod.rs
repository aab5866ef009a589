#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Semaphore;
use trustvote_client::creation::ElectionForm;
use trustvote_interface::services::contract::{
    Confirmation, ContractReader, ContractWriter, TxHash,
};
use trustvote_interface::services::storage::PhotoFile;
use trustvote_interface::{
    AccountAddress, Candidate, CandidateDraft, CandidateId, ContentId, Election, ElectionDraft,
    ElectionId, ManualClock, Timestamp,
};
use trustvote_mock_adapter::{MockError, MockStorage, MockTrustVote};

pub const NOW: Timestamp = Timestamp::from_secs(1_700_000_000);
pub const HOUR: u64 = 3600;
pub const CONTRACT: AccountAddress = AccountAddress::new([0x5f; 20]);
pub const ORGANIZER: AccountAddress = AccountAddress::new([0x01; 20]);
pub const VOTER: AccountAddress = AccountAddress::new([0x02; 20]);
pub const OUTSIDER: AccountAddress = AccountAddress::new([0x03; 20]);

pub struct TestEnv {
    pub clock: ManualClock,
    pub contract: MockTrustVote,
    pub storage: MockStorage,
}

impl TestEnv {
    pub fn new() -> Self {
        let clock = ManualClock::new(NOW);
        Self {
            contract: MockTrustVote::new(ORGANIZER, clock.clone()),
            clock,
            storage: MockStorage::new(),
        }
    }

    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::new(self.clock.clone())
    }

    /// Creates an election straight on the contract, bypassing the form.
    pub async fn seed_election(
        &self,
        title: &str,
        start: Timestamp,
        end: Timestamp,
        whitelist: Vec<AccountAddress>,
    ) -> ElectionId {
        let draft = ElectionDraft {
            title: title.to_string(),
            description: format!("{title} description"),
            start,
            end,
            whitelist,
            candidates: vec![
                CandidateDraft {
                    name: "Ada".to_string(),
                    photo: ContentId("bafkada".to_string()),
                },
                CandidateDraft {
                    name: "Grace".to_string(),
                    photo: ContentId("bafkgrace".to_string()),
                },
            ],
        };
        let tx_hash = self.contract.create_election(&draft).await.unwrap();
        assert_eq!(
            self.contract.wait_for_confirmation(tx_hash).await.unwrap(),
            Confirmation::Succeeded
        );
        let ids = self.contract.organizer_elections(ORGANIZER).await.unwrap();
        *ids.last().unwrap()
    }
}

pub fn hours_from_now(hours: i64) -> Timestamp {
    let secs = hours.unsigned_abs() * HOUR;
    if hours >= 0 {
        NOW.saturating_add_secs(secs)
    } else {
        NOW.saturating_sub_secs(secs)
    }
}

/// Renders a timestamp the way the date inputs expect it.
pub fn form_date(ts: Timestamp) -> String {
    let time = UNIX_EPOCH + Duration::from_secs(ts.as_secs());
    humantime::format_rfc3339_seconds(time)
        .to_string()
        .trim_end_matches('Z')
        .to_string()
}

/// A complete form with one candidate per name and the given whitelist.
pub fn filled_form(names: &[&str], whitelist: &[AccountAddress]) -> ElectionForm {
    let mut form = ElectionForm::new();
    form.title = "Student council".to_string();
    form.description = "Spring term".to_string();
    form.start = form_date(NOW.saturating_sub_secs(60));
    form.end = form_date(hours_from_now(2));
    while form.candidates().len() < names.len() {
        form.add_candidate().unwrap();
    }
    let ids: Vec<u32> = form.candidates().iter().map(|c| c.local_id).collect();
    for (local_id, name) in ids.into_iter().zip(names) {
        let candidate = form.candidate_mut(local_id).unwrap();
        candidate.name = name.to_string();
        candidate.photo = Some(
            PhotoFile::new(format!("{}.png", name.to_lowercase()), name.as_bytes().to_vec())
                .with_content_type("image/png"),
        );
    }
    form.set_whitelist(whitelist.iter().map(|a| a.to_string()).collect());
    form
}

/// Holds every confirmation until a permit is added.
pub struct GatedWriter {
    pub inner: MockTrustVote,
    pub gate: Arc<Semaphore>,
}

impl GatedWriter {
    pub fn new(inner: MockTrustVote) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
        }
    }
}

#[async_trait]
impl ContractWriter for GatedWriter {
    type Error = MockError;

    async fn create_election(&self, draft: &ElectionDraft) -> Result<TxHash, Self::Error> {
        self.inner.create_election(draft).await
    }

    async fn cast_vote(
        &self,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<TxHash, Self::Error> {
        self.inner.cast_vote(election, candidate).await
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Confirmation, Self::Error> {
        let _permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| MockError::Transport(e.to_string()))?;
        self.inner.wait_for_confirmation(tx_hash).await
    }
}

/// Forwards single reads and keeps the trait's default batched `elections`.
pub struct SingleReads(pub MockTrustVote);

#[async_trait]
impl ContractReader for SingleReads {
    type Error = MockError;

    async fn organizer_elections(
        &self,
        organizer: AccountAddress,
    ) -> Result<Vec<ElectionId>, Self::Error> {
        self.0.organizer_elections(organizer).await
    }

    async fn voter_elections(&self, voter: AccountAddress) -> Result<Vec<ElectionId>, Self::Error> {
        self.0.voter_elections(voter).await
    }

    async fn election(&self, id: ElectionId) -> Result<Election, Self::Error> {
        self.0.election(id).await
    }

    async fn candidates(&self, id: ElectionId) -> Result<Vec<Candidate>, Self::Error> {
        self.0.candidates(id).await
    }

    async fn top_voted_active_elections(&self) -> Result<Vec<Election>, Self::Error> {
        self.0.top_voted_active_elections().await
    }
}
