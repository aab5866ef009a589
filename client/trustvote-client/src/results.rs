//! Vote counts and participation of one election.
use std::sync::Arc;

use trustvote_interface::services::contract::ContractReader;
use trustvote_interface::services::storage::ContentStorage;
use trustvote_interface::{Clock, Election, ElectionId, ElectionStatus, Timestamp};

use crate::countdown::{countdown_label, Target};
use crate::photos::{resolve_photos, CandidateCard};
use crate::scope::ScopeToken;
use crate::ClientError;

/// The results page of one election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionResult {
    /// The election.
    pub election: Election,
    /// Status when the result was fetched.
    pub status: ElectionStatus,
    /// Candidates with their vote counts.
    pub candidates: Vec<CandidateCard>,
}

impl ElectionResult {
    /// Whitelisted voters that have voted, as counted by the contract.
    pub fn voted(&self) -> u64 {
        self.election.total_voted
    }

    /// Whitelisted voters, as counted by the contract.
    pub fn eligible(&self) -> u64 {
        self.election.total_voters
    }

    /// Rounded share of eligible voters that have voted.
    pub fn participation_percent(&self) -> u64 {
        self.election.participation_percent()
    }

    /// Countdown at `now`; `00:00:00` once voting closed.
    pub fn countdown(&self, now: Timestamp) -> String {
        countdown_label(self.election.start, self.election.end, now)
    }

    /// Countdown target while the election is active.
    pub fn countdown_target(&self) -> Option<Target> {
        (self.status == ElectionStatus::Active).then(|| Target {
            election: self.election.id,
            start: self.election.start,
            end: self.election.end,
        })
    }
}

/// Fetches election results.
pub struct ResultViewer<R, S> {
    reader: Arc<R>,
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    placeholder_url: String,
    scope: ScopeToken,
}

impl<R: ContractReader, S: ContentStorage> ResultViewer<R, S> {
    /// Creates a viewer. `placeholder_url` is shown for photos that cannot be resolved.
    pub fn new(
        reader: Arc<R>,
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
        placeholder_url: impl Into<String>,
        scope: ScopeToken,
    ) -> Self {
        Self {
            reader,
            storage,
            clock,
            placeholder_url: placeholder_url.into(),
            scope,
        }
    }

    /// Fetches the election, its candidates and their vote counts.
    pub async fn load(&self, id: ElectionId) -> Result<ElectionResult, ClientError> {
        self.scope.run(self.fetch(id)).await?
    }

    async fn fetch(&self, id: ElectionId) -> Result<ElectionResult, ClientError> {
        let (election, candidates) =
            futures::try_join!(self.reader.election(id), self.reader.candidates(id))
                .map_err(ClientError::read)?;
        let candidates =
            resolve_photos(self.storage.as_ref(), candidates, &self.placeholder_url).await;
        let status = election.status(self.clock.now());
        tracing::debug!(election_id = %id, %status, "Loaded results");
        Ok(ElectionResult {
            election,
            status,
            candidates,
        })
    }
}
