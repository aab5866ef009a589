//! The ballot of one election and vote submission.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use trustvote_interface::services::contract::{Confirmation, ContractReader, ContractWriter};
use trustvote_interface::services::storage::ContentStorage;
use trustvote_interface::{CandidateId, Clock, Election, ElectionId, ElectionStatus, Timestamp};

use crate::countdown::{countdown_label, Target};
use crate::photos::{resolve_photos, CandidateCard};
use crate::scope::ScopeToken;
use crate::{ClientError, Route};

/// Where a vote submission is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotePhase {
    /// Nothing in flight.
    Idle,
    /// The vote transaction is being signed and sent.
    Pending,
    /// Waiting for the vote to be included.
    Confirming,
}

/// An election with its candidates, ready to vote on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot {
    /// The election.
    pub election: Election,
    /// Candidates with resolved photos.
    pub candidates: Vec<CandidateCard>,
}

impl Ballot {
    /// Status at `now`.
    pub fn status(&self, now: Timestamp) -> ElectionStatus {
        self.election.status(now)
    }

    /// Countdown to the end time at `now`.
    pub fn countdown(&self, now: Timestamp) -> String {
        countdown_label(self.election.start, self.election.end, now)
    }

    /// Countdown target for a [`crate::countdown::CountdownTicker`].
    pub fn countdown_target(&self) -> Target {
        Target {
            election: self.election.id,
            start: self.election.start,
            end: self.election.end,
        }
    }
}

struct InFlight<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<VotePhase>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(VotePhase::Idle);
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Loads ballots and casts votes.
pub struct VotingController<R, W, S> {
    reader: Arc<R>,
    writer: Arc<W>,
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    placeholder_url: String,
    in_flight: AtomicBool,
    phase: watch::Sender<VotePhase>,
    scope: ScopeToken,
}

impl<R, W, S> VotingController<R, W, S>
where
    R: ContractReader,
    W: ContractWriter,
    S: ContentStorage,
{
    /// Creates a controller. `placeholder_url` is shown for photos that cannot be resolved.
    pub fn new(
        reader: Arc<R>,
        writer: Arc<W>,
        storage: Arc<S>,
        clock: Arc<dyn Clock>,
        placeholder_url: impl Into<String>,
        scope: ScopeToken,
    ) -> Self {
        let (phase, _) = watch::channel(VotePhase::Idle);
        Self {
            reader,
            writer,
            storage,
            clock,
            placeholder_url: placeholder_url.into(),
            in_flight: AtomicBool::new(false),
            phase,
            scope,
        }
    }

    /// The current submission phase.
    pub fn phase(&self) -> VotePhase {
        *self.phase.borrow()
    }

    /// Notified on every phase change.
    pub fn subscribe(&self) -> watch::Receiver<VotePhase> {
        self.phase.subscribe()
    }

    /// Fetches the election and its candidates, resolving candidate photos.
    pub async fn load(&self, id: ElectionId) -> Result<Ballot, ClientError> {
        let ballot = self.scope.run(self.fetch(id)).await??;
        tracing::debug!(election_id = %id, candidates = ballot.candidates.len(), "Loaded ballot");
        Ok(ballot)
    }

    async fn fetch(&self, id: ElectionId) -> Result<Ballot, ClientError> {
        let (election, candidates) =
            futures::try_join!(self.reader.election(id), self.reader.candidates(id))
                .map_err(ClientError::read)?;
        let candidates =
            resolve_photos(self.storage.as_ref(), candidates, &self.placeholder_url).await;
        Ok(Ballot {
            election,
            candidates,
        })
    }

    /// Votes for `candidate` and, once the vote is included, routes to the results.
    ///
    /// Rejected without any network call once the election has ended, or while
    /// another vote from this controller is in flight.
    pub async fn cast_vote(
        &self,
        election: &Election,
        candidate: CandidateId,
    ) -> Result<Route, ClientError> {
        if election.has_ended(self.clock.now()) {
            tracing::debug!(election_id = %election.id, "Rejected vote after end time");
            return Err(ClientError::VotingClosed(election.id));
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(ClientError::SubmissionInFlight);
        }
        let _in_flight = InFlight {
            flag: &self.in_flight,
            phase: &self.phase,
        };

        self.phase.send_replace(VotePhase::Pending);
        let tx_hash = self
            .writer
            .cast_vote(election.id, candidate)
            .await
            .map_err(ClientError::submission)?;
        tracing::info!(election_id = %election.id, candidate_id = %candidate, %tx_hash, "Submitted vote");

        self.phase.send_replace(VotePhase::Confirming);
        let confirmation = self
            .scope
            .run(self.writer.wait_for_confirmation(tx_hash))
            .await?
            .map_err(ClientError::confirmation)?;
        match confirmation {
            Confirmation::Succeeded => Ok(Route::Result(election.id)),
            Confirmation::Reverted => Err(ClientError::Reverted(tx_hash)),
        }
    }
}
