//! The most-voted active elections.
use std::sync::Arc;

use trustvote_interface::services::contract::ContractReader;
use trustvote_interface::{AccountAddress, Clock, Election, ElectionId, ElectionStatus};

use crate::scope::ScopeToken;
use crate::{ClientError, Route};

/// One row of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopVoteEntry {
    /// The election.
    pub election: Election,
    /// Status when the board was fetched.
    pub status: ElectionStatus,
    /// Rounded share of eligible voters that have voted.
    pub participation_percent: u64,
}

/// Lists the contract's top-voted active elections.
pub struct TopVoteBoard<R> {
    reader: Arc<R>,
    clock: Arc<dyn Clock>,
    scope: ScopeToken,
}

impl<R: ContractReader> TopVoteBoard<R> {
    /// Creates a board.
    pub fn new(reader: Arc<R>, clock: Arc<dyn Clock>, scope: ScopeToken) -> Self {
        Self {
            reader,
            clock,
            scope,
        }
    }

    /// Fetches the board, in the contract's ranking.
    pub async fn load(&self) -> Result<Vec<TopVoteEntry>, ClientError> {
        let elections = self
            .scope
            .run(self.reader.top_voted_active_elections())
            .await?
            .map_err(ClientError::read)?;
        let now = self.clock.now();
        Ok(elections
            .into_iter()
            .map(|election| TopVoteEntry {
                status: election.status(now),
                participation_percent: election.participation_percent(),
                election,
            })
            .collect())
    }

    /// Where selecting `election` leads: its ballot if `viewer` is whitelisted,
    /// its results otherwise.
    pub async fn route_for(
        &self,
        viewer: Option<AccountAddress>,
        election: ElectionId,
    ) -> Result<Route, ClientError> {
        let eligible = self.eligible(viewer).await?;
        Ok(route(&eligible, election))
    }

    /// [`TopVoteBoard::route_for`] for every entry, reading the viewer's
    /// eligible elections once.
    pub async fn routes(
        &self,
        viewer: Option<AccountAddress>,
        entries: &[TopVoteEntry],
    ) -> Result<Vec<Route>, ClientError> {
        let eligible = self.eligible(viewer).await?;
        Ok(entries
            .iter()
            .map(|entry| route(&eligible, entry.election.id))
            .collect())
    }

    async fn eligible(&self, viewer: Option<AccountAddress>) -> Result<Vec<ElectionId>, ClientError> {
        let Some(viewer) = viewer else {
            return Ok(Vec::new());
        };
        self.scope
            .run(self.reader.voter_elections(viewer))
            .await?
            .map_err(ClientError::read)
    }
}

fn route(eligible: &[ElectionId], election: ElectionId) -> Route {
    if eligible.contains(&election) {
        Route::Vote(election)
    } else {
        Route::Result(election)
    }
}
