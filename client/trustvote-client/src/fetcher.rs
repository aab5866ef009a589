//! Election lists for the organizer and voter dashboards.
//!
//! Lists are read in two phases: the identifiers first, then every detail
//! record concurrently. A detail read that fails only drops its record; a
//! failure of the identifier read or of the batch itself fails the list.
use std::sync::Arc;

use trustvote_interface::services::contract::ContractReader;
use trustvote_interface::{AccountAddress, Election};

use crate::scope::ScopeToken;
use crate::ClientError;

/// Whose elections a list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Elections created by the viewer.
    Organizer,
    /// Elections the viewer is whitelisted for.
    Voter,
}

/// The wallet session a list is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    /// No wallet connected.
    Disconnected,
    /// A wallet is connected with this account.
    Connected(AccountAddress),
}

/// Fetches the elections `viewer` created or may vote in, in contract order.
pub async fn fetch_elections<R: ContractReader>(
    reader: &R,
    viewer: AccountAddress,
    role: Role,
) -> Result<Vec<Election>, ClientError> {
    let ids = match role {
        Role::Organizer => reader.organizer_elections(viewer).await,
        Role::Voter => reader.voter_elections(viewer).await,
    }
    .map_err(ClientError::read)?;
    tracing::debug!(%viewer, ?role, count = ids.len(), "Fetched election ids");

    let details = reader.elections(&ids).await.map_err(ClientError::read)?;

    let mut elections = Vec::with_capacity(details.len());
    for (id, detail) in ids.iter().zip(details) {
        match detail {
            Ok(election) => elections.push(election),
            Err(error) => {
                tracing::warn!(election_id = %id, %error, "Failed to fetch election, skipping it");
            }
        }
    }
    Ok(elections)
}

/// What a dashboard list shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    /// No wallet connected; nothing was fetched.
    Disconnected,
    /// The list was fetched. It may be empty.
    Ready(Vec<Election>),
    /// The list could not be fetched.
    Failed(ClientError),
}

/// A dashboard list that re-fetches whenever the session changes.
#[derive(Debug)]
pub struct ElectionListView<R> {
    reader: Arc<R>,
    role: Role,
    session: Session,
    state: ListState,
    scope: ScopeToken,
}

impl<R: ContractReader> ElectionListView<R> {
    /// Creates a disconnected list.
    pub fn new(reader: Arc<R>, role: Role, scope: ScopeToken) -> Self {
        Self {
            reader,
            role,
            session: Session::Disconnected,
            state: ListState::Disconnected,
            scope,
        }
    }

    /// The list as of the last fetch.
    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// The session the list was last fetched for.
    pub fn session(&self) -> Session {
        self.session
    }

    /// Applies a session change, fetching again if the account or the
    /// connection status changed.
    pub async fn on_session_change(&mut self, session: Session) -> &ListState {
        if session != self.session {
            self.session = session;
            self.refresh().await;
        }
        &self.state
    }

    /// Fetches the list again for the current session.
    pub async fn refresh(&mut self) -> &ListState {
        let viewer = match self.session {
            Session::Disconnected => {
                self.state = ListState::Disconnected;
                return &self.state;
            }
            Session::Connected(viewer) => viewer,
        };

        let fetched = self
            .scope
            .run(fetch_elections(self.reader.as_ref(), viewer, self.role))
            .await;
        match fetched {
            Ok(Ok(elections)) => self.state = ListState::Ready(elections),
            Ok(Err(error)) => {
                tracing::warn!(%viewer, %error, "Failed to fetch election list");
                self.state = ListState::Failed(error);
            }
            // The view is gone; leave its state alone.
            Err(_cancelled) => {}
        }
        &self.state
    }
}
