use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{AccountAddress, Timestamp};

/// Identifier the voting contract assigns to an election.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ElectionId(pub u64);

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a candidate, unique within its election.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CandidateId(pub u64);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A content address (CID) of a file pinned to content-addressed storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(pub String);

impl ContentId {
    /// Whether the contract returned no content address at all.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// The CID as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of an election relative to the current instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElectionStatus {
    /// Voting has not started yet.
    Inactive,
    /// Voting is open.
    Active,
    /// Voting has closed.
    Finished,
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ElectionStatus::Inactive => "Inactive",
            ElectionStatus::Active => "Active",
            ElectionStatus::Finished => "Finished",
        };
        f.write_str(s)
    }
}

/// Maps an election's time window onto its status at `now`.
///
/// The window is closed on both ends: `now == start` and `now == end` are both
/// [`ElectionStatus::Active`].
pub fn derive_status(start: Timestamp, end: Timestamp, now: Timestamp) -> ElectionStatus {
    if now < start {
        ElectionStatus::Inactive
    } else if now <= end {
        ElectionStatus::Active
    } else {
        ElectionStatus::Finished
    }
}

/// An election as recorded by the voting contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    /// Contract-assigned identifier.
    pub id: ElectionId,
    /// Title supplied at creation.
    pub title: String,
    /// Description supplied at creation.
    pub description: String,
    /// When voting opens.
    pub start: Timestamp,
    /// When voting closes.
    pub end: Timestamp,
    /// Account that created the election.
    pub organizer: AccountAddress,
    /// Number of whitelisted voters.
    pub total_voters: u64,
    /// Number of whitelisted voters that have voted.
    pub total_voted: u64,
}

impl Election {
    /// Status of this election at `now`.
    pub fn status(&self, now: Timestamp) -> ElectionStatus {
        derive_status(self.start, self.end, now)
    }

    /// Whether the voting window has closed at `now`.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now > self.end
    }

    /// Share of whitelisted voters that have voted, as a rounded percentage.
    pub fn participation_percent(&self) -> u64 {
        if self.total_voters == 0 {
            return 0;
        }
        let voted = self.total_voted as u128 * 100;
        let total = self.total_voters as u128;
        // Round half up.
        ((voted * 2 + total) / (total * 2)) as u64
    }
}

/// A candidate as recorded by the voting contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Contract-assigned identifier.
    pub id: CandidateId,
    /// Display name.
    pub name: String,
    /// Content address of the candidate's photo.
    pub photo: ContentId,
    /// Votes received so far.
    pub votes: u64,
}

/// A candidate ready to be submitted in an election-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDraft {
    /// Display name.
    pub name: String,
    /// Content address of the uploaded photo.
    pub photo: ContentId,
}

/// The payload of an election-creation transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDraft {
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// When voting opens.
    pub start: Timestamp,
    /// When voting closes.
    pub end: Timestamp,
    /// Accounts allowed to vote.
    pub whitelist: Vec<AccountAddress>,
    /// Candidates, in display order.
    pub candidates: Vec<CandidateDraft>,
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn ts(secs: u64) -> Timestamp {
        Timestamp::from_secs(secs)
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        assert_eq!(derive_status(ts(10), ts(20), ts(9)), ElectionStatus::Inactive);
        assert_eq!(derive_status(ts(10), ts(20), ts(10)), ElectionStatus::Active);
        assert_eq!(derive_status(ts(10), ts(20), ts(20)), ElectionStatus::Active);
        assert_eq!(derive_status(ts(10), ts(20), ts(21)), ElectionStatus::Finished);
    }

    #[test]
    fn degenerate_window_is_active_at_its_instant() {
        assert_eq!(derive_status(ts(5), ts(5), ts(5)), ElectionStatus::Active);
        assert_eq!(derive_status(ts(5), ts(5), ts(4)), ElectionStatus::Inactive);
        assert_eq!(derive_status(ts(5), ts(5), ts(6)), ElectionStatus::Finished);
    }

    #[test]
    fn participation_rounds() {
        let mut election = Election {
            id: ElectionId(1),
            title: "t".into(),
            description: "d".into(),
            start: ts(0),
            end: ts(1),
            organizer: AccountAddress::new([0; 20]),
            total_voters: 1000,
            total_voted: 700,
        };
        assert_eq!(election.participation_percent(), 70);
        election.total_voters = 3;
        election.total_voted = 2;
        assert_eq!(election.participation_percent(), 67);
        election.total_voted = 1;
        assert_eq!(election.participation_percent(), 33);
        election.total_voters = 0;
        assert_eq!(election.participation_percent(), 0);
    }

    proptest! {
        #[test]
        fn status_matches_the_closed_interval_rule(
            start in 0u64..1_000_000,
            len in 0u64..1_000_000,
            now in 0u64..3_000_000,
        ) {
            let end = start + len;
            let status = derive_status(ts(start), ts(end), ts(now));
            let expected = if now < start {
                ElectionStatus::Inactive
            } else if now > end {
                ElectionStatus::Finished
            } else {
                ElectionStatus::Active
            };
            prop_assert_eq!(status, expected);
        }
    }
}
