#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod config;
pub mod countdown;
pub mod creation;
mod error;
pub mod fetcher;
mod photos;
pub mod results;
pub mod scope;
pub mod slider;
pub mod top_vote;
pub mod voting;

pub use error::ClientError;
pub use photos::CandidateCard;
pub use trustvote_interface::{derive_status, ElectionStatus};

use trustvote_interface::ElectionId;

/// The view a user should be taken to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The ballot of an election.
    Vote(ElectionId),
    /// The results page of an election.
    Result(ElectionId),
}
