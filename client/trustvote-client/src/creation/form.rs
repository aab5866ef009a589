use std::time::UNIX_EPOCH;

use thiserror::Error;
use trustvote_interface::services::storage::PhotoFile;
use trustvote_interface::{AccountAddress, Timestamp};

/// Fewest candidates an election can have.
pub const MIN_CANDIDATES: usize = 2;
/// Most candidates an election can have.
pub const MAX_CANDIDATES: usize = 3;

/// The first validation rule the form breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer than two candidates.
    #[error("an election needs at least {MIN_CANDIDATES} candidates")]
    TooFewCandidates,
    /// The title is blank.
    #[error("title is required")]
    MissingTitle,
    /// The description is blank.
    #[error("description is required")]
    MissingDescription,
    /// The start or end date is missing.
    #[error("start and end dates are required")]
    MissingDates,
    /// A candidate has no name.
    #[error("candidate {position} needs a name")]
    MissingCandidateName {
        /// 1-based position of the candidate.
        position: usize,
    },
    /// The whitelist is empty.
    #[error("the whitelist needs at least one address")]
    EmptyWhitelist,
    /// A date could not be parsed.
    #[error("invalid date {0:?}, expected YYYY-MM-DDTHH:MM")]
    InvalidDate(String),
    /// The end date is not after the start date.
    #[error("end date must be after start date")]
    EndNotAfterStart,
    /// A candidate has no photo.
    #[error("candidate {position} needs a photo")]
    MissingPhoto {
        /// 1-based position of the candidate.
        position: usize,
    },
    /// A whitelist entry is not a valid address.
    #[error("invalid whitelist address {0:?}")]
    InvalidWhitelistEntry(String),
    /// No contract address is configured.
    #[error("no contract address configured")]
    MissingContractAddress,
}

/// Parses a `YYYY-MM-DDTHH:MM[:SS]` date as UTC.
pub fn parse_datetime(input: &str) -> Option<Timestamp> {
    let input = input.trim();
    let with_seconds;
    let input = if input.len() == "YYYY-MM-DDTHH:MM".len() {
        with_seconds = format!("{input}:00");
        with_seconds.as_str()
    } else {
        input
    };
    let time = humantime::parse_rfc3339_weak(input).ok()?;
    let secs = time.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(Timestamp::from_secs(secs))
}

/// One candidate row of the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateInput {
    /// Form-local key, stable while the row exists.
    pub local_id: u32,
    /// Candidate name.
    pub name: String,
    /// Selected photo, if any.
    pub photo: Option<PhotoFile>,
}

impl CandidateInput {
    fn empty(local_id: u32) -> Self {
        Self {
            local_id,
            name: String::new(),
            photo: None,
        }
    }
}

/// A form that passed validation, with its dates parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedForm {
    /// Trimmed title.
    pub title: String,
    /// Trimmed description.
    pub description: String,
    /// Voting opens.
    pub start: Timestamp,
    /// Voting closes.
    pub end: Timestamp,
    /// Candidate names and photos, in form order.
    pub candidates: Vec<(String, PhotoFile)>,
    /// Parsed whitelist, in form order.
    pub whitelist: Vec<AccountAddress>,
    /// Contract the election is created on.
    pub contract_address: AccountAddress,
}

/// The election creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElectionForm {
    /// Election title.
    pub title: String,
    /// Election description.
    pub description: String,
    /// Start date input.
    pub start: String,
    /// End date input.
    pub end: String,
    candidates: Vec<CandidateInput>,
    whitelist: Vec<String>,
    next_candidate_id: u32,
}

impl Default for ElectionForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            start: String::new(),
            end: String::new(),
            candidates: vec![CandidateInput::empty(1), CandidateInput::empty(2)],
            whitelist: Vec::new(),
            next_candidate_id: 3,
        }
    }
}

impl ElectionForm {
    /// An empty form with two candidate rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate rows, in display order.
    pub fn candidates(&self) -> &[CandidateInput] {
        &self.candidates
    }

    /// A candidate row by local id.
    pub fn candidate_mut(&mut self, local_id: u32) -> Option<&mut CandidateInput> {
        self.candidates.iter_mut().find(|c| c.local_id == local_id)
    }

    /// Appends an empty candidate row. Returns its local id, or `None` at the maximum.
    pub fn add_candidate(&mut self) -> Option<u32> {
        if self.candidates.len() >= MAX_CANDIDATES {
            return None;
        }
        let local_id = self.next_candidate_id;
        self.next_candidate_id += 1;
        self.candidates.push(CandidateInput::empty(local_id));
        Some(local_id)
    }

    /// Deletes a candidate row. No-op at the minimum or for an unknown id.
    pub fn remove_candidate(&mut self, local_id: u32) -> bool {
        if self.candidates.len() <= MIN_CANDIDATES {
            return false;
        }
        let before = self.candidates.len();
        self.candidates.retain(|c| c.local_id != local_id);
        self.candidates.len() != before
    }

    /// Addresses saved from the whitelist dialog.
    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Stores the list saved from the whitelist dialog.
    pub fn set_whitelist(&mut self, entries: Vec<String>) {
        self.whitelist = entries;
    }

    /// Back to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks the form, stopping at the first broken rule.
    pub fn validate(
        &self,
        contract_address: Option<AccountAddress>,
    ) -> Result<ValidatedForm, ValidationError> {
        if self.candidates.len() < MIN_CANDIDATES {
            return Err(ValidationError::TooFewCandidates);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        if self.start.trim().is_empty() || self.end.trim().is_empty() {
            return Err(ValidationError::MissingDates);
        }
        if let Some(position) = self.candidates.iter().position(|c| c.name.trim().is_empty()) {
            return Err(ValidationError::MissingCandidateName {
                position: position + 1,
            });
        }
        if self.whitelist.is_empty() {
            return Err(ValidationError::EmptyWhitelist);
        }

        let start = parse_datetime(&self.start)
            .ok_or_else(|| ValidationError::InvalidDate(self.start.clone()))?;
        let end = parse_datetime(&self.end)
            .ok_or_else(|| ValidationError::InvalidDate(self.end.clone()))?;
        if start >= end {
            return Err(ValidationError::EndNotAfterStart);
        }

        let mut candidates = Vec::with_capacity(self.candidates.len());
        for (idx, candidate) in self.candidates.iter().enumerate() {
            let photo = candidate
                .photo
                .clone()
                .ok_or(ValidationError::MissingPhoto { position: idx + 1 })?;
            candidates.push((candidate.name.trim().to_string(), photo));
        }

        let whitelist = self
            .whitelist
            .iter()
            .map(|entry| {
                entry
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::InvalidWhitelistEntry(entry.clone()))
            })
            .collect::<Result<Vec<AccountAddress>, _>>()?;

        let contract_address = contract_address.ok_or(ValidationError::MissingContractAddress)?;

        Ok(ValidatedForm {
            title: title.to_string(),
            description: description.to_string(),
            start,
            end,
            candidates,
            whitelist,
            contract_address,
        })
    }
}
