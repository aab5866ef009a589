use ethers_contract::BaseContract;
use ethers_core::abi::{Abi, Token};
use ethers_core::types::{Address, Bytes, U256};
use trustvote_interface::{
    AccountAddress, Candidate, CandidateId, ContentId, Election, ElectionDraft, ElectionId,
    Timestamp,
};

use crate::EvmAdapterError;

const TRUST_VOTE_ABI: &str = include_str!("../TrustVote.abi.json");

pub(crate) const CREATE_ELECTION: &str = "createElection";
pub(crate) const VOTE: &str = "vote";
pub(crate) const GET_ELECTION: &str = "getElection";
pub(crate) const GET_CANDIDATES: &str = "getCandidates";
pub(crate) const GET_ELECTIONS_BY_ORGANIZER: &str = "getElectionsByOrganizer";
pub(crate) const GET_ELECTIONS_BY_VOTER: &str = "getElectionsByVoter";
pub(crate) const GET_TOP_VOTED_ACTIVE_ELECTIONS: &str = "getTopVotedActiveElections";

/// TrustVote ABI wrapper: turns domain values into call data and return data
/// back into domain values.
#[derive(Debug, Clone)]
pub struct TrustVoteContract {
    base_contract: BaseContract,
}

impl TrustVoteContract {
    /// Loads the bundled ABI.
    pub fn new() -> Result<Self, EvmAdapterError> {
        let abi: Abi = serde_json::from_str(TRUST_VOTE_ABI)?;
        Ok(Self {
            base_contract: BaseContract::from(abi),
        })
    }

    /// Call data for `createElection`. Candidate ids and vote counts are sent
    /// as zero; the contract assigns them.
    pub fn create_election_call_data(
        &self,
        draft: &ElectionDraft,
    ) -> Result<Bytes, EvmAdapterError> {
        let whitelist = draft
            .whitelist
            .iter()
            .map(|addr| Token::Address(to_h160(addr)))
            .collect();
        let candidates = draft
            .candidates
            .iter()
            .map(|c| {
                Token::Tuple(vec![
                    Token::Uint(U256::zero()),
                    Token::String(c.name.clone()),
                    Token::String(c.photo.to_string()),
                    Token::Uint(U256::zero()),
                ])
            })
            .collect();

        self.encode(
            CREATE_ELECTION,
            &[
                Token::String(draft.title.clone()),
                Token::String(draft.description.clone()),
                Token::Uint(draft.start.as_secs().into()),
                Token::Uint(draft.end.as_secs().into()),
                Token::Array(whitelist),
                Token::Array(candidates),
            ],
        )
    }

    /// Call data for `vote`.
    pub fn vote_call_data(
        &self,
        election: ElectionId,
        candidate: CandidateId,
    ) -> Result<Bytes, EvmAdapterError> {
        self.encode(
            VOTE,
            &[
                Token::Uint(election.0.into()),
                Token::Uint(candidate.0.into()),
            ],
        )
    }

    /// Call data for `getElection`.
    pub fn get_election_call_data(&self, id: ElectionId) -> Result<Bytes, EvmAdapterError> {
        self.encode(GET_ELECTION, &[Token::Uint(id.0.into())])
    }

    /// Call data for `getCandidates`.
    pub fn get_candidates_call_data(&self, id: ElectionId) -> Result<Bytes, EvmAdapterError> {
        self.encode(GET_CANDIDATES, &[Token::Uint(id.0.into())])
    }

    /// Call data for `getElectionsByOrganizer`.
    pub fn organizer_elections_call_data(
        &self,
        organizer: &AccountAddress,
    ) -> Result<Bytes, EvmAdapterError> {
        self.encode(
            GET_ELECTIONS_BY_ORGANIZER,
            &[Token::Address(to_h160(organizer))],
        )
    }

    /// Call data for `getElectionsByVoter`.
    pub fn voter_elections_call_data(
        &self,
        voter: &AccountAddress,
    ) -> Result<Bytes, EvmAdapterError> {
        self.encode(GET_ELECTIONS_BY_VOTER, &[Token::Address(to_h160(voter))])
    }

    /// Call data for `getTopVotedActiveElections`.
    pub fn top_voted_call_data(&self) -> Result<Bytes, EvmAdapterError> {
        self.encode(GET_TOP_VOTED_ACTIVE_ELECTIONS, &[])
    }

    /// Decodes the return data of `getElection`.
    pub fn decode_election(&self, data: &[u8]) -> Result<Election, EvmAdapterError> {
        let mut tokens = self.decode(GET_ELECTION, data)?;
        let token = single(GET_ELECTION, &mut tokens)?;
        election_from_token(GET_ELECTION, token)
    }

    /// Decodes the return data of `getCandidates`.
    pub fn decode_candidates(&self, data: &[u8]) -> Result<Vec<Candidate>, EvmAdapterError> {
        let mut tokens = self.decode(GET_CANDIDATES, data)?;
        let items = array(GET_CANDIDATES, single(GET_CANDIDATES, &mut tokens)?)?;
        items
            .into_iter()
            .map(|t| candidate_from_token(GET_CANDIDATES, t))
            .collect()
    }

    /// Decodes the return data of `getElectionsByOrganizer` or `getElectionsByVoter`.
    pub fn decode_election_ids(
        &self,
        function: &str,
        data: &[u8],
    ) -> Result<Vec<ElectionId>, EvmAdapterError> {
        let mut tokens = self.decode(function, data)?;
        let items = array(function, single(function, &mut tokens)?)?;
        items
            .into_iter()
            .map(|t| uint_u64(function, t).map(ElectionId))
            .collect()
    }

    /// Decodes the return data of `getTopVotedActiveElections`.
    pub fn decode_top_voted(&self, data: &[u8]) -> Result<Vec<Election>, EvmAdapterError> {
        let function = GET_TOP_VOTED_ACTIVE_ELECTIONS;
        let mut tokens = self.decode(function, data)?;
        let items = array(function, single(function, &mut tokens)?)?;
        items
            .into_iter()
            .map(|t| election_from_token(function, t))
            .collect()
    }

    fn encode(&self, function: &str, args: &[Token]) -> Result<Bytes, EvmAdapterError> {
        let data = self
            .base_contract
            .abi()
            .function(function)
            .and_then(|f| f.encode_input(args))
            .map_err(|source| EvmAdapterError::Codec {
                function: function.to_string(),
                source,
            })?;
        Ok(Bytes::from(data))
    }

    fn decode(&self, function: &str, data: &[u8]) -> Result<Vec<Token>, EvmAdapterError> {
        self.base_contract
            .abi()
            .function(function)
            .and_then(|f| f.decode_output(data))
            .map_err(|source| EvmAdapterError::Codec {
                function: function.to_string(),
                source,
            })
    }
}

pub(crate) fn to_h160(addr: &AccountAddress) -> Address {
    Address::from(*addr.as_bytes())
}

fn unexpected(function: &str, reason: impl Into<String>) -> EvmAdapterError {
    EvmAdapterError::UnexpectedOutput {
        function: function.to_string(),
        reason: reason.into(),
    }
}

fn single(function: &str, tokens: &mut Vec<Token>) -> Result<Token, EvmAdapterError> {
    if tokens.len() != 1 {
        return Err(unexpected(
            function,
            format!("expected one return value, got {}", tokens.len()),
        ));
    }
    tokens
        .pop()
        .ok_or_else(|| unexpected(function, "missing return value"))
}

fn array(function: &str, token: Token) -> Result<Vec<Token>, EvmAdapterError> {
    match token {
        Token::Array(items) => Ok(items),
        other => Err(unexpected(function, format!("expected array, got {other:?}"))),
    }
}

fn tuple<const N: usize>(function: &str, token: Token) -> Result<[Token; N], EvmAdapterError> {
    match token {
        Token::Tuple(fields) => {
            let len = fields.len();
            fields
                .try_into()
                .map_err(|_| unexpected(function, format!("expected {N} fields, got {len}")))
        }
        other => Err(unexpected(function, format!("expected tuple, got {other:?}"))),
    }
}

fn uint_u64(function: &str, token: Token) -> Result<u64, EvmAdapterError> {
    match token {
        Token::Uint(value) if value <= U256::from(u64::MAX) => Ok(value.as_u64()),
        Token::Uint(value) => Err(unexpected(function, format!("{value} overflows u64"))),
        other => Err(unexpected(function, format!("expected uint, got {other:?}"))),
    }
}

fn string(function: &str, token: Token) -> Result<String, EvmAdapterError> {
    match token {
        Token::String(s) => Ok(s),
        other => Err(unexpected(function, format!("expected string, got {other:?}"))),
    }
}

fn address(function: &str, token: Token) -> Result<AccountAddress, EvmAdapterError> {
    match token {
        Token::Address(addr) => Ok(AccountAddress::new(addr.0)),
        other => Err(unexpected(function, format!("expected address, got {other:?}"))),
    }
}

fn election_from_token(function: &str, token: Token) -> Result<Election, EvmAdapterError> {
    let [id, title, descr, start, end, organizer, total_voter, total_has_voted] =
        tuple::<8>(function, token)?;
    Ok(Election {
        id: ElectionId(uint_u64(function, id)?),
        title: string(function, title)?,
        description: string(function, descr)?,
        start: Timestamp::from_secs(uint_u64(function, start)?),
        end: Timestamp::from_secs(uint_u64(function, end)?),
        organizer: address(function, organizer)?,
        total_voters: uint_u64(function, total_voter)?,
        total_voted: uint_u64(function, total_has_voted)?,
    })
}

fn candidate_from_token(function: &str, token: Token) -> Result<Candidate, EvmAdapterError> {
    let [id, name, pic, votes] = tuple::<4>(function, token)?;
    Ok(Candidate {
        id: CandidateId(uint_u64(function, id)?),
        name: string(function, name)?,
        photo: ContentId(string(function, pic)?),
        votes: uint_u64(function, votes)?,
    })
}
