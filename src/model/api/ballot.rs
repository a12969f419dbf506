use serde::{Deserialize, Serialize};

use crate::model::{
    api::candidate::CandidateDescription,
    common::election::{CandidateId, ElectionId},
    db::{candidate::Candidate, election::Election},
};

/// The election a ballot is for, without administrative fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotElection {
    pub id: ElectionId,
    pub name: String,
    pub year: i32,
    pub max_votes: u32,
}

/// What a student sees after entering a valid code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotDescription {
    pub election: BallotElection,
    /// Ordered by name.
    pub candidates: Vec<CandidateDescription>,
}

impl BallotDescription {
    pub fn new(election: Election, candidates: Vec<Candidate>) -> Self {
        Self {
            election: BallotElection {
                id: election.id,
                name: election.election.name,
                year: election.election.year,
                max_votes: election.election.max_votes,
            },
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

/// A completed ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteSubmission {
    /// IDs of the chosen candidates.
    pub candidates: Vec<CandidateId>,
}

/// Reply to an accepted ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoteReply {
    Success,
}
