use serde::{Deserialize, Serialize};

use crate::model::{
    common::election::CandidateId,
    db::vote::{CandidateTally, Tally},
};

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_id: CandidateId,
    pub name: String,
    pub class_name: Option<String>,
    pub votes: u64,
}

impl From<CandidateTally> for CandidateResult {
    fn from(tally: CandidateTally) -> Self {
        Self {
            candidate_id: tally.candidate_id,
            name: tally.name,
            class_name: tally.class_name,
            votes: tally.votes,
        }
    }
}

/// Election results plus turnout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    /// Most votes first.
    pub results: Vec<CandidateResult>,
    pub total_codes: u64,
    pub used_codes: u64,
    pub max_votes: u32,
}

impl From<Tally> for ElectionResults {
    fn from(tally: Tally) -> Self {
        Self {
            results: tally.results.into_iter().map(Into::into).collect(),
            total_codes: tally.total_codes,
            used_codes: tally.used_codes,
            max_votes: tally.max_votes,
        }
    }
}
