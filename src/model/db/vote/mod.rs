//! The anonymous vote ledger.
//!
//! Votes are append-only. A vote names its election and candidate and nothing
//! else; no field joins it back to the redeemed code or the request that
//! carried it.

mod redemption;
mod tally;

pub use redemption::{
    check_code, check_election, check_selection, open_ballot, redeem, BallotLookup,
    RedemptionOutcome,
};
pub use tally::{rank, tally, CandidateTally, Tally};

use chrono::{DateTime, DurationRound, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::election::{CandidateId, ElectionId};

/// A single vote for a single candidate.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub election_id: ElectionId,
    pub candidate_id: CandidateId,
    /// Truncated to the minute.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(election_id: ElectionId, candidate_id: CandidateId, now: DateTime<Utc>) -> Self {
        let created_at = now
            .duration_trunc(chrono::Duration::minutes(1))
            .unwrap_or(now);
        Self {
            election_id,
            candidate_id,
            created_at,
        }
    }
}
