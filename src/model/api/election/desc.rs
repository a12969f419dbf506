use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::{candidate::CandidateDescription, school_class::SchoolClassDescription},
    common::election::ElectionId,
    db::election::{Election, ToggleOutcome},
};

/// Top-level election data, as listed to the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub id: ElectionId,
    pub name: String,
    pub year: i32,
    pub max_votes: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Election> for ElectionSummary {
    fn from(election: Election) -> Self {
        Self {
            id: election.id,
            name: election.election.name,
            year: election.election.year,
            max_votes: election.election.max_votes,
            is_active: election.election.is_active,
            created_at: election.election.created_at,
        }
    }
}

/// An election with its candidates and classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionDescription {
    #[serde(flatten)]
    pub election: ElectionSummary,
    /// Ordered by name.
    pub candidates: Vec<CandidateDescription>,
    /// In natural class order.
    pub classes: Vec<SchoolClassDescription>,
}

/// Reply to a successful toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToggleReply {
    Activated,
    Deactivated,
}

impl TryFrom<ToggleOutcome> for ToggleReply {
    type Error = ();

    /// Only the successful outcomes have a reply.
    fn try_from(outcome: ToggleOutcome) -> Result<Self, Self::Error> {
        match outcome {
            ToggleOutcome::Activated => Ok(Self::Activated),
            ToggleOutcome::Deactivated => Ok(Self::Deactivated),
            ToggleOutcome::NoCodesGenerated => Err(()),
        }
    }
}
