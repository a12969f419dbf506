use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::election::{ElectionId, DEFAULT_MAX_VOTES},
    db::election::Election,
};

fn default_max_votes() -> u32 {
    DEFAULT_MAX_VOTES
}

/// An election specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectionSpec {
    /// Election name.
    pub name: String,
    /// School year.
    pub year: i32,
    /// Selection cap per ballot.
    #[serde(default = "default_max_votes")]
    pub max_votes: u32,
}

impl ElectionSpec {
    /// Reject specs that cannot become an election.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Status(
                Status::BadRequest,
                "Election name must not be blank".to_string(),
            ));
        }
        if self.max_votes == 0 {
            return Err(Error::Status(
                Status::BadRequest,
                "An election must allow at least one vote per ballot".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert this spec into a new, inactive election with the given ID.
    pub fn into_election(self, election_id: ElectionId) -> Election {
        Election::new(
            election_id,
            self.name.trim().to_string(),
            self.year,
            self.max_votes,
        )
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl ElectionSpec {
        pub fn example() -> Self {
            Self {
                name: "Student Council 2025".to_string(),
                year: 2025,
                max_votes: 2,
            }
        }

        pub fn example2() -> Self {
            Self {
                name: "Class Speaker".to_string(),
                year: 2024,
                max_votes: 1,
            }
        }
    }
}
