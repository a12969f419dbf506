use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::common::election::ElectionId;

/// Core election data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Display name.
    pub name: String,
    /// School year the election belongs to.
    pub year: i32,
    /// How many candidates a single ballot may select.
    pub max_votes: u32,
    /// Whether codes can currently be redeemed. At most one election is active.
    pub is_active: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

/// An election from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: ElectionId,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Election {
    /// A new, inactive election.
    pub fn new(id: ElectionId, name: String, year: i32, max_votes: u32) -> Self {
        Self {
            id,
            election: ElectionCore {
                name,
                year,
                max_votes,
                is_active: false,
                created_at: Utc::now(),
            },
        }
    }
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Election {
        pub fn example() -> Self {
            Self::new(1, "Student Council 2025".to_string(), 2025, 2)
        }

        pub fn active_example() -> Self {
            let mut election = Self::new(2, "Class Speaker 2025".to_string(), 2025, 1);
            election.is_active = true;
            election
        }
    }
}
