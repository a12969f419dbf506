mod generator;

pub use generator::{
    codes_needed, generate_codes, generate_for_classes, CodeGenerator, ATTEMPTS_PER_CODE,
    CODE_ALPHABET, CODE_LENGTH, MAX_CODES_PER_REQUEST,
};

use std::ops::{Deref, DerefMut};

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::model::common::election::ElectionId;

/// A voting code without an ID, ready to be inserted.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NewVotingCode {
    pub election_id: ElectionId,
    /// The secret itself. Unique across all elections.
    pub code: String,
    pub is_used: bool,
    pub used_at: Option<DateTime>,
    /// Class the code was printed for, if any.
    pub class_name: Option<String>,
}

impl NewVotingCode {
    /// A fresh, unused code.
    pub fn new(election_id: ElectionId, code: String, class_name: Option<String>) -> Self {
        Self {
            election_id,
            code,
            is_used: false,
            used_at: None,
            class_name,
        }
    }
}

/// A voting code from the database, with its unique ID.
///
/// Codes transition from unused to used exactly once and are only removed
/// together with their election.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VotingCode {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    #[serde(flatten)]
    pub code: NewVotingCode,
}

impl Deref for VotingCode {
    type Target = NewVotingCode;

    fn deref(&self) -> &Self::Target {
        &self.code
    }
}

impl DerefMut for VotingCode {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.code
    }
}
