use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    common::election::{CandidateId, ElectionId},
    db::candidate::Candidate,
};

use super::non_blank;

/// A candidate specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub name: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Opaque photo reference; storing the image is someone else's job.
    #[serde(default)]
    pub photo: Option<String>,
}

impl CandidateSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Status(
                Status::BadRequest,
                "Candidate name must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    /// Convert this spec into a candidate of the given election.
    pub fn into_candidate(self, id: CandidateId, election_id: ElectionId) -> Candidate {
        Candidate::new(
            id,
            election_id,
            self.name.trim().to_string(),
            non_blank(self.class_name),
            non_blank(self.description),
            non_blank(self.photo),
        )
    }
}

/// An API-friendly candidate description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateDescription {
    pub id: CandidateId,
    pub name: String,
    pub class_name: Option<String>,
    pub description: Option<String>,
    pub photo: Option<String>,
}

impl From<Candidate> for CandidateDescription {
    fn from(candidate: Candidate) -> Self {
        Self {
            id: candidate.id,
            name: candidate.candidate.name,
            class_name: candidate.candidate.class_name,
            description: candidate.candidate.description,
            photo: candidate.candidate.photo,
        }
    }
}
