use std::ops::{Deref, DerefMut};

use log::info;
use mongodb::{bson::doc, error::Error as DbError, Client, ClientSession, Database};
use rocket::futures::FutureExt;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{
    common::election::{CandidateId, ElectionId},
    db::vote::Vote,
    mongodb::{run_transaction, Coll},
};

/// Core candidate data, as stored in the database.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CandidateCore {
    /// The election this candidate stands in.
    pub election_id: ElectionId,
    pub name: String,
    pub class_name: Option<String>,
    pub description: Option<String>,
    /// Opaque reference to a photo, e.g. a file name.
    pub photo: Option<String>,
}

/// A candidate from the database, with its unique ID.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(rename = "_id")]
    pub id: CandidateId,
    #[serde(flatten)]
    pub candidate: CandidateCore,
}

impl Candidate {
    pub fn new(
        id: CandidateId,
        election_id: ElectionId,
        name: String,
        class_name: Option<String>,
        description: Option<String>,
        photo: Option<String>,
    ) -> Self {
        Self {
            id,
            candidate: CandidateCore {
                election_id,
                name,
                class_name,
                description,
                photo,
            },
        }
    }
}

impl Deref for Candidate {
    type Target = CandidateCore;

    fn deref(&self) -> &Self::Target {
        &self.candidate
    }
}

impl DerefMut for Candidate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.candidate
    }
}

struct CandidateRemoval {
    candidate_id: CandidateId,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
}

impl CandidateRemoval {
    async fn attempt(&self, session: &mut ClientSession) -> std::result::Result<bool, DbError> {
        let removed = self
            .candidates
            .delete_one_with_session(doc! { "_id": self.candidate_id }, None, session)
            .await?;
        if removed.deleted_count == 0 {
            return Ok(false);
        }
        self.votes
            .delete_many_with_session(doc! { "candidate_id": self.candidate_id }, None, session)
            .await?;
        Ok(true)
    }
}

/// Delete a candidate and every vote cast for them, in one transaction.
///
/// Returns `false` if there was no such candidate.
pub async fn delete_candidate(
    db_client: &Client,
    db: &Database,
    candidate_id: CandidateId,
) -> Result<bool> {
    let removal = CandidateRemoval {
        candidate_id,
        candidates: Coll::from_db(db),
        votes: Coll::from_db(db),
    };
    let deleted = run_transaction(db_client, removal, |session, removal| {
        removal.attempt(session).boxed()
    })
    .await?;
    if deleted {
        info!("Deleted candidate {candidate_id} and their votes");
    }
    Ok(deleted)
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Candidate {
        /// Candidates A, B and C of the given election, with consecutive IDs from `first_id`.
        pub fn examples(election_id: ElectionId, first_id: CandidateId) -> Vec<Self> {
            ["Alice Adams", "Ben Brooks", "Chloe Clark"]
                .into_iter()
                .zip(["9b", "10a", "5c"])
                .enumerate()
                .map(|(i, (name, class))| {
                    Self::new(
                        first_id + i as CandidateId,
                        election_id,
                        name.to_string(),
                        Some(class.to_string()),
                        None,
                        None,
                    )
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[backend_test]
    async fn delete_candidate_cascades_votes(db: Database) {
        let candidates = Coll::<Candidate>::from_db(&db);
        let votes = Coll::<Vote>::from_db(&db);
        let examples = Candidate::examples(1, 1);
        candidates.insert_many(&examples, None).await.unwrap();
        let ballot = [Vote::new(1, 1, Utc::now()), Vote::new(1, 2, Utc::now())];
        votes.insert_many(ballot, None).await.unwrap();

        let db_client = crate::db_client().await;
        assert!(delete_candidate(&db_client, &db, 1).await.unwrap());
        assert_eq!(candidates.count_documents(None, None).await.unwrap(), 2);
        assert_eq!(
            votes
                .count_documents(doc! { "candidate_id": 1 }, None)
                .await
                .unwrap(),
            0
        );
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 1);

        assert!(!delete_candidate(&db_client, &db, 1).await.unwrap());
    }
}
