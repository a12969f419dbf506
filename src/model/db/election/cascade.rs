use log::info;
use mongodb::{bson::doc, error::Error as DbError, Client, ClientSession, Database};
use rocket::futures::FutureExt;

use crate::error::Result;
use crate::model::{
    common::election::ElectionId,
    db::{candidate::Candidate, school_class::SchoolClass, vote::Vote, voting_code::VotingCode},
    mongodb::{run_transaction, Coll},
};

use super::Election;

struct Cascade {
    election_id: ElectionId,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    classes: Coll<SchoolClass>,
    codes: Coll<VotingCode>,
    votes: Coll<Vote>,
}

impl Cascade {
    async fn attempt(&self, session: &mut ClientSession) -> std::result::Result<bool, DbError> {
        let owned = doc! { "election_id": self.election_id };
        let exists = self
            .elections
            .count_documents_with_session(doc! { "_id": self.election_id }, None, session)
            .await?
            > 0;
        if !exists {
            return Ok(false);
        }

        self.votes
            .delete_many_with_session(owned.clone(), None, session)
            .await?;
        self.codes
            .delete_many_with_session(owned.clone(), None, session)
            .await?;
        self.candidates
            .delete_many_with_session(owned.clone(), None, session)
            .await?;
        self.classes
            .delete_many_with_session(owned, None, session)
            .await?;
        self.elections
            .delete_one_with_session(doc! { "_id": self.election_id }, None, session)
            .await?;
        Ok(true)
    }
}

/// Delete an election together with everything it owns, in one transaction.
///
/// Returns `false` if there was no such election.
pub async fn delete_election(
    db_client: &Client,
    db: &Database,
    election_id: ElectionId,
) -> Result<bool> {
    let cascade = Cascade {
        election_id,
        elections: Coll::from_db(db),
        candidates: Coll::from_db(db),
        classes: Coll::from_db(db),
        codes: Coll::from_db(db),
        votes: Coll::from_db(db),
    };
    let deleted = run_transaction(db_client, cascade, |session, cascade| {
        cascade.attempt(session).boxed()
    })
    .await?;
    if deleted {
        info!("Deleted election {election_id} and everything it owned");
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::model::db::voting_code::NewVotingCode;

    use super::*;

    #[backend_test]
    async fn cascade_only_touches_owned_documents(db: Database) {
        let elections = Coll::<Election>::from_db(&db);
        let candidates = Coll::<Candidate>::from_db(&db);
        let classes = Coll::<SchoolClass>::from_db(&db);
        let codes = Coll::<NewVotingCode>::from_db(&db);
        let votes = Coll::<Vote>::from_db(&db);

        // Two elections with one of everything each.
        for election in [Election::example(), Election::active_example()] {
            let id = election.id;
            elections.insert_one(&election, None).await.unwrap();
            let candidate = Candidate::new(id * 10, id, "Ada".to_string(), None, None, None);
            candidates.insert_one(&candidate, None).await.unwrap();
            classes
                .insert_one(SchoolClass::new(id * 10, id, "5a".to_string(), 20), None)
                .await
                .unwrap();
            codes
                .insert_one(NewVotingCode::new(id, format!("CASCADE{id}"), None), None)
                .await
                .unwrap();
            votes
                .insert_one(Vote::new(id, candidate.id, Utc::now()), None)
                .await
                .unwrap();
        }

        let db_client = crate::db_client().await;
        assert!(delete_election(&db_client, &db, 1).await.unwrap());

        let remaining = doc! { "election_id": 2 };
        let gone = doc! { "election_id": 1 };
        assert_eq!(elections.count_documents(None, None).await.unwrap(), 1);
        for (coll, name) in [
            (candidates.count_documents(gone.clone(), None).await, "candidates"),
            (classes.count_documents(gone.clone(), None).await, "classes"),
            (codes.count_documents(gone.clone(), None).await, "codes"),
            (votes.count_documents(gone.clone(), None).await, "votes"),
        ] {
            assert_eq!(coll.unwrap(), 0, "{name} left behind");
        }
        assert_eq!(candidates.count_documents(remaining.clone(), None).await.unwrap(), 1);
        assert_eq!(classes.count_documents(remaining.clone(), None).await.unwrap(), 1);
        assert_eq!(codes.count_documents(remaining.clone(), None).await.unwrap(), 1);
        assert_eq!(votes.count_documents(remaining, None).await.unwrap(), 1);

        // A second delete finds nothing.
        assert!(!delete_election(&db_client, &db, 1).await.unwrap());
    }
}
