use std::collections::HashMap;

use mongodb::{
    bson::{self, doc},
    error::Error as DbError,
    options::{FindOptions, SessionOptions},
    Client, Database,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    common::election::CandidateId,
    db::{candidate::Candidate, election::Election, voting_code::VotingCode},
    mongodb::Coll,
};

use super::Vote;

/// Votes received by one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTally {
    pub candidate_id: CandidateId,
    pub name: String,
    pub class_name: Option<String>,
    pub votes: u64,
}

/// Point-in-time results of an election.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally {
    /// Most votes first; ties keep candidate insertion order.
    pub results: Vec<CandidateTally>,
    pub total_codes: u64,
    pub used_codes: u64,
    pub max_votes: u32,
}

/// One row of the `$group` stage.
#[derive(Deserialize)]
struct VoteCount {
    #[serde(rename = "_id")]
    candidate_id: CandidateId,
    votes: u64,
}

/// Order candidates by votes, most first. `candidates` must already be in
/// insertion order; the sort is stable, so ties keep it.
pub fn rank(candidates: Vec<Candidate>, counts: &HashMap<CandidateId, u64>) -> Vec<CandidateTally> {
    let mut results: Vec<_> = candidates
        .into_iter()
        .map(|candidate| CandidateTally {
            candidate_id: candidate.id,
            votes: counts.get(&candidate.id).copied().unwrap_or(0),
            name: candidate.candidate.name,
            class_name: candidate.candidate.class_name,
        })
        .collect();
    results.sort_by(|a, b| b.votes.cmp(&a.votes));
    results
}

/// Count the votes of an election.
///
/// Every read comes from one snapshot, so the counts agree with each other
/// even while votes are being cast.
pub async fn tally(db_client: &Client, db: &Database, election: &Election) -> Result<Tally> {
    let options = SessionOptions::builder().snapshot(true).build();
    let mut session = db_client.start_session(options).await?;
    let owned = doc! { "election_id": election.id };

    // Candidate IDs are allocated in insertion order.
    let by_id = FindOptions::builder().sort(doc! { "_id": 1 }).build();
    let mut candidates = Vec::new();
    let mut cursor = Coll::<Candidate>::from_db(db)
        .find_with_session(owned.clone(), by_id, &mut session)
        .await?;
    while let Some(candidate) = cursor.next(&mut session).await {
        candidates.push(candidate?);
    }

    let pipeline = [
        doc! { "$match": owned.clone() },
        doc! { "$group": { "_id": "$candidate_id", "votes": { "$sum": 1 } } },
    ];
    let mut counts = HashMap::new();
    let mut cursor = Coll::<Vote>::from_db(db)
        .aggregate_with_session(pipeline, None, &mut session)
        .await?;
    while let Some(row) = cursor.next(&mut session).await {
        let row: VoteCount = bson::from_document(row?).map_err(DbError::from)?;
        counts.insert(row.candidate_id, row.votes);
    }

    let codes = Coll::<VotingCode>::from_db(db);
    let total_codes = codes
        .count_documents_with_session(owned.clone(), None, &mut session)
        .await?;
    let mut used = owned;
    used.insert("is_used", true);
    let used_codes = codes
        .count_documents_with_session(used, None, &mut session)
        .await?;

    Ok(Tally {
        results: rank(candidates, &counts),
        total_codes,
        used_codes,
        max_votes: election.max_votes,
    })
}
