use std::collections::HashSet;

use chrono::Utc;
use log::{debug, info, warn};
use mongodb::{
    bson::{self, doc},
    error::Error as DbError,
    options::FindOptions,
    Client, ClientSession, Database,
};
use rocket::futures::{FutureExt, TryStreamExt};

use crate::error::Result;
use crate::model::{
    common::{election::CandidateId, redemption::RedemptionRejection},
    db::{candidate::Candidate, election::Election, voting_code::VotingCode},
    mongodb::{run_transaction, Coll},
};

use super::Vote;

/// Result of a redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// The code was consumed and this many votes were recorded.
    Recorded { votes: usize },
    Rejected(RedemptionRejection),
}

/// Result of looking up the ballot a code opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallotLookup {
    /// The election and its candidates, ordered by name.
    Open {
        election: Election,
        candidates: Vec<Candidate>,
    },
    Rejected(RedemptionRejection),
}

/// Steps 1 and 2: the code exists and has not been used.
pub fn check_code(code: Option<&VotingCode>) -> std::result::Result<&VotingCode, RedemptionRejection> {
    match code {
        None => Err(RedemptionRejection::InvalidCode),
        Some(code) if code.is_used => Err(RedemptionRejection::AlreadyUsed),
        Some(code) => Ok(code),
    }
}

/// Step 3: the code's election is accepting votes.
pub fn check_election(
    election: Option<&Election>,
) -> std::result::Result<&Election, RedemptionRejection> {
    match election {
        Some(election) if election.is_active => Ok(election),
        _ => Err(RedemptionRejection::ElectionInactive),
    }
}

/// Steps 4 to 6: the selection is non-empty, within the cap, and only names
/// distinct candidates of the election.
pub fn check_selection(
    selection: &[CandidateId],
    max_votes: u32,
    candidates: &HashSet<CandidateId>,
) -> std::result::Result<(), RedemptionRejection> {
    if selection.is_empty() {
        return Err(RedemptionRejection::EmptySelection);
    }
    if selection.len() > max_votes as usize {
        return Err(RedemptionRejection::TooManySelections { max: max_votes });
    }
    let mut seen = HashSet::with_capacity(selection.len());
    if selection
        .iter()
        .any(|id| !candidates.contains(id) || !seen.insert(*id))
    {
        return Err(RedemptionRejection::InvalidCandidate);
    }
    Ok(())
}

/// Normalise a code as typed by a student.
fn normalise(code: &str) -> &str {
    code.trim()
}

/// Everything the redemption transaction touches.
struct Redemption {
    code: String,
    selection: Vec<CandidateId>,
    codes: Coll<VotingCode>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    votes: Coll<Vote>,
}

impl Redemption {
    async fn attempt(
        &self,
        session: &mut ClientSession,
    ) -> std::result::Result<RedemptionOutcome, DbError> {
        let code = self
            .codes
            .find_one_with_session(doc! { "code": &self.code }, None, session)
            .await?;
        let code = match check_code(code.as_ref()) {
            Ok(code) => code,
            Err(rejection) => return Ok(RedemptionOutcome::Rejected(rejection)),
        };

        let election = self
            .elections
            .find_one_with_session(doc! { "_id": code.election_id }, None, session)
            .await?;
        let election = match check_election(election.as_ref()) {
            Ok(election) => election,
            Err(rejection) => return Ok(RedemptionOutcome::Rejected(rejection)),
        };

        let mut valid = HashSet::new();
        let mut cursor = self
            .candidates
            .find_with_session(doc! { "election_id": election.id }, None, session)
            .await?;
        while let Some(candidate) = cursor.next(session).await {
            valid.insert(candidate?.id);
        }
        if let Err(rejection) = check_selection(&self.selection, election.max_votes, &valid) {
            return Ok(RedemptionOutcome::Rejected(rejection));
        }

        // Touch every selected candidate, so that deleting one of them while
        // this ballot is in flight is a write conflict rather than an orphaned vote.
        let touched = self
            .candidates
            .update_many_with_session(
                doc! { "_id": { "$in": self.selection.as_slice() }, "election_id": election.id },
                doc! { "$inc": { "version": 1 } },
                None,
                session,
            )
            .await?;
        if touched.matched_count != self.selection.len() as u64 {
            return Ok(RedemptionOutcome::Rejected(RedemptionRejection::InvalidCandidate));
        }

        // Only an unused code can be consumed; losing a race shows up here or
        // as a write conflict that retries the whole transaction.
        let consumed = self
            .codes
            .update_one_with_session(
                doc! { "_id": code.id, "is_used": false },
                doc! { "$set": { "is_used": true, "used_at": bson::DateTime::now() } },
                None,
                session,
            )
            .await?;
        if consumed.modified_count != 1 {
            return Ok(RedemptionOutcome::Rejected(RedemptionRejection::AlreadyUsed));
        }

        let now = Utc::now();
        let ballot: Vec<Vote> = self
            .selection
            .iter()
            .map(|&candidate_id| Vote::new(election.id, candidate_id, now))
            .collect();
        self.votes
            .insert_many_with_session(&ballot, None, session)
            .await?;
        Ok(RedemptionOutcome::Recorded {
            votes: ballot.len(),
        })
    }
}

/// Redeem a voting code for the given selection.
///
/// Consuming the code and recording the votes commit together or not at all.
pub async fn redeem(
    db_client: &Client,
    db: &Database,
    code: &str,
    selection: Vec<CandidateId>,
) -> Result<RedemptionOutcome> {
    let code = normalise(code);
    if code.is_empty() {
        return Ok(RedemptionOutcome::Rejected(RedemptionRejection::InvalidCode));
    }

    let redemption = Redemption {
        code: code.to_string(),
        selection,
        codes: Coll::from_db(db),
        elections: Coll::from_db(db),
        candidates: Coll::from_db(db),
        votes: Coll::from_db(db),
    };
    let outcome = run_transaction(db_client, redemption, |session, redemption| {
        redemption.attempt(session).boxed()
    })
    .await?;

    // Never log the code next to what it voted for.
    match &outcome {
        RedemptionOutcome::Recorded { votes } => info!("Recorded a ballot with {votes} vote(s)"),
        RedemptionOutcome::Rejected(rejection) if rejection.is_tampering() => {
            warn!("Rejected a tampered ballot: {rejection}")
        }
        RedemptionOutcome::Rejected(rejection) => debug!("Rejected a ballot: {rejection}"),
    }
    Ok(outcome)
}

/// Look up the ballot a code opens, without consuming it.
pub async fn open_ballot(db: &Database, code: &str) -> Result<BallotLookup> {
    let code = normalise(code);
    let found = if code.is_empty() {
        None
    } else {
        Coll::<VotingCode>::from_db(db)
            .find_one(doc! { "code": code }, None)
            .await?
    };
    let code = match check_code(found.as_ref()) {
        Ok(code) => code,
        Err(rejection) => return Ok(BallotLookup::Rejected(rejection)),
    };

    let election = Coll::<Election>::from_db(db)
        .find_one(doc! { "_id": code.election_id }, None)
        .await?;
    let election = match check_election(election.as_ref()) {
        Ok(election) => election.clone(),
        Err(rejection) => return Ok(BallotLookup::Rejected(rejection)),
    };

    let by_name = FindOptions::builder().sort(doc! { "name": 1, "_id": 1 }).build();
    let candidates = Coll::<Candidate>::from_db(db)
        .find(doc! { "election_id": election.id }, by_name)
        .await?
        .try_collect()
        .await?;
    Ok(BallotLookup::Open {
        election,
        candidates,
    })
}
