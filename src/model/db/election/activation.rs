use log::{info, warn};
use mongodb::{bson::doc, error::Error as DbError, Client, ClientSession, Database};
use rocket::futures::FutureExt;

use crate::error::Result;
use crate::model::{
    common::election::ElectionId,
    db::voting_code::VotingCode,
    mongodb::{run_transaction, Coll, Counter, ELECTION_ACTIVATION_COUNTER},
};

use super::Election;

/// Result of toggling an election's active flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Activated,
    Deactivated,
    /// Activation refused: the election has no voting codes.
    NoCodesGenerated,
}

/// Everything the toggle transaction touches.
struct Toggle {
    election_id: ElectionId,
    elections: Coll<Election>,
    codes: Coll<VotingCode>,
    counters: Coll<Counter>,
}

impl Toggle {
    async fn attempt(
        &self,
        session: &mut ClientSession,
    ) -> std::result::Result<Option<ToggleOutcome>, DbError> {
        let filter = doc! { "_id": self.election_id };
        let Some(election) = self
            .elections
            .find_one_with_session(filter.clone(), None, session)
            .await?
        else {
            return Ok(None);
        };

        if election.is_active {
            self.elections
                .update_one_with_session(filter, doc! { "$set": { "is_active": false } }, None, session)
                .await?;
            return Ok(Some(ToggleOutcome::Deactivated));
        }

        let code_count = self
            .codes
            .count_documents_with_session(doc! { "election_id": self.election_id }, None, session)
            .await?;
        if code_count == 0 {
            return Ok(Some(ToggleOutcome::NoCodesGenerated));
        }

        // Every activation writes this document, so two concurrent activations
        // of different elections conflict instead of both committing.
        Counter::bump_with_session(&self.counters, ELECTION_ACTIVATION_COUNTER, session).await?;
        self.elections
            .update_many_with_session(
                doc! { "is_active": true },
                doc! { "$set": { "is_active": false } },
                None,
                session,
            )
            .await?;
        self.elections
            .update_one_with_session(filter, doc! { "$set": { "is_active": true } }, None, session)
            .await?;
        Ok(Some(ToggleOutcome::Activated))
    }
}

/// Flip the active flag of an election.
///
/// Activating an election deactivates every other one in the same transaction.
/// Returns `None` if the election does not exist.
pub async fn toggle_election(
    db_client: &Client,
    db: &Database,
    election_id: ElectionId,
) -> Result<Option<ToggleOutcome>> {
    let toggle = Toggle {
        election_id,
        elections: Coll::from_db(db),
        codes: Coll::from_db(db),
        counters: Coll::from_db(db),
    };
    let outcome = run_transaction(db_client, toggle, |session, toggle| {
        toggle.attempt(session).boxed()
    })
    .await?;

    match outcome {
        Some(ToggleOutcome::Activated) => info!("Election {election_id} activated"),
        Some(ToggleOutcome::Deactivated) => info!("Election {election_id} deactivated"),
        Some(ToggleOutcome::NoCodesGenerated) => {
            warn!("Refused to activate election {election_id}: no voting codes generated")
        }
        None => {}
    }
    Ok(outcome)
}
