use mongodb::{
    bson::doc,
    error::Error as DbError,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
    ClientSession,
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// Allocates election IDs.
pub const ELECTION_ID_COUNTER: &str = "election_id";
/// Allocates candidate IDs.
pub const CANDIDATE_ID_COUNTER: &str = "candidate_id";
/// Allocates school class IDs.
pub const SCHOOL_CLASS_ID_COUNTER: &str = "school_class_id";
/// Written by every activation transaction so that concurrent activations conflict.
pub const ELECTION_ACTIVATION_COUNTER: &str = "election_activation";

const ALL_COUNTERS: [&str; 4] = [
    ELECTION_ID_COUNTER,
    CANDIDATE_ID_COUNTER,
    SCHOOL_CLASS_ID_COUNTER,
    ELECTION_ACTIVATION_COUNTER,
];

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u32,
}

impl Counter {
    /// Create a new `Counter` starting at the given value.
    pub fn new(id: impl Into<String>, start: u32) -> Self {
        Self {
            id: id.into(),
            next: start,
        }
    }

    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u32> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {}", id),
                )
            })?;
        Ok(counter.next)
    }

    /// Increment the counter with the given ID as part of the session's transaction.
    /// The value itself is irrelevant; the write makes concurrent transactions
    /// that bump the same counter conflict with each other.
    pub async fn bump_with_session(
        counters: &Coll<Counter>,
        id: &str,
        session: &mut ClientSession,
    ) -> std::result::Result<(), DbError> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options = UpdateOptions::builder().upsert(true).build();
        counters
            .update_one_with_session(doc! { "_id": id }, update, options, session)
            .await?;
        Ok(())
    }
}

/// Ensure every counter the application relies on exists, without resetting
/// any that already do.
///
/// This operation is idempotent.
pub async fn ensure_counters_exist(counters: &Coll<Counter>) -> std::result::Result<(), DbError> {
    let options = UpdateOptions::builder().upsert(true).build();
    for id in ALL_COUNTERS {
        let update = doc! {
            "$setOnInsert": { "next": 1_u32 }
        };
        counters
            .update_one(doc! { "_id": id }, update, options.clone())
            .await?;
    }
    Ok(())
}
