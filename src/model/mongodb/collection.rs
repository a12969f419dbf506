use std::ops::Deref;

use log::debug;
use mongodb::{
    bson::doc, error::Error as DbError, options::IndexOptions, Collection, Database, IndexModel,
};
use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::model::db::{
    candidate::Candidate,
    election::Election,
    school_class::SchoolClass,
    settings::Settings,
    vote::Vote,
    voting_code::{NewVotingCode, VotingCode},
};

use super::counter::Counter;

/// A type that can be directly inserted/read to/from the database.
pub trait MongoCollection {
    /// The name of the collection.
    const NAME: &'static str;
}

/// A database collection of the given type.
pub struct Coll<T>(Collection<T>);

impl<T> Coll<T>
where
    T: MongoCollection,
{
    /// Get a handle on this collection in the given database.
    pub fn from_db(db: &Database) -> Self {
        Self(db.collection(T::NAME))
    }
}

// `Derive(Clone)` would only derive if `T: Clone`, but we don't need that bound.
impl<T> Clone for Coll<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Deref for Coll<T> {
    type Target = Collection<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T> FromRequest<'r> for Coll<T>
where
    T: MongoCollection,
{
    type Error = ();

    /// Get the database connection from the managed state and wrap it in a collection.
    ///
    /// Panics iff the [`Database`] is not managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = req.guard::<&State<Database>>().await.unwrap();
        request::Outcome::Success(Coll::from_db(db))
    }
}

// Election collection
impl MongoCollection for Election {
    const NAME: &'static str = "elections";
}

// Candidate collection
impl MongoCollection for Candidate {
    const NAME: &'static str = "candidates";
}

// School class collection
impl MongoCollection for SchoolClass {
    const NAME: &'static str = "school_classes";
}

// Voting code collections
const VOTING_CODES: &str = "voting_codes";
impl MongoCollection for VotingCode {
    const NAME: &'static str = VOTING_CODES;
}
impl MongoCollection for NewVotingCode {
    const NAME: &'static str = VOTING_CODES;
}

// Vote collection
impl MongoCollection for Vote {
    const NAME: &'static str = "votes";
}

// Counter collection
impl MongoCollection for Counter {
    const NAME: &'static str = "counters";
}

// Settings collection
impl MongoCollection for Settings {
    const NAME: &'static str = "settings";
}

/// Ensure that all the required indexes exist on the given database.
///
/// This operation is idempotent.
pub async fn ensure_indexes_exist(db: &Database) -> Result<(), DbError> {
    debug!("Ensuring collection indexes exist");

    let unique = IndexOptions::builder().unique(true).build();

    // Voting codes are globally unique, across all elections.
    let code_index = IndexModel::builder()
        .keys(doc! {"code": 1})
        .options(unique)
        .build();
    let class_codes_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "class_name": 1})
        .build();
    let codes = Coll::<VotingCode>::from_db(db);
    codes.create_index(code_index, None).await?;
    codes.create_index(class_codes_index, None).await?;

    // At most one election may be active; the partial filter leaves inactive ones unconstrained.
    let single_active = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {"is_active": true})
        .build();
    let active_index = IndexModel::builder()
        .keys(doc! {"is_active": 1})
        .options(single_active)
        .build();
    Coll::<Election>::from_db(db)
        .create_index(active_index, None)
        .await?;

    // Per-election lookups.
    let by_election = || IndexModel::builder().keys(doc! {"election_id": 1}).build();
    Coll::<Candidate>::from_db(db)
        .create_index(by_election(), None)
        .await?;
    Coll::<SchoolClass>::from_db(db)
        .create_index(by_election(), None)
        .await?;

    // Tally.
    let tally_index = IndexModel::builder()
        .keys(doc! {"election_id": 1, "candidate_id": 1})
        .build();
    Coll::<Vote>::from_db(db)
        .create_index(tally_index, None)
        .await?;

    Ok(())
}
