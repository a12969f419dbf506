use mongodb::bson::doc;

use crate::error::{Error, Result};
use crate::model::{common::election::ElectionId, db::election::Election, mongodb::Coll};

/// Fetch an election, or fail with 404.
pub async fn election_by_id(election_id: ElectionId, elections: &Coll<Election>) -> Result<Election> {
    elections
        .find_one(doc! { "_id": election_id }, None)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))
}
