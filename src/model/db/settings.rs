use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// `_id` of the only settings document.
const SETTINGS_ID: &str = "school";

/// School-wide settings. Exactly one document exists.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_id")]
    pub id: String,
    pub school_name: String,
    /// Opaque reference to the school logo.
    #[serde(default)]
    pub logo: Option<String>,
}

impl Settings {
    /// Fetch the settings, creating the default document if there is none.
    ///
    /// This operation is idempotent.
    pub async fn get_or_create(settings: &Coll<Settings>) -> Result<Settings> {
        Self::upsert(
            settings,
            doc! { "$setOnInsert": { "school_name": "", "logo": null } },
        )
        .await
    }

    /// Replace the school name and logo reference.
    pub async fn update(
        settings: &Coll<Settings>,
        school_name: &str,
        logo: Option<&str>,
    ) -> Result<Settings> {
        Self::upsert(
            settings,
            doc! { "$set": { "school_name": school_name, "logo": logo } },
        )
        .await
    }

    async fn upsert(settings: &Coll<Settings>, update: mongodb::bson::Document) -> Result<Settings> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        settings
            .find_one_and_update(doc! { "_id": SETTINGS_ID }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    "Settings upsert returned no document".to_string(),
                )
            })
    }
}
