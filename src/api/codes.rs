use mongodb::{bson::doc, options::FindOptions, Database};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            codes::{ClassCodeCount, CodeDescription, CodeOverview, CodeSheet, GenerateCodesRequest, GenerationReport},
        },
        common::election::ElectionId,
        db::{
            election::Election,
            school_class::SchoolClass,
            voting_code::{generate_codes, generate_for_classes, VotingCode},
        },
        mongodb::Coll,
    },
};

use super::common::election_by_id;

pub fn routes() -> Vec<Route> {
    routes![overview, generate, generate_classes, sheet]
}

/// Creation order; object IDs grow with insertion time.
fn creation_order() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

#[get("/admin/elections/<election_id>/codes")]
async fn overview(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    codes: Coll<VotingCode>,
    classes: Coll<SchoolClass>,
) -> Result<Json<CodeOverview>> {
    election_by_id(election_id, &elections).await?;

    let owned = doc! { "election_id": election_id };
    let all_codes: Vec<CodeDescription> = codes
        .find(owned.clone(), creation_order())
        .await?
        .map_ok(CodeDescription::from)
        .try_collect()
        .await?;
    let used = all_codes.iter().filter(|code| code.is_used).count();

    let mut election_classes: Vec<SchoolClass> = classes.find(owned, None).await?.try_collect().await?;
    SchoolClass::sort(&mut election_classes);
    let mut class_counts = Vec::with_capacity(election_classes.len());
    for class in election_classes {
        let filter = doc! { "election_id": election_id, "class_name": &class.name };
        let count = codes.count_documents(filter, None).await?;
        class_counts.push(ClassCodeCount::new(class, count));
    }

    Ok(Json(CodeOverview {
        codes: all_codes,
        used,
        classes: class_counts,
    }))
}

#[post("/admin/elections/<election_id>/codes", data = "<request>", format = "json")]
async fn generate(
    _token: AuthToken,
    election_id: ElectionId,
    request: Json<GenerateCodesRequest>,
    elections: Coll<Election>,
    db: &State<Database>,
) -> Result<Json<GenerationReport>> {
    election_by_id(election_id, &elections).await?;
    let report = generate_codes(db, election_id, request.count).await?;
    Ok(Json(report))
}

#[post("/admin/elections/<election_id>/codes/classes")]
async fn generate_classes(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    db: &State<Database>,
) -> Result<Json<GenerationReport>> {
    election_by_id(election_id, &elections).await?;
    let report = generate_for_classes(db, election_id).await?;
    Ok(Json(report))
}

/// Unused codes, ready to print.
#[get("/admin/elections/<election_id>/codes/sheet?<class_name>")]
async fn sheet(
    _token: AuthToken,
    election_id: ElectionId,
    class_name: Option<String>,
    elections: Coll<Election>,
    codes: Coll<VotingCode>,
    config: &State<Config>,
) -> Result<Json<CodeSheet>> {
    let election = election_by_id(election_id, &elections).await?;

    let mut filter = doc! { "election_id": election_id, "is_used": false };
    if let Some(class_name) = &class_name {
        filter.insert("class_name", class_name.as_str());
    }
    let unused: Vec<VotingCode> = codes
        .find(filter, creation_order())
        .await?
        .try_collect()
        .await?;
    if unused.is_empty() {
        return Err(Error::not_found("Unused codes".to_string()));
    }

    Ok(Json(CodeSheet::new(election, unused, config.base_url())))
}
