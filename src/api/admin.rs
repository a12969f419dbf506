use log::info;
use mongodb::{bson::doc, options::FindOptions, Client, Database};
use rocket::{futures::TryStreamExt, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            candidate::{CandidateDescription, CandidateSpec},
            election::{ElectionDescription, ElectionResults, ElectionSpec, ElectionSummary, ToggleReply},
            school_class::{SchoolClassDescription, SchoolClassSpec},
            settings::SchoolSettings,
        },
        common::election::{CandidateId, ElectionId, SchoolClassId},
        db::{
            candidate::{delete_candidate, Candidate},
            election::{delete_election, toggle_election, Election},
            school_class::SchoolClass,
            settings::Settings,
            vote::tally,
        },
        mongodb::{Coll, Counter, CANDIDATE_ID_COUNTER, ELECTION_ID_COUNTER, SCHOOL_CLASS_ID_COUNTER},
    },
};

use super::common::election_by_id;

pub fn routes() -> Vec<Route> {
    routes![
        update_settings,
        elections,
        election,
        create_election,
        remove_election,
        toggle,
        add_candidate,
        remove_candidate,
        add_class,
        remove_class,
        results,
    ]
}

#[put("/admin/settings", data = "<new_settings>", format = "json")]
async fn update_settings(
    _token: AuthToken,
    new_settings: Json<SchoolSettings>,
    settings: Coll<Settings>,
) -> Result<Json<SchoolSettings>> {
    let new_settings = new_settings.0.normalise();
    let updated = Settings::update(&settings, &new_settings.school_name, new_settings.logo.as_deref()).await?;
    Ok(Json(updated.into()))
}

#[get("/admin/elections")]
async fn elections(_token: AuthToken, elections: Coll<Election>) -> Result<Json<Vec<ElectionSummary>>> {
    let newest_first = FindOptions::builder()
        .sort(doc! { "year": -1, "_id": -1 })
        .build();
    let summaries = elections
        .find(None, newest_first)
        .await?
        .map_ok(ElectionSummary::from)
        .try_collect()
        .await?;
    Ok(Json(summaries))
}

#[get("/admin/elections/<election_id>")]
async fn election(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    classes: Coll<SchoolClass>,
) -> Result<Json<ElectionDescription>> {
    let election = election_by_id(election_id, &elections).await?;

    let owned = doc! { "election_id": election_id };
    let by_name = FindOptions::builder().sort(doc! { "name": 1, "_id": 1 }).build();
    let candidates = candidates
        .find(owned.clone(), by_name)
        .await?
        .map_ok(CandidateDescription::from)
        .try_collect()
        .await?;
    let mut classes: Vec<SchoolClass> = classes.find(owned, None).await?.try_collect().await?;
    SchoolClass::sort(&mut classes);

    Ok(Json(ElectionDescription {
        election: election.into(),
        candidates,
        classes: classes.into_iter().map(SchoolClassDescription::from).collect(),
    }))
}

#[post("/admin/elections", data = "<spec>", format = "json")]
async fn create_election(
    _token: AuthToken,
    spec: Json<ElectionSpec>,
    elections: Coll<Election>,
    counters: Coll<Counter>,
) -> Result<Json<ElectionSummary>> {
    spec.validate()?;
    let election_id = Counter::next(&counters, ELECTION_ID_COUNTER).await?;
    let election = spec.0.into_election(election_id);
    elections.insert_one(&election, None).await?;
    info!("Created election {election_id}");
    Ok(Json(election.into()))
}

#[delete("/admin/elections/<election_id>")]
async fn remove_election(
    _token: AuthToken,
    election_id: ElectionId,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<()> {
    if delete_election(db_client, db, election_id).await? {
        Ok(())
    } else {
        Err(Error::not_found(format!("Election {election_id}")))
    }
}

#[post("/admin/elections/<election_id>/toggle")]
async fn toggle(
    _token: AuthToken,
    election_id: ElectionId,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ToggleReply>> {
    let outcome = toggle_election(db_client, db, election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
    ToggleReply::try_from(outcome)
        .map(Json)
        .map_err(|()| Error::NoCodesGenerated)
}

#[post("/admin/elections/<election_id>/candidates", data = "<spec>", format = "json")]
async fn add_candidate(
    _token: AuthToken,
    election_id: ElectionId,
    spec: Json<CandidateSpec>,
    elections: Coll<Election>,
    candidates: Coll<Candidate>,
    counters: Coll<Counter>,
) -> Result<Json<CandidateDescription>> {
    spec.validate()?;
    election_by_id(election_id, &elections).await?;

    let candidate_id = Counter::next(&counters, CANDIDATE_ID_COUNTER).await?;
    let candidate = spec.0.into_candidate(candidate_id, election_id);
    candidates.insert_one(&candidate, None).await?;
    Ok(Json(candidate.into()))
}

#[delete("/admin/candidates/<candidate_id>")]
async fn remove_candidate(
    _token: AuthToken,
    candidate_id: CandidateId,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<()> {
    if delete_candidate(db_client, db, candidate_id).await? {
        Ok(())
    } else {
        Err(Error::not_found(format!("Candidate {candidate_id}")))
    }
}

#[post("/admin/elections/<election_id>/classes", data = "<spec>", format = "json")]
async fn add_class(
    _token: AuthToken,
    election_id: ElectionId,
    spec: Json<SchoolClassSpec>,
    elections: Coll<Election>,
    classes: Coll<SchoolClass>,
    counters: Coll<Counter>,
) -> Result<Json<SchoolClassDescription>> {
    spec.validate()?;
    election_by_id(election_id, &elections).await?;

    let class_id = Counter::next(&counters, SCHOOL_CLASS_ID_COUNTER).await?;
    let class = spec.0.into_class(class_id, election_id);
    classes.insert_one(&class, None).await?;
    Ok(Json(class.into()))
}

/// Codes already generated for the class keep their label.
#[delete("/admin/classes/<class_id>")]
async fn remove_class(_token: AuthToken, class_id: SchoolClassId, classes: Coll<SchoolClass>) -> Result<()> {
    let result = classes.delete_one(doc! { "_id": class_id }, None).await?;
    if result.deleted_count == 0 {
        Err(Error::not_found(format!("Class {class_id}")))
    } else {
        Ok(())
    }
}

#[get("/admin/elections/<election_id>/results")]
async fn results(
    _token: AuthToken,
    election_id: ElectionId,
    elections: Coll<Election>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<ElectionResults>> {
    let election = election_by_id(election_id, &elections).await?;
    let tally = tally(db_client, db, &election).await?;
    Ok(Json(tally.into()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{serde_json::json, Value},
    };

    use crate::model::{
        api::codes::GenerateCodesRequest,
        db::{vote::Vote, voting_code::VotingCode},
    };

    use super::*;

    async fn create(client: &Client, spec: &ElectionSpec) -> ElectionSummary {
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(admin)]
    async fn create_list_get(client: Client) {
        let first = create(&client, &ElectionSpec::example()).await;
        let second = create(&client, &ElectionSpec::example2()).await;
        assert_eq!(first.name, ElectionSpec::example().name);
        assert!(!first.is_active);

        // Newest year first, then newest ID.
        let response = client.get(uri!(elections)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let listed: Vec<ElectionSummary> = response.into_json().await.unwrap();
        let listed: Vec<_> = listed.into_iter().map(|e| (e.year, e.id)).collect();
        let mut expected = vec![(first.year, first.id), (second.year, second.id)];
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(listed, expected);

        let response = client.get(uri!(election(first.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let description: ElectionDescription = response.into_json().await.unwrap();
        assert_eq!(description.election.id, first.id);
        assert_eq!(description.election.name, first.name);
        assert!(description.candidates.is_empty());
        assert!(description.classes.is_empty());
    }

    #[backend_test(admin)]
    async fn invalid_specs_are_rejected(client: Client) {
        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(json!({ "name": "  ", "year": 2025 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let election = create(&client, &ElectionSpec::example()).await;
        let response = client
            .post(uri!(add_candidate(election.id)))
            .header(ContentType::JSON)
            .body(json!({ "name": "" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());

        let response = client
            .post(uri!(add_class(election.id)))
            .header(ContentType::JSON)
            .body(json!(SchoolClassSpec::example(" ", 20)).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(admin)]
    async fn election_lists_candidates_and_classes_in_order(client: Client) {
        let election = create(&client, &ElectionSpec::example()).await;
        let mut specs = CandidateSpec::examples();
        specs.reverse();
        for spec in specs {
            let response = client
                .post(uri!(add_candidate(election.id)))
                .header(ContentType::JSON)
                .body(json!(spec).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
        }
        for name in ["10d", "Staff", "5b", "5a"] {
            let response = client
                .post(uri!(add_class(election.id)))
                .header(ContentType::JSON)
                .body(json!(SchoolClassSpec::example(name, 20)).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
        }

        let description: ElectionDescription = client
            .get(uri!(election(election.id)))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let candidates: Vec<_> = description.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(candidates, ["Alice Adams", "Ben Brooks", "Chloe Clark"]);
        let classes: Vec<_> = description.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(classes, ["5a", "5b", "10d", "Staff"]);
    }

    #[backend_test(admin)]
    async fn candidates_need_an_election(client: Client) {
        let response = client
            .post(uri!(add_candidate(404_u32)))
            .header(ContentType::JSON)
            .body(json!(CandidateSpec::examples()[0]).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn toggle_lifecycle(client: Client) {
        let election = create(&client, &ElectionSpec::example()).await;

        // No codes yet.
        let response = client.post(uri!(toggle(election.id))).dispatch().await;
        assert_eq!(Status::Conflict, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["rejected"], "no_codes_generated");

        let response = client
            .post(format!("/admin/elections/{}/codes", election.id))
            .header(ContentType::JSON)
            .body(json!(GenerateCodesRequest { count: 3 }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let response = client.post(uri!(toggle(election.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<ToggleReply>().await,
            Some(ToggleReply::Activated)
        );

        let response = client.post(uri!(toggle(election.id))).dispatch().await;
        assert_eq!(
            response.into_json::<ToggleReply>().await,
            Some(ToggleReply::Deactivated)
        );

        let response = client.post(uri!(toggle(404_u32))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn delete_election_cascades(client: Client, codes: Coll<VotingCode>, votes: Coll<Vote>) {
        let election = create(&client, &ElectionSpec::example()).await;
        client
            .post(format!("/admin/elections/{}/codes", election.id))
            .header(ContentType::JSON)
            .body(json!(GenerateCodesRequest { count: 2 }).to_string())
            .dispatch()
            .await;

        let response = client.delete(uri!(remove_election(election.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let owned = doc! { "election_id": election.id };
        assert_eq!(codes.count_documents(owned.clone(), None).await.unwrap(), 0);
        assert_eq!(votes.count_documents(owned, None).await.unwrap(), 0);

        let response = client.get(uri!(election(election.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.delete(uri!(remove_election(election.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn remove_candidates_and_classes(client: Client) {
        let election = create(&client, &ElectionSpec::example()).await;
        let candidate: CandidateDescription = client
            .post(uri!(add_candidate(election.id)))
            .header(ContentType::JSON)
            .body(json!(CandidateSpec::examples()[0]).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let class: SchoolClassDescription = client
            .post(uri!(add_class(election.id)))
            .header(ContentType::JSON)
            .body(json!(SchoolClassSpec::example("7b", 28)).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        let response = client.delete(uri!(remove_candidate(candidate.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let response = client.delete(uri!(remove_class(class.id))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let response = client.delete(uri!(remove_candidate(candidate.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client.delete(uri!(remove_class(class.id))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(admin)]
    async fn update_school_name(client: Client) {
        let response = client
            .put(uri!(update_settings))
            .header(ContentType::JSON)
            .body(json!({ "school_name": " Hilltop Secondary " }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());

        let settings: SchoolSettings = client.get("/settings").dispatch().await.into_json().await.unwrap();
        assert_eq!(settings.school_name, "Hilltop Secondary");
        assert_eq!(settings.logo, None);

        let response = client
            .put(uri!(update_settings))
            .header(ContentType::JSON)
            .body(json!({ "school_name": "Hilltop Secondary", "logo": "crest.png" }).to_string())
            .dispatch()
            .await;
        let settings: SchoolSettings = response.into_json().await.unwrap();
        assert_eq!(settings.logo.as_deref(), Some("crest.png"));
    }

    #[backend_test]
    async fn admin_routes_need_login(client: Client) {
        let response = client.get(uri!(elections)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        let response = client
            .post(uri!(create_election))
            .header(ContentType::JSON)
            .body(json!(ElectionSpec::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());

        let response = client.get(uri!(results(1_u32))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }
}
