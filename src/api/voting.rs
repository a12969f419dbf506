use mongodb::{Client, Database};
use rocket::{serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    model::{
        api::{
            ballot::{BallotDescription, VoteReply, VoteSubmission},
            settings::SchoolSettings,
        },
        db::{
            settings::Settings,
            vote::{open_ballot, redeem, BallotLookup, RedemptionOutcome},
        },
        mongodb::Coll,
    },
    rate_limit::WithinRateLimit,
};

pub fn routes() -> Vec<Route> {
    routes![school_settings, ballot, vote]
}

#[get("/settings")]
async fn school_settings(settings: Coll<Settings>) -> Result<Json<SchoolSettings>> {
    let settings = Settings::get_or_create(&settings).await?;
    Ok(Json(settings.into()))
}

#[get("/vote/<code>")]
async fn ballot(_limit: WithinRateLimit, code: &str, db: &State<Database>) -> Result<Json<BallotDescription>> {
    match open_ballot(db, code).await? {
        BallotLookup::Open {
            election,
            candidates,
        } => Ok(Json(BallotDescription::new(election, candidates))),
        BallotLookup::Rejected(rejection) => Err(Error::Rejected(rejection)),
    }
}

#[post("/vote/<code>", data = "<submission>", format = "json")]
async fn vote(
    _limit: WithinRateLimit,
    code: &str,
    submission: Json<VoteSubmission>,
    db_client: &State<Client>,
    db: &State<Database>,
) -> Result<Json<VoteReply>> {
    match redeem(db_client, db, code, submission.0.candidates).await? {
        RedemptionOutcome::Recorded { .. } => Ok(Json(VoteReply::Success)),
        RedemptionOutcome::Rejected(rejection) => Err(Error::Rejected(rejection)),
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::{Client, LocalResponse},
        serde::json::{serde_json::json, Value},
    };

    use crate::model::{
        api::{
            candidate::{CandidateDescription, CandidateSpec},
            election::{ElectionResults, ElectionSpec, ElectionSummary},
        },
        common::election::{CandidateId, ElectionId},
        db::{
            election::Election,
            vote::Vote,
            voting_code::{NewVotingCode, VotingCode},
        },
    };

    use super::*;

    /// Create an election with the example candidates through the admin API.
    async fn set_up_election(client: &Client) -> (ElectionId, Vec<CandidateId>) {
        let election: ElectionSummary = client
            .post("/admin/elections")
            .header(ContentType::JSON)
            .body(json!(ElectionSpec::example()).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();

        let mut candidate_ids = Vec::new();
        for spec in CandidateSpec::examples() {
            let candidate: CandidateDescription = client
                .post(format!("/admin/elections/{}/candidates", election.id))
                .header(ContentType::JSON)
                .body(json!(spec).to_string())
                .dispatch()
                .await
                .into_json()
                .await
                .unwrap();
            candidate_ids.push(candidate.id);
        }
        (election.id, candidate_ids)
    }

    async fn insert_code(codes: &Coll<NewVotingCode>, election_id: ElectionId, code: &str) {
        codes
            .insert_one(NewVotingCode::new(election_id, code.to_string(), None), None)
            .await
            .unwrap();
    }

    async fn activate(client: &Client, election_id: ElectionId) {
        let response = client
            .post(format!("/admin/elections/{election_id}/toggle"))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
    }

    async fn submit<'c>(client: &'c Client, code: &str, candidates: &[CandidateId]) -> LocalResponse<'c> {
        client
            .post(uri!(vote(code)))
            .header(ContentType::JSON)
            .body(json!({ "candidates": candidates }).to_string())
            .dispatch()
            .await
    }

    async fn rejection(response: LocalResponse<'_>) -> (Status, String) {
        let status = response.status();
        let body: Value = response.into_json().await.unwrap();
        (status, body["rejected"].as_str().unwrap_or_default().to_string())
    }

    #[backend_test(admin)]
    async fn student_council_walkthrough(client: Client, codes: Coll<NewVotingCode>) {
        let (election_id, ids) = set_up_election(&client).await;
        let (alice, ben) = (ids[0], ids[1]);
        insert_code(&codes, election_id, "AB12CD34").await;
        insert_code(&codes, election_id, "EF56GH78").await;
        activate(&client, election_id).await;

        // The code opens the ballot.
        let response = client.get(uri!(ballot("AB12CD34"))).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let description: BallotDescription = response.into_json().await.unwrap();
        assert_eq!(description.election.id, election_id);
        assert_eq!(description.election.max_votes, 2);
        let names: Vec<_> = description.candidates.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Alice Adams", "Ben Brooks", "Chloe Clark"]);

        let response = submit(&client, "AB12CD34", &[alice, ben]).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(response.into_json::<VoteReply>().await, Some(VoteReply::Success));

        // Second use of the same code.
        let response = submit(&client, "AB12CD34", &[alice]).await;
        assert_eq!(rejection(response).await, (Status::Conflict, "already_used".to_string()));
        let response = client.get(uri!(ballot("AB12CD34"))).dispatch().await;
        assert_eq!(Status::Conflict, response.status());

        // Too many selections leave the fresh code usable.
        let response = submit(&client, "EF56GH78", &ids).await;
        assert_eq!(
            rejection(response).await,
            (Status::UnprocessableEntity, "too_many_selections".to_string())
        );
        let response = client.get(uri!(ballot("EF56GH78"))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let results: ElectionResults = client
            .get(format!("/admin/elections/{election_id}/results"))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let tally: Vec<_> = results
            .results
            .iter()
            .map(|r| (r.name.as_str(), r.votes))
            .collect();
        assert_eq!(tally, [("Alice Adams", 1), ("Ben Brooks", 1), ("Chloe Clark", 0)]);
        assert_eq!(results.total_codes, 2);
        assert_eq!(results.used_codes, 1);
        assert_eq!(results.max_votes, 2);
    }

    #[backend_test(admin)]
    async fn rejections_by_reason(client: Client, codes: Coll<NewVotingCode>, votes: Coll<Vote>) {
        let (election_id, ids) = set_up_election(&client).await;
        insert_code(&codes, election_id, "QRST2345").await;

        // Not yet active.
        let response = submit(&client, "QRST2345", &ids[..1]).await;
        assert_eq!(rejection(response).await, (Status::Conflict, "election_inactive".to_string()));

        activate(&client, election_id).await;

        let response = submit(&client, "NOSUCHCD", &ids[..1]).await;
        assert_eq!(rejection(response).await, (Status::NotFound, "invalid_code".to_string()));

        let response = submit(&client, "QRST2345", &[]).await;
        assert_eq!(
            rejection(response).await,
            (Status::UnprocessableEntity, "empty_selection".to_string())
        );

        let response = submit(&client, "QRST2345", &[ids[0], 999]).await;
        assert_eq!(rejection(response).await, (Status::BadRequest, "invalid_candidate".to_string()));

        // Nothing was recorded and the code is still usable.
        assert_eq!(votes.count_documents(None, None).await.unwrap(), 0);
        let response = submit(&client, "QRST2345", &ids[..1]).await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test]
    async fn ballot_for_unknown_code(client: Client) {
        let response = client.get(uri!(ballot("ZZZZ9999"))).dispatch().await;
        assert_eq!(rejection(response).await, (Status::NotFound, "invalid_code".to_string()));
    }

    #[backend_test(admin)]
    async fn votes_are_unlinkable(client: Client, codes: Coll<NewVotingCode>, db: Database) {
        let (election_id, ids) = set_up_election(&client).await;
        insert_code(&codes, election_id, "LINK0001").await;
        activate(&client, election_id).await;
        let response = submit(&client, "LINK0001", &ids[1..2]).await;
        assert_eq!(Status::Ok, response.status());

        let stored = db
            .collection::<mongodb::bson::Document>("votes")
            .find_one(None, None)
            .await
            .unwrap()
            .unwrap();
        let mut keys: Vec<_> = stored.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["_id", "candidate_id", "created_at", "election_id"]);
        assert!(!stored.values().any(|v| v.as_str() == Some("LINK0001")));

        let used = Coll::<VotingCode>::from_db(&db)
            .find_one(doc! { "code": "LINK0001" }, None)
            .await
            .unwrap()
            .unwrap();
        assert!(used.is_used);
        assert!(used.used_at.is_some());
    }

    #[backend_test]
    async fn public_settings(client: Client) {
        let response = client.get(uri!(school_settings)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let settings: SchoolSettings = response.into_json().await.unwrap();
        assert_eq!(settings.school_name, "");
    }

    #[backend_test]
    async fn inactive_ballot_is_refused(client: Client, elections: Coll<Election>, codes: Coll<NewVotingCode>) {
        let election = Election::example();
        elections.insert_one(&election, None).await.unwrap();
        insert_code(&codes, election.id, "IDLE0001").await;

        let response = client.get(uri!(ballot("IDLE0001"))).dispatch().await;
        assert_eq!(rejection(response).await, (Status::Conflict, "election_inactive".to_string()));
    }
}
