#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::{
    AdminPasswordFairing, ConfigFairing, DatabaseFairing, RateLimiterFairing,
};
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod rate_limit;

/// Assemble the server. Configuration, database and secrets are loaded when
/// it ignites; any failure there aborts the launch.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(ConfigFairing)
        .attach(DatabaseFairing)
        .attach(AdminPasswordFairing)
        .attach(RateLimiterFairing)
}

/// Connect to the test database server named by `db_uri`.
#[cfg(test)]
async fn db_client() -> mongodb::Client {
    let db_uri = rocket::Config::figment()
        .extract_inner::<String>("db_uri")
        .expect("`db_uri` not set");
    mongodb::Client::with_uri_str(&db_uri)
        .await
        .unwrap_or_else(|e| panic!("Could not connect to database with `db_uri` {db_uri:?}: {e}"))
}

/// A fresh database name, so that tests never share state.
#[cfg(test)]
fn database() -> String {
    format!("test{}", rand::random::<u32>())
}

/// A server using the given database, with the test admin password and a
/// rate limit high enough not to interfere.
#[cfg(test)]
async fn rocket_for_db(client: mongodb::Client, db_name: &str) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge((
            "admin_password",
            model::api::admin::AdminCredentials::example().password,
        ))
        .merge(("jwt_secret", "test secret"))
        .merge(("rate_limit_per_minute", 1000));

    let db = client.database(db_name);
    config::prepare_database(&db).await.unwrap();

    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(AdminPasswordFairing)
        .attach(RateLimiterFairing)
        .manage(client)
        .manage(db)
}
