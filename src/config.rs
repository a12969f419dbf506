use chrono::Duration;
use log::{error, info};
use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::{
    db::{admin::AdminPassword, settings::Settings},
    mongodb::{ensure_counters_exist, ensure_indexes_exist, Coll},
};
use crate::rate_limit::RateLimiter;

/// Name of the production database.
pub const DATABASE_NAME: &str = "schoolvote";

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_auth_ttl() -> u32 {
    3600
}

fn default_rate_limit() -> u32 {
    10
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_auth_ttl")]
    auth_ttl: u32,
    #[serde(default = "default_rate_limit")]
    rate_limit_per_minute: u32,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Public base URL, used to build the links printed on code sheets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Valid lifetime of auth token cookies in seconds.
    pub fn auth_ttl(&self) -> Duration {
        Duration::seconds(self.auth_ttl.into())
    }

    /// Requests per IP per minute allowed on the student-facing code endpoints.
    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Secret key used to encrypt JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // secrets
    db_uri: String,
}

/// Create indexes, ID counters and the settings document if they are missing.
///
/// This operation is idempotent.
pub async fn prepare_database(db: &Database) -> Result<()> {
    ensure_indexes_exist(db).await?;
    ensure_counters_exist(&Coll::from_db(db)).await?;
    Settings::get_or_create(&Coll::from_db(db)).await?;
    Ok(())
}

/// A fairing that loads the MongoDB config, connects to the database,
/// performs any setup necessary, and places both a `Client` and a `Database`
/// into managed state.
pub struct DatabaseFairing;

#[rocket::async_trait]
impl Fairing for DatabaseFairing {
    fn info(&self) -> Info {
        Info {
            name: "MongoDB",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<DbConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load database config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        info!("Loaded database config, connecting...");
        // Construct the connection.
        let client = match MongoClient::with_uri_str(config.db_uri).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to database: {e}");
                return Err(rocket);
            }
        };
        let db = client.database(DATABASE_NAME);

        if let Err(e) = prepare_database(&db).await {
            error!("Failed to prepare database: {e}");
            return Err(rocket);
        }
        info!("...database connection online!");

        // Manage the state.
        rocket = rocket.manage(client).manage(db);
        Ok(rocket)
    }
}

/// Configuration for the administrator.
#[derive(Deserialize)]
struct AdminConfig {
    // secrets
    admin_password: String,
}

/// A fairing that hashes the configured administrator password and places
/// only the hash into managed state.
pub struct AdminPasswordFairing;

#[rocket::async_trait]
impl Fairing for AdminPasswordFairing {
    fn info(&self) -> Info {
        Info {
            name: "Admin password",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let config = match rocket.figment().extract::<AdminConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load admin config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.admin_password.is_empty() {
            error!("The admin password must not be empty");
            return Err(rocket);
        }
        let password = match AdminPassword::hash(&config.admin_password) {
            Ok(password) => password,
            Err(e) => {
                error!("Failed to hash admin password: {e}");
                return Err(rocket);
            }
        };

        rocket = rocket.manage(password);
        Ok(rocket)
    }
}

/// A fairing that sets up the per-IP rate limiter from the application config.
/// Must be attached after [`ConfigFairing`].
pub struct RateLimiterFairing;

#[rocket::async_trait]
impl Fairing for RateLimiterFairing {
    fn info(&self) -> Info {
        Info {
            name: "Rate limiter",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = rocket.state::<Config>() else {
            error!("Rate limiter needs the application config");
            return Err(rocket);
        };
        let per_minute = config.rate_limit_per_minute();
        info!("Rate limiting code lookups to {per_minute} per minute per address");

        rocket = rocket.manage(RateLimiter::per_minute(per_minute));
        Ok(rocket)
    }
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl Config {
        pub fn example() -> Self {
            Self::example_with_secret("test secret")
        }

        pub fn example_with_secret(jwt_secret: &str) -> Self {
            Self {
                base_url: default_base_url(),
                auth_ttl: default_auth_ttl(),
                rate_limit_per_minute: default_rate_limit(),
                jwt_secret: jwt_secret.to_string(),
            }
        }
    }
}
