use rocket::{
    http::{Cookie, CookieJar, Status},
    serde::json::Json,
    Route, State,
};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::{
            admin::AdminCredentials,
            auth::{AuthToken, AUTH_TOKEN_COOKIE},
        },
        db::admin::AdminPassword,
    },
};

pub fn routes() -> Vec<Route> {
    routes![authenticate, logout]
}

#[post("/auth/admin", data = "<credentials>", format = "json")]
pub async fn authenticate(
    cookies: &CookieJar<'_>,
    credentials: Json<AdminCredentials>,
    password: &State<AdminPassword>,
    config: &State<Config>,
) -> Result<()> {
    if !password.verify(&credentials.password)? {
        return Err(Error::Status(
            Status::Unauthorized,
            "Incorrect admin password".to_string(),
        ));
    }

    cookies.add(AuthToken::admin().into_cookie(config));
    Ok(())
}

#[delete("/auth")]
pub fn logout(cookies: &CookieJar) -> Status {
    cookies.remove(Cookie::named(AUTH_TOKEN_COOKIE));
    Status::Ok
}

#[cfg(test)]
mod tests {
    use rocket::{http::ContentType, local::asynchronous::Client, serde::json::serde_json::json};

    use super::*;

    #[backend_test]
    async fn admin_authenticate_valid(client: Client) {
        let response = client
            .post(uri!(authenticate))
            .header(ContentType::JSON)
            .body(json!(AdminCredentials::example()).to_string())
            .dispatch()
            .await;

        assert_eq!(Status::Ok, response.status());
        assert!(client.cookies().get(AUTH_TOKEN_COOKIE).is_some());
    }

    #[backend_test]
    async fn admin_authenticate_invalid(client: Client) {
        for credentials in [AdminCredentials::wrong(), AdminCredentials::empty()] {
            let response = client
                .post(uri!(authenticate))
                .header(ContentType::JSON)
                .body(json!(credentials).to_string())
                .dispatch()
                .await;

            assert_eq!(Status::Unauthorized, response.status());
            assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));
        }
    }

    #[backend_test(admin)]
    async fn logout_admin(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
        assert_eq!(None, client.cookies().get(AUTH_TOKEN_COOKIE));

        // Administrative routes are gone again.
        let response = client.get("/admin/elections").dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn logout_not_logged_in(client: Client) {
        let response = client.delete(uri!(logout)).dispatch().await;

        assert_eq!(Status::Ok, response.status());
    }
}
