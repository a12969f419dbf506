use rocket::Route;

mod admin;
pub mod auth;
mod codes;
mod common;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(auth::routes());
    routes.extend(codes::routes());
    routes.extend(voting::routes());
    routes
}
