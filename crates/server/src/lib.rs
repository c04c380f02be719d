use db::DbService;
use services::services::auth::AuthService;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

/// Shared handler state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub db: DbService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: DbService, auth: AuthService) -> Self {
        Self { db, auth }
    }
}
