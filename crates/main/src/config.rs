use rocket::{
    http::Status,
    request::{self, FromRequest},
    Request,
};
use serde::Deserialize;

/// Settings read from Rocket's figment (`Rocket.toml`, `ROCKET_*`).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The organization every request is scoped to.
    pub org_id: i64,
    pub org_name: String,
    /// Seed teams and event groups on startup.
    pub seed_demo_data: bool,
    /// Also seed the standard event catalog. Ignored without `seed_demo_data`.
    pub seed_events: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            org_id: 1,
            org_name: "Demo Org".to_string(),
            seed_demo_data: true,
            seed_events: false,
        }
    }
}

impl AppConfig {
    pub fn scope(&self) -> OrgScope {
        OrgScope(self.org_id)
    }
}

/// The organization an operation acts within. Lookups of athletes, teams
/// and meets never cross it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrgScope(pub i64);

impl OrgScope {
    pub fn org_id(&self) -> i64 {
        self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OrgScope {
    type Error = ();

    async fn from_request(
        request: &'r Request<'_>,
    ) -> request::Outcome<Self, Self::Error> {
        match request.rocket().state::<AppConfig>() {
            Some(config) => request::Outcome::Success(config.scope()),
            None => {
                tracing::error!("AppConfig is not managed; was the config fairing attached?");
                request::Outcome::Error((Status::InternalServerError, ()))
            }
        }
    }
}
