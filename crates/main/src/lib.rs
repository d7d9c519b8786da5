//! A roster and meet-entry service for a track-and-field organization.
//!
//! Every operation is a plain function over a SQLite connection, scoped to
//! one organization by an [`config::OrgScope`]. The Rocket routes next to
//! each function run it on the connection pool inside the request's span.

use config::AppConfig;
use db::{DbConn, DbWrapper};
use diesel_migrations::{
    embed_migrations, EmbeddedMigrations, MigrationHarness,
};
use error::ApiError;
use rocket::{
    fairing::AdHoc,
    figment::{
        util::map,
        value::{Map, Value},
    },
    serde::json::{json, Json},
    Build, Rocket,
};
use trace_request::{RequestSpan, RequestTracing};

pub mod athletes;
pub mod config;
pub mod error;
pub mod meets;
pub mod parse;
pub mod reference;
pub mod seed;
#[cfg(test)]
mod tests;

#[macro_use]
extern crate rocket;

pub const MIGRATIONS: EmbeddedMigrations =
    embed_migrations!("../../migrations");

/// Runs `f` on a pooled connection, inside the span of the request that
/// asked for it.
pub(crate) async fn run_in_span<T, F>(
    db: &DbConn,
    span: RequestSpan,
    f: F,
) -> Result<T, ApiError>
where
    F: FnOnce(&mut DbWrapper) -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    db.run(move |conn| span.0.in_scope(|| f(conn))).await
}

#[get("/health")]
fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Reads an integer override from the environment, ignoring (with a
/// warning) values that do not parse.
fn env_i64(name: &str) -> Option<i64> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(name, %value, "ignoring non-numeric override");
            None
        }
    }
}

pub fn make_rocket(default_db: &str) -> Rocket<Build> {
    let db: Map<_, Value> = map![
        "url" => std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| default_db.to_string())
            .into(),
        "pool_size" => 10.into(),
        "timeout" => 5.into(),
    ];

    let mut figment =
        rocket::Config::figment().merge(("databases", map!["database" => db]));
    if let Some(org_id) = env_i64("CURRENT_ORG_ID") {
        figment = figment.merge(("org_id", org_id));
    }
    if let Ok(org_name) = std::env::var("CURRENT_ORG_NAME") {
        figment = figment.merge(("org_name", org_name));
    }

    rocket::custom(figment)
        .attach(AdHoc::config::<AppConfig>())
        .attach(DbConn::fairing())
        .attach(AdHoc::try_on_ignite("migrations", |rocket| async move {
            let db_conn = DbConn::get_one(&rocket).await;
            let Some(db_conn) = db_conn else {
                tracing::error!("no database connection for migrations");
                return Err(rocket);
            };

            let ret: Result<(), Box<dyn std::error::Error + Send + Sync>> =
                db_conn
                    .run(move |conn| {
                        conn.run_pending_migrations(MIGRATIONS)?;
                        Ok(())
                    })
                    .await;

            match ret {
                Ok(_) => Ok(rocket),
                Err(error) => {
                    tracing::error!(%error, "failed to run migrations");
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("seed", |rocket| async move {
            let config = rocket.state::<AppConfig>().cloned();
            let db_conn = DbConn::get_one(&rocket).await;
            let (Some(config), Some(db_conn)) = (config, db_conn) else {
                tracing::error!("cannot seed without config and database");
                return Err(rocket);
            };

            let ret = db_conn
                .run(move |conn| seed::seed_reference_data(conn, &config))
                .await;

            match ret {
                Ok(()) => Ok(rocket),
                Err(error) => {
                    tracing::error!(%error, "failed to seed reference data");
                    Err(rocket)
                }
            }
        }))
        .mount(
            "/",
            routes![
                health,
                reference::teams_route,
                reference::event_groups_route,
                reference::events_route,
                reference::seasons_route,
                athletes::list_athletes_route,
                athletes::create_athlete_route,
                athletes::update_athlete_route,
                athletes::retire_athlete_route,
                meets::list_meets_route,
                meets::create_meet_route,
                meets::get_meet_route,
                meets::patch_meet_route,
                meets::delete_meet_route,
                meets::offerings::create_meet_event_route,
                meets::page::meet_page_route,
                meets::entries::add_entry_route,
                meets::entries::update_entry_route,
                meets::entries::remove_entry_route,
            ],
        )
        .attach(RequestTracing)
}
