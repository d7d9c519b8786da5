//! Read access to the reference catalog.

use db::{
    catalog::{Event, EventGroup, Season, Team},
    schema::{event_groups, events, seasons, teams},
    DbConn,
};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rocket::serde::json::Json;
use trace_request::RequestSpan;

use crate::{config::OrgScope, error::ApiError, run_in_span};

#[tracing::instrument(skip(conn))]
pub fn list_teams(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
) -> Result<Vec<Team>, ApiError> {
    Ok(teams::table
        .filter(teams::org_id.eq(scope.org_id()))
        .order_by((teams::name.asc(), teams::id.asc()))
        .load::<Team>(conn)?)
}

pub fn list_event_groups(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<Vec<EventGroup>, ApiError> {
    Ok(event_groups::table
        .order_by((event_groups::sort_order.asc(), event_groups::id.asc()))
        .load::<EventGroup>(conn)?)
}

/// The active event catalog, in the order meets list their events.
pub fn list_events(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<Vec<Event>, ApiError> {
    Ok(events::table
        .filter(Event::is_active())
        .order_by((events::sort_order.asc(), events::name.asc()))
        .load::<Event>(conn)?)
}

pub fn list_seasons(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<Vec<Season>, ApiError> {
    Ok(seasons::table
        .order_by((seasons::year.desc(), seasons::name.asc()))
        .load::<Season>(conn)?)
}

#[get("/api/teams")]
pub async fn teams_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
) -> Result<Json<Vec<Team>>, ApiError> {
    run_in_span(&db, span, move |conn| list_teams(conn, scope))
        .await
        .map(Json)
}

#[get("/api/event-groups")]
pub async fn event_groups_route(
    db: DbConn,
    span: RequestSpan,
) -> Result<Json<Vec<EventGroup>>, ApiError> {
    run_in_span(&db, span, |conn| list_event_groups(conn)).await.map(Json)
}

#[get("/api/events")]
pub async fn events_route(
    db: DbConn,
    span: RequestSpan,
) -> Result<Json<Vec<Event>>, ApiError> {
    run_in_span(&db, span, |conn| list_events(conn)).await.map(Json)
}

#[get("/api/seasons")]
pub async fn seasons_route(
    db: DbConn,
    span: RequestSpan,
) -> Result<Json<Vec<Season>>, ApiError> {
    run_in_span(&db, span, |conn| list_seasons(conn)).await.map(Json)
}
