//! The athlete registry.
//!
//! Athletes are never deleted; retiring one clears `is_active` and leaves
//! their meet entries in place.

use db::{
    athlete::{Athlete, AthleteChangeset, NewAthlete},
    schema::{athletes, event_groups, teams},
    DbConn, RosterConnection,
};
use diesel::{
    connection::LoadConnection,
    dsl::{exists, select},
    prelude::*,
    sqlite::Sqlite,
};
use rocket::{http::Status, serde::json::Json};
use serde_json::Value;
use trace_request::RequestSpan;

use crate::{
    config::OrgScope,
    error::ApiError,
    parse::{
        if_present, optional_gender, optional_int, optional_text, parse_bool,
        required_int, required_text, Fields,
    },
    run_in_span,
};

/// Fails with `InvalidReference` unless `team_id` is a team of this
/// organization.
pub fn check_team(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    team_id: i64,
) -> Result<(), ApiError> {
    let found = select(exists(
        teams::table
            .filter(teams::id.eq(team_id))
            .filter(teams::org_id.eq(scope.org_id())),
    ))
    .get_result::<bool>(conn)?;

    if found {
        Ok(())
    } else {
        Err(ApiError::invalid_reference(
            "team_id is not valid for this organization",
        ))
    }
}

pub fn check_event_group(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    event_group_id: i64,
) -> Result<(), ApiError> {
    let found = select(exists(
        event_groups::table.filter(event_groups::id.eq(event_group_id)),
    ))
    .get_result::<bool>(conn)?;

    if found {
        Ok(())
    } else {
        Err(ApiError::invalid_reference("event_group_id is not valid"))
    }
}

fn required_gender(
    field: &str,
    value: Option<&Value>,
) -> Result<db::codes::Gender, ApiError> {
    optional_gender(field, value)?
        .ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

fn find_in_org(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    athlete_id: i64,
) -> Result<Athlete, ApiError> {
    athletes::table
        .filter(athletes::id.eq(athlete_id))
        .filter(Athlete::in_org(scope.org_id()))
        .first::<Athlete>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("athlete"))
}

/// Registers a new, active athlete.
#[tracing::instrument(skip(conn, fields))]
pub fn create_athlete(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    fields: &Fields,
) -> Result<Athlete, ApiError> {
    let first_name = required_text("first_name", fields.get("first_name"))?;
    let last_name = required_text("last_name", fields.get("last_name"))?;
    let gender = required_gender("gender", fields.get("gender"))?;
    let team_id = required_int("team_id", fields.get("team_id"))?;
    let event_group_id =
        required_int("event_group_id", fields.get("event_group_id"))?;
    let varsity = parse_bool("varsity", fields.get("varsity"), false)?;
    let unavailable =
        parse_bool("unavailable", fields.get("unavailable"), false)?;
    let grad_year = optional_int("grad_year", fields.get("grad_year"))?;
    let expected_return =
        optional_text("expected_return", fields.get("expected_return"))?;

    let athlete = db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        check_team(conn, scope, team_id)?;
        check_event_group(conn, event_group_id)?;

        diesel::insert_into(athletes::table)
            .values(NewAthlete {
                org_id: scope.org_id(),
                team_id,
                event_group_id,
                varsity,
                first_name,
                last_name,
                gender,
                unavailable,
                expected_return,
                grad_year,
                is_active: true,
            })
            .get_result::<Athlete>(conn)
            .map_err(ApiError::from)
    })?;

    tracing::info!(athlete_id = athlete.id, "registered athlete");
    Ok(athlete)
}

/// Applies the recognised keys of `fields` to an athlete. Reference fields
/// are checked against the organization on every update.
#[tracing::instrument(skip(conn, fields))]
pub fn update_athlete(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    athlete_id: i64,
    fields: &Fields,
) -> Result<Athlete, ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let current = find_in_org(conn, scope, athlete_id)?;

        let changes = AthleteChangeset {
            team_id: if_present(fields, "team_id", required_int)?,
            event_group_id: if_present(
                fields,
                "event_group_id",
                required_int,
            )?,
            varsity: if_present(fields, "varsity", |k, v| {
                parse_bool(k, v, current.varsity)
            })?,
            first_name: if_present(fields, "first_name", required_text)?,
            last_name: if_present(fields, "last_name", required_text)?,
            gender: if_present(fields, "gender", required_gender)?,
            unavailable: if_present(fields, "unavailable", |k, v| {
                parse_bool(k, v, current.unavailable)
            })?,
            expected_return: if_present(
                fields,
                "expected_return",
                optional_text,
            )?,
            grad_year: if_present(fields, "grad_year", optional_int)?,
            is_active: if_present(fields, "is_active", |k, v| {
                parse_bool(k, v, current.is_active)
            })?,
        };

        if let Some(team_id) = changes.team_id {
            check_team(conn, scope, team_id)?;
        }
        if let Some(event_group_id) = changes.event_group_id {
            check_event_group(conn, event_group_id)?;
        }

        if changes.is_empty() {
            return Ok(current);
        }

        Ok(diesel::update(athletes::table.find(current.id))
            .set(&changes)
            .get_result::<Athlete>(conn)?)
    })
}

/// Soft-deletes an athlete.
#[tracing::instrument(skip(conn))]
pub fn retire_athlete(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    athlete_id: i64,
) -> Result<Athlete, ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let athlete = find_in_org(conn, scope, athlete_id)?;
        Ok(diesel::update(athletes::table.find(athlete.id))
            .set(athletes::is_active.eq(false))
            .get_result::<Athlete>(conn)?)
    })
}

/// Athletes of the organization in the order they were registered.
pub fn list_athletes(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    include_inactive: bool,
) -> Result<Vec<Athlete>, ApiError> {
    let query = athletes::table
        .filter(Athlete::in_org(scope.org_id()))
        .order_by(athletes::id.asc());

    let athletes = if include_inactive {
        query.load::<Athlete>(conn)?
    } else {
        query.filter(Athlete::is_active()).load::<Athlete>(conn)?
    };

    Ok(athletes)
}

#[get("/api/athletes?<include_inactive>")]
pub async fn list_athletes_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    include_inactive: Option<String>,
) -> Result<Json<Vec<Athlete>>, ApiError> {
    let include_inactive = parse_bool(
        "include_inactive",
        include_inactive.map(Value::String).as_ref(),
        false,
    )?;

    run_in_span(&db, span, move |conn| {
        list_athletes(conn, scope, include_inactive)
    })
    .await
    .map(Json)
}

#[post("/api/athletes", data = "<fields>")]
pub async fn create_athlete_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    fields: Json<Fields>,
) -> Result<(Status, Json<Athlete>), ApiError> {
    let fields = fields.into_inner();
    run_in_span(&db, span, move |conn| create_athlete(conn, scope, &fields))
        .await
        .map(|athlete| (Status::Created, Json(athlete)))
}

#[patch("/api/athletes/<athlete_id>", data = "<fields>")]
pub async fn update_athlete_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    athlete_id: i64,
    fields: Json<Fields>,
) -> Result<Json<Athlete>, ApiError> {
    let fields = fields.into_inner();
    run_in_span(&db, span, move |conn| {
        update_athlete(conn, scope, athlete_id, &fields)
    })
    .await
    .map(Json)
}

#[delete("/api/athletes/<athlete_id>")]
pub async fn retire_athlete_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    athlete_id: i64,
) -> Result<Json<Athlete>, ApiError> {
    run_in_span(&db, span, move |conn| retire_athlete(conn, scope, athlete_id))
        .await
        .map(Json)
}
