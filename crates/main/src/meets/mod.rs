//! Meets and everything that hangs off them.
//!
//! A meet owns its offerings (one per event and gender), and each offering
//! owns its entries. Deleting a meet removes both through the foreign keys.

pub mod autopopulate;
pub mod entries;
pub mod offerings;
pub mod page;

use db::{
    catalog::Season,
    codes::VenueType,
    meet::{Meet, MeetChangeset, NewMeet},
    schema::{meets, seasons},
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
        if_present, optional_code, optional_int, optional_text, parse_bool,
        required_text, Fields,
    },
    run_in_span,
};

/// A meet is held either indoors or outdoors; `both` only describes catalog
/// events.
fn meet_venue(field: &str, value: Option<&Value>) -> Result<VenueType, ApiError> {
    match optional_code::<VenueType>(field, value)? {
        Some(VenueType::Both) => Err(ApiError::validation(format!(
            "{field} must be indoor or outdoor"
        ))),
        Some(venue) => Ok(venue),
        None => Err(ApiError::validation(format!("{field} is required"))),
    }
}

/// `season` is accepted as an alias of `season_id`.
fn season_key(fields: &Fields) -> Option<&'static str> {
    ["season_id", "season"]
        .into_iter()
        .find(|key| fields.contains_key(*key))
}

fn check_season(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    season_id: i64,
) -> Result<(), ApiError> {
    let found =
        select(exists(seasons::table.filter(seasons::id.eq(season_id))))
            .get_result::<bool>(conn)?;

    if found {
        Ok(())
    } else {
        Err(ApiError::invalid_reference("season_id is not valid"))
    }
}

pub fn find_meet(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    meet_id: i64,
) -> Result<Meet, ApiError> {
    meets::table
        .filter(Meet::with_id_in_org(meet_id, scope.org_id()))
        .first::<Meet>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("meet"))
}

/// Creates a meet and seeds its offerings from the event catalog. If seeding
/// fails the meet is not created either.
#[tracing::instrument(skip(conn, fields))]
pub fn create_meet(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    fields: &Fields,
) -> Result<Meet, ApiError> {
    let name = required_text("name", fields.get("name"))?;
    let venue_type = match fields.get("venue_type") {
        None | Some(Value::Null) => VenueType::default(),
        value => meet_venue("venue_type", value)?,
    };
    let season_id = season_key(fields)
        .map(|key| optional_int(key, fields.get(key)))
        .transpose()?
        .flatten();

    let new_meet = NewMeet {
        org_id: scope.org_id(),
        name,
        meet_date: optional_text("meet_date", fields.get("meet_date"))?,
        location: optional_text("location", fields.get("location"))?,
        is_varsity: parse_bool("is_varsity", fields.get("is_varsity"), false)?,
        venue_type,
        is_archived: parse_bool(
            "is_archived",
            fields.get("is_archived"),
            false,
        )?,
        season_id,
        notes: optional_text("notes", fields.get("notes"))?,
    };

    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        if let Some(season_id) = new_meet.season_id {
            check_season(conn, season_id)?;
        }

        let meet = diesel::insert_into(meets::table)
            .values(&new_meet)
            .get_result::<Meet>(conn)?;
        tracing::info!(meet_id = meet.id, venue = %meet.venue_type, "created meet");

        autopopulate::autopopulate(conn, &meet)?;
        Ok(meet)
    })
}

/// Applies the recognised keys of `fields` to a meet; anything else in
/// `fields` is ignored.
#[tracing::instrument(skip(conn, fields))]
pub fn patch_meet(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    meet_id: i64,
    fields: &Fields,
) -> Result<Meet, ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let current = find_meet(conn, scope, meet_id)?;

        let changes = MeetChangeset {
            name: if_present(fields, "name", required_text)?,
            meet_date: if_present(fields, "meet_date", optional_text)?,
            location: if_present(fields, "location", optional_text)?,
            is_varsity: if_present(fields, "is_varsity", |k, v| {
                parse_bool(k, v, current.is_varsity)
            })?,
            venue_type: if_present(fields, "venue_type", meet_venue)?,
            is_archived: if_present(fields, "is_archived", |k, v| {
                parse_bool(k, v, current.is_archived)
            })?,
            season_id: season_key(fields)
                .map(|key| optional_int(key, fields.get(key)))
                .transpose()?,
            notes: if_present(fields, "notes", optional_text)?,
        };

        if let Some(Some(season_id)) = changes.season_id {
            check_season(conn, season_id)?;
        }

        if changes.is_empty() {
            return Ok(current);
        }

        Ok(diesel::update(meets::table.find(current.id))
            .set(&changes)
            .get_result::<Meet>(conn)?)
    })
}

/// Meets of the organization, most recent date first. Archived meets are
/// left out unless asked for.
pub fn list_meets(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    include_archived: bool,
) -> Result<Vec<Meet>, ApiError> {
    let query = meets::table
        .filter(meets::org_id.eq(scope.org_id()))
        .order_by((meets::meet_date.desc(), meets::id.desc()));

    let meets = if include_archived {
        query.load::<Meet>(conn)?
    } else {
        query.filter(meets::is_archived.eq(false)).load::<Meet>(conn)?
    };

    Ok(meets)
}

/// Deletes a meet together with its offerings and their entries.
#[tracing::instrument(skip(conn))]
pub fn delete_meet(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    meet_id: i64,
) -> Result<(), ApiError> {
    let deleted = diesel::delete(
        meets::table.filter(Meet::with_id_in_org(meet_id, scope.org_id())),
    )
    .execute(conn)?;

    if deleted == 0 {
        return Err(ApiError::NotFound("meet"));
    }

    tracing::info!(meet_id, "deleted meet");
    Ok(())
}

pub fn season_of(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    meet: &Meet,
) -> Result<Option<Season>, ApiError> {
    match meet.season_id {
        Some(season_id) => Ok(seasons::table
            .find(season_id)
            .first::<Season>(conn)
            .optional()?),
        None => Ok(None),
    }
}

#[get("/api/meets?<include_archived>")]
pub async fn list_meets_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    include_archived: Option<String>,
) -> Result<Json<Vec<Meet>>, ApiError> {
    let include_archived = parse_bool(
        "include_archived",
        include_archived.map(Value::String).as_ref(),
        false,
    )?;

    run_in_span(&db, span, move |conn| {
        list_meets(conn, scope, include_archived)
    })
    .await
    .map(Json)
}

#[post("/api/meets", data = "<fields>")]
pub async fn create_meet_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    fields: Json<Fields>,
) -> Result<(Status, Json<Meet>), ApiError> {
    let fields = fields.into_inner();
    run_in_span(&db, span, move |conn| create_meet(conn, scope, &fields))
        .await
        .map(|meet| (Status::Created, Json(meet)))
}

#[derive(serde::Serialize)]
pub struct MeetDetail {
    #[serde(flatten)]
    pub meet: Meet,
    pub season: Option<Season>,
}

#[get("/api/meets/<meet_id>")]
pub async fn get_meet_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_id: i64,
) -> Result<Json<MeetDetail>, ApiError> {
    run_in_span(&db, span, move |conn| {
        let meet = find_meet(conn, scope, meet_id)?;
        let season = season_of(conn, &meet)?;
        Ok(MeetDetail { meet, season })
    })
    .await
    .map(Json)
}

#[patch("/api/meets/<meet_id>", data = "<fields>")]
pub async fn patch_meet_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_id: i64,
    fields: Json<Fields>,
) -> Result<Json<Meet>, ApiError> {
    let fields = fields.into_inner();
    run_in_span(&db, span, move |conn| {
        patch_meet(conn, scope, meet_id, &fields)
    })
    .await
    .map(Json)
}

#[delete("/api/meets/<meet_id>")]
pub async fn delete_meet_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_id: i64,
) -> Result<Status, ApiError> {
    run_in_span(&db, span, move |conn| delete_meet(conn, scope, meet_id))
        .await
        .map(|()| Status::NoContent)
}
