//! Entering athletes into offerings.
//!
//! The gender check happens when an entry is created. Entries are not
//! revisited if the athlete's gender is edited afterwards.

use db::{
    athlete::Athlete,
    codes::{EntryStatus, Gender},
    meet::{MeetEntry, MeetEntryChangeset, MeetEvent, NewMeetEntry},
    schema::{athletes, meet_entries, meet_events, meets},
    DbConn, RosterConnection,
};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use rocket::{http::Status, serde::json::Json};
use serde::Serialize;
use trace_request::RequestSpan;

use crate::{
    config::OrgScope,
    error::{on_unique_violation, ApiError},
    parse::{
        if_present, optional_code, optional_int, optional_text, required_int,
        Fields,
    },
    run_in_span,
};

/// An offering, provided its meet belongs to the organization.
fn find_offering(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    meet_event_id: i64,
) -> Result<MeetEvent, ApiError> {
    meet_events::table
        .inner_join(meets::table)
        .filter(meet_events::id.eq(meet_event_id))
        .filter(meets::org_id.eq(scope.org_id()))
        .select(MeetEvent::as_select())
        .first::<MeetEvent>(conn)
        .optional()?
        .ok_or(ApiError::NotFound("meet event"))
}

/// Enters an athlete in an offering.
///
/// The athlete must belong to the meet's organization and match the
/// offering's gender. Whether the athlete is already entered is left to the
/// store's uniqueness constraint, so two coaches racing to add the same
/// athlete see exactly one success.
#[tracing::instrument(skip(conn))]
pub fn add_entry(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    meet_event_id: i64,
    athlete_id: i64,
) -> Result<MeetEntry, ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let offering = find_offering(conn, scope, meet_event_id)?;

        let athlete_gender = athletes::table
            .filter(athletes::id.eq(athlete_id))
            .filter(Athlete::in_org(scope.org_id()))
            .select(athletes::gender)
            .first::<Gender>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("athlete"))?;

        if athlete_gender != offering.gender {
            return Err(ApiError::GenderMismatch {
                athlete: athlete_gender,
                offering: offering.gender,
            });
        }

        diesel::insert_into(meet_entries::table)
            .values(NewMeetEntry {
                meet_event_id: offering.id,
                athlete_id,
                entry_status: EntryStatus::default(),
            })
            .get_result::<MeetEntry>(conn)
            .map_err(on_unique_violation(ApiError::DuplicateEntry))
    })
}

/// Removes an athlete from an offering. Removing an entry that does not
/// exist succeeds, so repeated or crossing removals never fail.
///
/// Returns how many entries were removed (0 or 1).
#[tracing::instrument(skip(conn))]
pub fn remove_entry(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    meet_event_id: i64,
    athlete_id: i64,
) -> Result<usize, ApiError> {
    let in_scope = meet_events::table
        .inner_join(meets::table)
        .filter(meets::org_id.eq(scope.org_id()))
        .select(meet_events::id);

    let removed = diesel::delete(
        meet_entries::table
            .filter(meet_entries::meet_event_id.eq(meet_event_id))
            .filter(meet_entries::athlete_id.eq(athlete_id))
            .filter(meet_entries::meet_event_id.eq_any(in_scope)),
    )
    .execute(conn)?;

    if removed == 0 {
        tracing::debug!("no such entry; nothing to remove");
    }
    Ok(removed)
}

/// Updates an entry's status, seed and heat/lane placement.
#[tracing::instrument(skip(conn, fields))]
pub fn update_entry(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    meet_event_id: i64,
    athlete_id: i64,
    fields: &Fields,
) -> Result<MeetEntry, ApiError> {
    let changes = MeetEntryChangeset {
        entry_status: if_present(fields, "entry_status", |k, v| {
            optional_code::<EntryStatus>(k, v)?.ok_or_else(|| {
                ApiError::validation(format!(
                    "{k} must be entered or scratched"
                ))
            })
        })?,
        seed_time: if_present(fields, "seed_time", optional_text)?,
        seed_mark: if_present(fields, "seed_mark", optional_text)?,
        heat: if_present(fields, "heat", optional_int)?,
        lane: if_present(fields, "lane", optional_int)?,
    };

    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let offering = find_offering(conn, scope, meet_event_id)?;
        let entry = meet_entries::table
            .filter(meet_entries::meet_event_id.eq(offering.id))
            .filter(meet_entries::athlete_id.eq(athlete_id))
            .first::<MeetEntry>(conn)
            .optional()?
            .ok_or(ApiError::NotFound("entry"))?;

        if changes.is_empty() {
            return Ok(entry);
        }

        Ok(diesel::update(meet_entries::table.find(entry.id))
            .set(&changes)
            .get_result::<MeetEntry>(conn)?)
    })
}

#[post("/api/meet-events/<meet_event_id>/entries", data = "<fields>")]
pub async fn add_entry_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_event_id: i64,
    fields: Json<Fields>,
) -> Result<(Status, Json<MeetEntry>), ApiError> {
    let athlete_id = required_int("athlete_id", fields.get("athlete_id"))?;
    run_in_span(&db, span, move |conn| {
        add_entry(conn, scope, meet_event_id, athlete_id)
    })
    .await
    .map(|entry| (Status::Created, Json(entry)))
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

#[delete("/api/meet-events/<meet_event_id>/entries/<athlete_id>")]
pub async fn remove_entry_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_event_id: i64,
    athlete_id: i64,
) -> Result<Json<Ack>, ApiError> {
    run_in_span(&db, span, move |conn| {
        remove_entry(conn, scope, meet_event_id, athlete_id)
    })
    .await
    .map(|_| Json(Ack { ok: true }))
}

#[patch(
    "/api/meet-events/<meet_event_id>/entries/<athlete_id>",
    data = "<fields>"
)]
pub async fn update_entry_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_event_id: i64,
    athlete_id: i64,
    fields: Json<Fields>,
) -> Result<Json<MeetEntry>, ApiError> {
    let fields = fields.into_inner();
    run_in_span(&db, span, move |conn| {
        update_entry(conn, scope, meet_event_id, athlete_id, &fields)
    })
    .await
    .map(Json)
}
