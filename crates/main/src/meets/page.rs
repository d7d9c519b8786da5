//! The coach's working view of one meet for one gender: the offerings with
//! their entries, and the athletes who could still be added.

use std::collections::HashMap;

use db::{
    athlete::Athlete,
    catalog::Event,
    codes::{EntryStatus, EventType, Gender},
    meet::{Meet, MeetEntry, MeetEvent},
    schema::{athletes, event_groups, events, meet_entries, meet_events, teams},
    DbConn,
};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use itertools::Itertools;
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::Value;
use trace_request::RequestSpan;

use super::find_meet;
use crate::{
    config::OrgScope, error::ApiError, parse::optional_gender, run_in_span,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct MeetPageView {
    pub meet: Meet,
    pub gender: Gender,
    pub meet_events: Vec<OfferingView>,
    /// Active athletes of the requested gender, whether or not they are
    /// already entered somewhere.
    pub athletes: Vec<EligibleAthlete>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct OfferingView {
    pub meet_event_id: i64,
    pub event_id: i64,
    pub event_name: String,
    pub event_type: EventType,
    pub event_group: Option<String>,
    pub gender: Gender,
    pub sort_order: i64,
    pub max_entries: Option<i64>,
    pub is_scored: bool,
    pub entries: Vec<EntryView>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EntryView {
    pub entry_id: i64,
    pub athlete_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub entry_status: EntryStatus,
    pub seed_time: Option<String>,
    pub seed_mark: Option<String>,
    pub heat: Option<i64>,
    pub lane: Option<i64>,
}

impl EntryView {
    fn new(entry: MeetEntry, athlete: Athlete) -> Self {
        Self {
            entry_id: entry.id,
            athlete_id: athlete.id,
            first_name: athlete.first_name,
            last_name: athlete.last_name,
            entry_status: entry.entry_status,
            seed_time: entry.seed_time,
            seed_mark: entry.seed_mark,
            heat: entry.heat,
            lane: entry.lane,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct EligibleAthlete {
    pub athlete_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub varsity: bool,
    pub unavailable: bool,
    pub expected_return: Option<String>,
    pub grad_year: Option<i64>,
    pub team_id: i64,
    pub team: String,
    pub event_group_id: i64,
    pub event_group: String,
}

/// Builds the page for `meet_id` and `gender`. Read only.
///
/// Offerings are ordered by the offering's sort order, then the catalog
/// event's, then the event name. Entries within an offering are ordered by
/// athlete name.
#[tracing::instrument(skip(conn))]
pub fn build_meet_page(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    meet_id: i64,
    gender: Gender,
) -> Result<MeetPageView, ApiError> {
    if !gender.may_be_offered() {
        return Err(ApiError::validation("gender must be M or F"));
    }

    conn.transaction(|conn| -> Result<_, ApiError> {
        let meet = find_meet(conn, scope, meet_id)?;

        let offerings = meet_events::table
            .inner_join(events::table.left_join(event_groups::table))
            .filter(meet_events::meet_id.eq(meet.id))
            .filter(meet_events::gender.eq(gender))
            .order_by((
                meet_events::sort_order.asc(),
                events::sort_order.asc(),
                events::name.asc(),
                meet_events::id.asc(),
            ))
            .select((
                MeetEvent::as_select(),
                Event::as_select(),
                event_groups::name.nullable(),
            ))
            .load::<(MeetEvent, Event, Option<String>)>(conn)?;

        let offering_ids =
            offerings.iter().map(|(offering, ..)| offering.id).collect_vec();

        let mut entries_by_offering: HashMap<i64, Vec<EntryView>> =
            meet_entries::table
                .inner_join(athletes::table)
                .filter(meet_entries::meet_event_id.eq_any(&offering_ids))
                .filter(Athlete::in_org(scope.org_id()))
                .order_by((
                    athletes::last_name.asc(),
                    athletes::first_name.asc(),
                    meet_entries::id.asc(),
                ))
                .select((MeetEntry::as_select(), Athlete::as_select()))
                .load::<(MeetEntry, Athlete)>(conn)?
                .into_iter()
                .map(|(entry, athlete)| {
                    (entry.meet_event_id, EntryView::new(entry, athlete))
                })
                .into_group_map();

        let meet_events = offerings
            .into_iter()
            .map(|(offering, event, event_group)| OfferingView {
                entries: entries_by_offering
                    .remove(&offering.id)
                    .unwrap_or_default(),
                meet_event_id: offering.id,
                event_id: event.id,
                event_name: event.name,
                event_type: event.event_type,
                event_group,
                gender: offering.gender,
                sort_order: offering.sort_order,
                max_entries: offering.max_entries,
                is_scored: offering.is_scored,
            })
            .collect();

        let athletes = eligible_athletes(conn, scope, gender)?;

        Ok(MeetPageView {
            meet,
            gender,
            meet_events,
            athletes,
        })
    })
}

/// Active athletes of the organization with the given gender, grouped by
/// event group and then by name.
pub fn eligible_athletes(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    scope: OrgScope,
    gender: Gender,
) -> Result<Vec<EligibleAthlete>, ApiError> {
    let rows = athletes::table
        .inner_join(teams::table)
        .inner_join(event_groups::table)
        .filter(Athlete::in_org(scope.org_id()))
        .filter(Athlete::is_active())
        .filter(athletes::gender.eq(gender))
        .order_by((
            event_groups::sort_order.asc(),
            athletes::last_name.asc(),
            athletes::first_name.asc(),
            athletes::id.asc(),
        ))
        .select((Athlete::as_select(), teams::name, event_groups::name))
        .load::<(Athlete, String, String)>(conn)?;

    Ok(rows
        .into_iter()
        .map(|(athlete, team, event_group)| EligibleAthlete {
            athlete_id: athlete.id,
            first_name: athlete.first_name,
            last_name: athlete.last_name,
            varsity: athlete.varsity,
            unavailable: athlete.unavailable,
            expected_return: athlete.expected_return,
            grad_year: athlete.grad_year,
            team_id: athlete.team_id,
            team,
            event_group_id: athlete.event_group_id,
            event_group,
        })
        .collect())
}

#[get("/api/meets/<meet_id>/page?<gender>")]
pub async fn meet_page_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_id: i64,
    gender: Option<String>,
) -> Result<Json<MeetPageView>, ApiError> {
    let gender = optional_gender("gender", gender.map(Value::String).as_ref())?
        .unwrap_or(Gender::M);

    run_in_span(&db, span, move |conn| {
        build_meet_page(conn, scope, meet_id, gender)
    })
    .await
    .map(Json)
}
