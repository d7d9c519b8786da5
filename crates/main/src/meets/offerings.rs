use db::{
    codes::Gender,
    meet::{MeetEvent, NewMeetEvent},
    schema::{events, meet_events},
    DbConn, RosterConnection,
};
use diesel::{
    dsl::{exists, select},
    prelude::*,
};
use rocket::{http::Status, serde::json::Json};
use trace_request::RequestSpan;

use super::find_meet;
use crate::{
    config::OrgScope,
    error::{on_unique_violation, ApiError},
    parse::{optional_gender, optional_int, parse_bool, required_int, Fields},
    run_in_span,
};

/// What a coach supplies to add an event to a meet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferingRequest {
    pub event_id: i64,
    pub gender: Gender,
    pub sort_order: i64,
    pub max_entries: Option<i64>,
    pub is_scored: bool,
}

impl OfferingRequest {
    pub fn new(event_id: i64, gender: Gender, sort_order: i64) -> Self {
        Self {
            event_id,
            gender,
            sort_order,
            max_entries: None,
            is_scored: true,
        }
    }

    pub fn from_fields(fields: &Fields) -> Result<Self, ApiError> {
        let gender = optional_gender("gender", fields.get("gender"))?
            .ok_or_else(|| ApiError::validation("gender is required"))?;
        let max_entries =
            optional_int("max_entries", fields.get("max_entries"))?;
        if max_entries.is_some_and(|max| max < 0) {
            return Err(ApiError::validation(
                "max_entries must not be negative",
            ));
        }

        Ok(Self {
            event_id: required_int("event_id", fields.get("event_id"))?,
            gender,
            sort_order: optional_int("sort_order", fields.get("sort_order"))?
                .unwrap_or(0),
            max_entries,
            is_scored: parse_bool("is_scored", fields.get("is_scored"), true)?,
        })
    }
}

/// Offers `request.event_id` to `request.gender` at a meet. A meet offers a
/// given event to a given gender at most once.
#[tracing::instrument(skip(conn))]
pub fn create_meet_event(
    conn: &mut impl RosterConnection,
    scope: OrgScope,
    meet_id: i64,
    request: &OfferingRequest,
) -> Result<MeetEvent, ApiError> {
    if !request.gender.may_be_offered() {
        return Err(ApiError::validation("gender must be M or F"));
    }

    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let meet = find_meet(conn, scope, meet_id)?;

        let event_found = select(exists(
            events::table.filter(events::id.eq(request.event_id)),
        ))
        .get_result::<bool>(conn)?;
        if !event_found {
            return Err(ApiError::invalid_reference("event_id is not valid"));
        }

        diesel::insert_into(meet_events::table)
            .values(NewMeetEvent {
                meet_id: meet.id,
                event_id: request.event_id,
                gender: request.gender,
                sort_order: request.sort_order,
                max_entries: request.max_entries,
                is_scored: request.is_scored,
            })
            .get_result::<MeetEvent>(conn)
            .map_err(on_unique_violation(ApiError::DuplicateOffering))
    })
}

#[post("/api/meets/<meet_id>/meet-events", data = "<fields>")]
pub async fn create_meet_event_route(
    db: DbConn,
    scope: OrgScope,
    span: RequestSpan,
    meet_id: i64,
    fields: Json<Fields>,
) -> Result<(Status, Json<MeetEvent>), ApiError> {
    let request = OfferingRequest::from_fields(&fields)?;
    run_in_span(&db, span, move |conn| {
        create_meet_event(conn, scope, meet_id, &request)
    })
    .await
    .map(|offering| (Status::Created, Json(offering)))
}
