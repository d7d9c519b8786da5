//! Reference data: organizations, teams, event groups, the event catalog and
//! seasons.

use diesel::prelude::*;
use serde::Serialize;

use crate::{
    codes::{Discipline, EventType, VenueType},
    schema::{event_groups, events, organizations, seasons, teams},
};

#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = organizations)]
pub struct Organization {
    #[serde(rename = "org_id")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = teams)]
pub struct Team {
    #[serde(rename = "team_id")]
    pub id: i64,
    pub org_id: i64,
    pub name: String,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = event_groups)]
pub struct EventGroup {
    #[serde(rename = "event_group_id")]
    pub id: i64,
    pub name: String,
    pub sort_order: i64,
}

/// A kind of event ("100m", "Long Jump"), independent of any meet.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = events)]
pub struct Event {
    #[serde(rename = "event_id")]
    pub id: i64,
    pub event_group_id: Option<i64>,
    pub name: String,
    pub event_type: EventType,
    pub venue_type: VenueType,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = events)]
pub struct NewEvent<'a> {
    pub event_group_id: Option<i64>,
    pub name: &'a str,
    pub event_type: EventType,
    pub venue_type: VenueType,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = seasons)]
pub struct Season {
    #[serde(rename = "season_id")]
    pub id: i64,
    pub name: String,
    pub year: i64,
    pub discipline: Discipline,
}

impl Event {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn is_active() -> _ {
        events::is_active.eq(true)
    }
}
