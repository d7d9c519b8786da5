//! A meet, the events it offers (one row per event and gender) and the
//! athletes entered in each offering.

use diesel::prelude::*;
use serde::Serialize;

use crate::{
    codes::{EntryStatus, Gender, VenueType},
    schema::{meet_entries, meet_events, meets},
};

#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = meets)]
pub struct Meet {
    #[serde(rename = "meet_id")]
    pub id: i64,
    pub org_id: i64,
    pub name: String,
    pub meet_date: Option<String>,
    pub location: Option<String>,
    pub is_varsity: bool,
    pub venue_type: VenueType,
    pub is_archived: bool,
    pub season_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = meets)]
pub struct NewMeet {
    pub org_id: i64,
    pub name: String,
    pub meet_date: Option<String>,
    pub location: Option<String>,
    pub is_varsity: bool,
    pub venue_type: VenueType,
    pub is_archived: bool,
    pub season_id: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = meets)]
pub struct MeetChangeset {
    pub name: Option<String>,
    pub meet_date: Option<Option<String>>,
    pub location: Option<Option<String>>,
    pub is_varsity: Option<bool>,
    pub venue_type: Option<VenueType>,
    pub is_archived: Option<bool>,
    pub season_id: Option<Option<i64>>,
    pub notes: Option<Option<String>>,
}

impl MeetChangeset {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Meet {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn with_id_in_org(meet_id: i64, org_id: i64) -> _ {
        meets::id.eq(meet_id).and(meets::org_id.eq(org_id))
    }
}

/// One event, for one gender, inside one meet.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = meet_events)]
pub struct MeetEvent {
    #[serde(rename = "meet_event_id")]
    pub id: i64,
    pub meet_id: i64,
    pub event_id: i64,
    pub gender: Gender,
    pub sort_order: i64,
    pub max_entries: Option<i64>,
    pub is_scored: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = meet_events)]
pub struct NewMeetEvent {
    pub meet_id: i64,
    pub event_id: i64,
    pub gender: Gender,
    pub sort_order: i64,
    pub max_entries: Option<i64>,
    pub is_scored: bool,
}

/// One athlete's entry in one offering.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = meet_entries)]
pub struct MeetEntry {
    #[serde(rename = "entry_id")]
    pub id: i64,
    pub meet_event_id: i64,
    pub athlete_id: i64,
    pub entry_status: EntryStatus,
    pub seed_time: Option<String>,
    pub seed_mark: Option<String>,
    pub heat: Option<i64>,
    pub lane: Option<i64>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = meet_entries)]
pub struct NewMeetEntry {
    pub meet_event_id: i64,
    pub athlete_id: i64,
    pub entry_status: EntryStatus,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = meet_entries)]
pub struct MeetEntryChangeset {
    pub entry_status: Option<EntryStatus>,
    pub seed_time: Option<Option<String>>,
    pub seed_mark: Option<Option<String>>,
    pub heat: Option<Option<i64>>,
    pub lane: Option<Option<i64>>,
}

impl MeetEntryChangeset {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
