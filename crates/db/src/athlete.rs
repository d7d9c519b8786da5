use diesel::prelude::*;
use serde::Serialize;

use crate::{codes::Gender, schema::athletes};

/// A rostered athlete. Retired athletes keep their row with
/// `is_active = false` so that historical entries still resolve.
#[derive(Debug, Queryable, Selectable, Serialize, Clone, PartialEq, Eq)]
#[diesel(table_name = athletes)]
pub struct Athlete {
    #[serde(rename = "athlete_id")]
    pub id: i64,
    pub org_id: i64,
    pub team_id: i64,
    pub event_group_id: i64,
    pub varsity: bool,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub unavailable: bool,
    pub expected_return: Option<String>,
    pub grad_year: Option<i64>,
    pub is_active: bool,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = athletes)]
pub struct NewAthlete {
    pub org_id: i64,
    pub team_id: i64,
    pub event_group_id: i64,
    pub varsity: bool,
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub unavailable: bool,
    pub expected_return: Option<String>,
    pub grad_year: Option<i64>,
    pub is_active: bool,
}

/// A sparse update. `None` leaves a column alone; for nullable columns
/// `Some(None)` clears it.
#[derive(Debug, Default, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = athletes)]
pub struct AthleteChangeset {
    pub team_id: Option<i64>,
    pub event_group_id: Option<i64>,
    pub varsity: Option<bool>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub unavailable: Option<bool>,
    pub expected_return: Option<Option<String>>,
    pub grad_year: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

impl AthleteChangeset {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl Athlete {
    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn in_org(org_id: i64) -> _ {
        athletes::org_id.eq(org_id)
    }

    #[diesel::dsl::auto_type(no_type_alias)]
    pub fn is_active() -> _ {
        athletes::is_active.eq(true)
    }
}
