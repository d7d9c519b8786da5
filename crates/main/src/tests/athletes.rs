use db::{codes::Gender, schema::athletes};
use diesel::prelude::*;
use serde_json::json;

use super::support::{fields, Fixture};
use crate::{
    athletes::{create_athlete, list_athletes, retire_athlete, update_athlete},
    error::ApiError,
    meets::entries::add_entry,
};

#[test]
fn creating_an_athlete_coerces_booleans() {
    let mut fx = Fixture::new();

    let athlete = create_athlete(
        &mut fx.conn,
        fx.scope,
        &fields(json!({
            "first_name": " Ava ",
            "last_name": "Nguyen",
            "gender": "f",
            "team_id": fx.varsity_team,
            "event_group_id": fx.sprints,
            "varsity": "yes",
            "grad_year": "2027",
        })),
    )
    .unwrap();

    assert_eq!(athlete.first_name, "Ava");
    assert_eq!(athlete.gender, Gender::F);
    assert!(athlete.varsity);
    assert!(!athlete.unavailable);
    assert!(athlete.is_active);
    assert_eq!(athlete.grad_year, Some(2027));
    assert_eq!(athlete.org_id, fx.scope.org_id());
}

#[test]
fn creating_an_athlete_requires_names_and_references() {
    let mut fx = Fixture::new();

    let missing_name = create_athlete(
        &mut fx.conn,
        fx.scope,
        &fields(json!({
            "first_name": "  ",
            "last_name": "Nguyen",
            "gender": "F",
            "team_id": fx.varsity_team,
            "event_group_id": fx.sprints,
        })),
    );
    assert!(matches!(missing_name, Err(ApiError::Validation(_))));

    let foreign_team = create_athlete(
        &mut fx.conn,
        fx.scope,
        &fields(json!({
            "first_name": "Ava",
            "last_name": "Nguyen",
            "gender": "F",
            "team_id": fx.rival_team,
            "event_group_id": fx.sprints,
        })),
    );
    assert!(matches!(foreign_team, Err(ApiError::InvalidReference(_))));

    let bad_boolean = create_athlete(
        &mut fx.conn,
        fx.scope,
        &fields(json!({
            "first_name": "Ava",
            "last_name": "Nguyen",
            "gender": "F",
            "team_id": fx.varsity_team,
            "event_group_id": fx.sprints,
            "varsity": "maybe",
        })),
    );
    assert!(matches!(bad_boolean, Err(ApiError::InvalidBoolean { .. })));

    let count: i64 = athletes::table
        .count()
        .get_result(&mut fx.conn)
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn update_cannot_move_an_athlete_to_another_organizations_team() {
    let mut fx = Fixture::new();
    let athlete = fx.athlete("Ava", "Nguyen", "F");

    let result = update_athlete(
        &mut fx.conn,
        fx.scope,
        athlete.id,
        &fields(json!({ "team_id": fx.rival_team, "last_name": "Ng" })),
    );
    assert!(matches!(result, Err(ApiError::InvalidReference(_))));

    let stored = athletes::table
        .find(athlete.id)
        .first::<db::athlete::Athlete>(&mut fx.conn)
        .unwrap();
    assert_eq!(stored, athlete);
}

#[test]
fn update_ignores_unknown_keys_and_clears_nullable_fields() {
    let mut fx = Fixture::new();
    let created = fx.athlete("Ava", "Nguyen", "F");
    let athlete = update_athlete(
        &mut fx.conn,
        fx.scope,
        created.id,
        &fields(json!({ "expected_return": "next week" })),
    )
    .unwrap();
    assert_eq!(athlete.expected_return.as_deref(), Some("next week"));

    let updated = update_athlete(
        &mut fx.conn,
        fx.scope,
        athlete.id,
        &fields(json!({
            "expected_return": null,
            "unavailable": "on",
            "org_id": 99,
        })),
    )
    .unwrap();

    assert_eq!(updated.expected_return, None);
    assert!(updated.unavailable);
    assert_eq!(updated.org_id, fx.scope.org_id());

    let unchanged =
        update_athlete(&mut fx.conn, fx.scope, athlete.id, &fields(json!({})))
            .unwrap();
    assert_eq!(unchanged, updated);
}

#[test]
fn athletes_are_invisible_across_organizations() {
    let mut fx = Fixture::new();
    let athlete = fx.athlete("Ava", "Nguyen", "F");

    let result = update_athlete(
        &mut fx.conn,
        fx.rival,
        athlete.id,
        &fields(json!({ "last_name": "Ng" })),
    );
    assert!(matches!(result, Err(ApiError::NotFound("athlete"))));
    assert!(list_athletes(&mut fx.conn, fx.rival, true).unwrap().is_empty());
}

#[test]
fn retiring_keeps_entries_and_hides_the_athlete() {
    let mut fx = Fixture::new();
    let meet = fx.meet("Dual", "outdoor");
    let athlete = fx.athlete("Ava", "Nguyen", "F");
    let offering = fx.offering(meet.id, "200m", "F");
    add_entry(&mut fx.conn, fx.scope, offering, athlete.id).unwrap();

    let retired = retire_athlete(&mut fx.conn, fx.scope, athlete.id).unwrap();

    assert!(!retired.is_active);
    assert_eq!(fx.entry_count(), 1);
    assert!(list_athletes(&mut fx.conn, fx.scope, false)
        .unwrap()
        .is_empty());
    assert_eq!(
        list_athletes(&mut fx.conn, fx.scope, true).unwrap(),
        vec![retired]
    );
}
