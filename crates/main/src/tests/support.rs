use db::{
    athlete::Athlete,
    schema::{event_groups, events, meet_entries, meet_events, organizations, teams},
};
use diesel::{prelude::*, SqliteConnection};
use diesel_migrations::MigrationHarness;
use serde_json::Value;

use crate::{
    athletes::create_athlete,
    config::{AppConfig, OrgScope},
    meets::create_meet,
    parse::Fields,
    seed::seed_reference_data,
    MIGRATIONS,
};

pub const RIVAL_ORG: i64 = 2;

/// Opens `url` and brings it up to the latest schema.
pub fn migrated(url: &str) -> SqliteConnection {
    let mut conn = db::open_connection(url).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn
}

/// A migrated, seeded database with two organizations.
pub struct Fixture {
    pub conn: SqliteConnection,
    pub scope: OrgScope,
    pub rival: OrgScope,
    pub varsity_team: i64,
    pub rival_team: i64,
    pub sprints: i64,
}

impl Fixture {
    pub fn new() -> Self {
        Self::open(":memory:")
    }

    /// A fixture on the database at `url`, which other connections can
    /// share when it is a file.
    pub fn open(url: &str) -> Self {
        let mut conn = migrated(url);

        let config = AppConfig {
            seed_events: true,
            ..AppConfig::default()
        };
        seed_reference_data(&mut conn, &config).unwrap();

        diesel::insert_into(organizations::table)
            .values((
                organizations::id.eq(RIVAL_ORG),
                organizations::name.eq("Rival High"),
            ))
            .execute(&mut conn)
            .unwrap();
        let rival_team = diesel::insert_into(teams::table)
            .values((teams::org_id.eq(RIVAL_ORG), teams::name.eq("Varsity")))
            .returning(teams::id)
            .get_result::<i64>(&mut conn)
            .unwrap();

        let varsity_team = teams::table
            .filter(teams::org_id.eq(config.org_id))
            .filter(teams::name.eq("Varsity"))
            .select(teams::id)
            .first::<i64>(&mut conn)
            .unwrap();
        let sprints = event_groups::table
            .filter(event_groups::name.eq("Sprints"))
            .select(event_groups::id)
            .first::<i64>(&mut conn)
            .unwrap();

        Self {
            conn,
            scope: config.scope(),
            rival: OrgScope(RIVAL_ORG),
            varsity_team,
            rival_team,
            sprints,
        }
    }

    pub fn athlete(&mut self, first: &str, last: &str, gender: &str) -> Athlete {
        create_athlete(
            &mut self.conn,
            self.scope,
            &fields(serde_json::json!({
                "first_name": first,
                "last_name": last,
                "gender": gender,
                "team_id": self.varsity_team,
                "event_group_id": self.sprints,
            })),
        )
        .unwrap()
    }

    pub fn meet(&mut self, name: &str, venue: &str) -> db::meet::Meet {
        create_meet(
            &mut self.conn,
            self.scope,
            &fields(serde_json::json!({ "name": name, "venue_type": venue })),
        )
        .unwrap()
    }

    pub fn event_id(&mut self, name: &str) -> i64 {
        events::table
            .filter(events::name.eq(name))
            .select(events::id)
            .first::<i64>(&mut self.conn)
            .unwrap()
    }

    /// The offering of `event` for `gender` at `meet_id`.
    pub fn offering(&mut self, meet_id: i64, event: &str, gender: &str) -> i64 {
        let event_id = self.event_id(event);
        meet_events::table
            .filter(meet_events::meet_id.eq(meet_id))
            .filter(meet_events::event_id.eq(event_id))
            .filter(meet_events::gender.eq(gender.parse::<db::codes::Gender>().unwrap()))
            .select(meet_events::id)
            .first::<i64>(&mut self.conn)
            .unwrap()
    }

    pub fn offering_count(&mut self, meet_id: i64) -> i64 {
        meet_events::table
            .filter(meet_events::meet_id.eq(meet_id))
            .count()
            .get_result(&mut self.conn)
            .unwrap()
    }

    pub fn entry_count(&mut self) -> i64 {
        meet_entries::table
            .count()
            .get_result(&mut self.conn)
            .unwrap()
    }
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}
