//! Reference data written on startup. Every step is safe to repeat.

use db::{
    catalog::NewEvent,
    codes::{EventType, VenueType},
    schema::{event_groups, events, organizations, teams},
    RosterConnection,
};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};

use crate::{config::AppConfig, error::ApiError};

pub const TEAMS: [&str; 3] = ["Varsity", "JV", "Freshman"];

/// Event groups and the order they are listed in.
pub const EVENT_GROUPS: [(&str, i64); 9] = [
    ("Sprints", 10),
    ("Hurdles", 20),
    ("Mid Distance", 30),
    ("Distance", 40),
    ("Relays", 50),
    ("Jumps", 60),
    ("PV", 70),
    ("Throws", 80),
    ("Multi", 90),
];

pub struct CatalogEntry {
    pub group: &'static str,
    pub name: &'static str,
    pub event_type: EventType,
    pub venue_type: VenueType,
    pub sort_order: i64,
}

const fn entry(
    group: &'static str,
    name: &'static str,
    event_type: EventType,
    venue_type: VenueType,
    sort_order: i64,
) -> CatalogEntry {
    CatalogEntry {
        group,
        name,
        event_type,
        venue_type,
        sort_order,
    }
}

/// The standard high-school event catalog.
pub const CATALOG: [CatalogEntry; 17] = {
    use EventType::{Field, Relay, Track};
    use VenueType::{Both, Outdoor};
    [
        entry("Sprints", "100m", Track, Outdoor, 10),
        entry("Sprints", "200m", Track, Both, 20),
        entry("Sprints", "400m", Track, Both, 30),
        entry("Hurdles", "110H/100H", Track, Outdoor, 40),
        entry("Hurdles", "300H", Track, Outdoor, 50),
        entry("Mid Distance", "800m", Track, Both, 60),
        entry("Distance", "1600m", Track, Both, 70),
        entry("Distance", "3200m", Track, Both, 80),
        entry("Relays", "4x100", Relay, Outdoor, 90),
        entry("Relays", "4x400", Relay, Outdoor, 100),
        entry("Relays", "4x800", Relay, Outdoor, 110),
        entry("Jumps", "Long Jump", Field, Both, 120),
        entry("Jumps", "Triple Jump", Field, Both, 130),
        entry("Jumps", "High Jump", Field, Both, 140),
        entry("PV", "Pole Vault", Field, Both, 150),
        entry("Throws", "Shot Put", Field, Both, 160),
        entry("Throws", "Discus", Field, Outdoor, 170),
    ]
};

/// Makes sure the configured organization exists, and seeds whatever else
/// `config` asks for.
#[tracing::instrument(skip(conn))]
pub fn seed_reference_data(
    conn: &mut impl RosterConnection,
    config: &AppConfig,
) -> Result<(), ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        diesel::insert_into(organizations::table)
            .values((
                organizations::id.eq(config.org_id),
                organizations::name.eq(&config.org_name),
            ))
            .on_conflict_do_nothing()
            .execute(conn)?;

        if config.seed_demo_data {
            seed_teams(conn, config.org_id)?;
            seed_event_groups(conn)?;
            if config.seed_events {
                seed_catalog(conn)?;
            }
        }
        Ok(())
    })
}

/// Teams are only created for an organization that has none, so renamed or
/// deleted teams are not brought back.
fn seed_teams(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
    org_id: i64,
) -> Result<(), ApiError> {
    let existing = teams::table
        .filter(teams::org_id.eq(org_id))
        .count()
        .get_result::<i64>(conn)?;
    if existing > 0 {
        return Ok(());
    }

    let rows = TEAMS
        .iter()
        .map(|name| (teams::org_id.eq(org_id), teams::name.eq(*name)))
        .collect::<Vec<_>>();
    diesel::insert_into(teams::table).values(&rows).execute(conn)?;
    tracing::info!(org_id, "seeded teams");
    Ok(())
}

fn seed_event_groups(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<(), ApiError> {
    for (name, sort_order) in EVENT_GROUPS {
        diesel::insert_into(event_groups::table)
            .values((
                event_groups::name.eq(name),
                event_groups::sort_order.eq(sort_order),
            ))
            .on_conflict(event_groups::name)
            .do_update()
            .set(event_groups::sort_order.eq(sort_order))
            .execute(conn)?;
    }
    Ok(())
}

/// Upserts the catalog, keyed on (event group, name).
fn seed_catalog(
    conn: &mut (impl Connection<Backend = Sqlite> + LoadConnection),
) -> Result<(), ApiError> {
    for catalog_entry in &CATALOG {
        let group_id = event_groups::table
            .filter(event_groups::name.eq(catalog_entry.group))
            .select(event_groups::id)
            .first::<i64>(conn)?;

        diesel::insert_into(events::table)
            .values(NewEvent {
                event_group_id: Some(group_id),
                name: catalog_entry.name,
                event_type: catalog_entry.event_type,
                venue_type: catalog_entry.venue_type,
                sort_order: catalog_entry.sort_order,
                is_active: true,
            })
            .on_conflict((events::event_group_id, events::name))
            .do_update()
            .set((
                events::event_type.eq(catalog_entry.event_type),
                events::venue_type.eq(catalog_entry.venue_type),
                events::sort_order.eq(catalog_entry.sort_order),
                events::is_active.eq(true),
            ))
            .execute(conn)?;
    }
    tracing::info!(events = CATALOG.len(), "seeded event catalog");
    Ok(())
}
