//! Seeding a new meet's offerings from the event catalog.
//!
//! Every active catalog event held at a venue compatible with the meet is
//! offered twice, once to each gender. Seeding happens at most once per
//! meet: a meet that already has offerings is left alone.

use db::{
    catalog::Event,
    codes::Gender,
    meet::{Meet, NewMeetEvent},
    schema::{events, meet_events},
    RosterConnection,
};
use diesel::{
    dsl::{exists, select},
    prelude::*,
};

use crate::error::{is_unique_violation, ApiError};

/// Seeds `meet` with offerings unless it already has some. Returns the
/// number of offerings created.
///
/// The check and the inserts share one write transaction, so of two
/// requests seeding the same meet the second finds the first's offerings.
#[tracing::instrument(skip(conn, meet), fields(meet_id = meet.id))]
pub fn autopopulate(
    conn: &mut impl RosterConnection,
    meet: &Meet,
) -> Result<usize, ApiError> {
    db::immediate_transaction(conn, |conn| -> Result<_, ApiError> {
        let seeded = select(exists(
            meet_events::table.filter(meet_events::meet_id.eq(meet.id)),
        ))
        .get_result::<bool>(conn)?;
        if seeded {
            tracing::debug!("meet already has offerings");
            return Ok(0);
        }

        let catalog = events::table
            .filter(Event::is_active())
            .filter(
                events::venue_type
                    .eq_any(meet.venue_type.compatible_catalog_venues()),
            )
            .order_by((events::sort_order.asc(), events::id.asc()))
            .load::<Event>(conn)?;

        seed_offerings(conn, &offerings_for(meet.id, &catalog))
    })
}

/// One offering per gender for each catalog event, in catalog order.
pub fn offerings_for(meet_id: i64, catalog: &[Event]) -> Vec<NewMeetEvent> {
    catalog
        .iter()
        .flat_map(|event| {
            Gender::OFFERED.into_iter().map(move |gender| NewMeetEvent {
                meet_id,
                event_id: event.id,
                gender,
                sort_order: event.sort_order,
                max_entries: None,
                is_scored: true,
            })
        })
        .collect()
}

/// Inserts `rows` in a single transaction. If another request seeded the
/// same meet first, the insert trips the uniqueness constraint, everything
/// is rolled back and nothing is reported as having been created.
pub fn seed_offerings(
    conn: &mut impl RosterConnection,
    rows: &[NewMeetEvent],
) -> Result<usize, ApiError> {
    let outcome = db::immediate_transaction(conn, |conn| {
        let mut inserted = 0;
        for row in rows {
            inserted += diesel::insert_into(meet_events::table)
                .values(row)
                .execute(conn)?;
        }
        Ok::<_, diesel::result::Error>(inserted)
    });

    match outcome {
        Ok(inserted) => {
            tracing::info!(inserted, "seeded offerings");
            Ok(inserted)
        }
        Err(error) if is_unique_violation(&error) => {
            tracing::warn!(%error, "offerings were seeded concurrently; keeping the existing set");
            Ok(0)
        }
        Err(error) => Err(error.into()),
    }
}
