use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Connector, Station, StationFilter, StationFilterRequest};

/// Runs a station search. Status, type and plug-name tokens are validated
/// before the store is touched.
pub fn filter_stations(
    conn: &Connection,
    request: &StationFilterRequest,
    now: NaiveDateTime,
) -> Result<Vec<Station>, AppError> {
    let filter = request.parse()?;
    apply_filter(conn, &filter, now)
}

pub fn apply_filter(
    conn: &Connection,
    filter: &StationFilter,
    now: NaiveDateTime,
) -> Result<Vec<Station>, AppError> {
    let mut stations = queries::find_stations(
        conn,
        filter.company.as_deref(),
        filter.search.as_deref(),
        filter.is_open,
    )?;

    // Stations left with no connectors are still returned.
    if let Some(connector_type) = filter.connector_type {
        for station in &mut stations {
            prune_connectors(&mut station.connectors, now, |c| {
                c.connector_type == connector_type
            });
        }
    }

    if let Some(plug_name) = filter.plug_name {
        for station in &mut stations {
            prune_connectors(&mut station.connectors, now, |c| c.plug_name == plug_name);
        }
    }

    Ok(stations)
}

/// Keeps the connectors matching `keep` and clears any expired booking on
/// the survivors. Only the returned copy changes; storage keeps the stale
/// booking until an admission overwrites it.
fn prune_connectors<F>(connectors: &mut Vec<Connector>, now: NaiveDateTime, keep: F)
where
    F: Fn(&Connector) -> bool,
{
    connectors.retain(|c| keep(c));
    for connector in connectors.iter_mut() {
        if connector
            .booking
            .as_ref()
            .is_some_and(|b| b.is_expired(now))
        {
            connector.booking = None;
        }
    }
}
