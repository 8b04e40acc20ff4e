use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::booking::format_booking_time;
use crate::models::{Booking, Connector, NewStation, Station, StationStatus, BOOKING_TIME_FORMAT};

const STATION_COLUMNS: &str =
    "id, name, latitude, longitude, company, open_hours, close_hours, is_open";

const CONNECTOR_COLUMNS: &str = "connector_id, type, plug_name, price_per_unit, power_output, \
     booking_username, booking_end_time";

// ── Stations ──

/// Inserts the station and its connectors, assigning fresh ids to both.
pub fn create_station(conn: &Connection, station: &NewStation) -> Result<Station, AppError> {
    let id = Uuid::new_v4().to_string();
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "INSERT INTO stations (id, name, latitude, longitude, company, open_hours, close_hours, is_open)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            station.name,
            station.latitude,
            station.longitude,
            station.company,
            station.status.open_hours,
            station.status.close_hours,
            station.status.is_open,
        ],
    )?;
    insert_connectors(&tx, &id, station)?;
    tx.commit()?;

    find_station_by_id(conn, &id)?.ok_or_else(|| AppError::not_found("station not found"))
}

pub fn find_all_stations(conn: &Connection) -> Result<Vec<Station>, AppError> {
    find_stations(conn, None, None, None)
}

/// Station-level criteria only. Connector pruning happens above the store.
/// `search` is matched here rather than in SQL since SQLite's `lower()` only
/// folds ASCII.
pub fn find_stations(
    conn: &Connection,
    company: Option<&str>,
    search: Option<&str>,
    is_open: Option<bool>,
) -> Result<Vec<Station>, AppError> {
    let mut clauses: Vec<&str> = vec![];
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![];

    if let Some(company) = company {
        params_vec.push(Box::new(company.to_string()));
        clauses.push("company = ?");
    }
    if let Some(is_open) = is_open {
        params_vec.push(Box::new(is_open));
        clauses.push("is_open = ?");
    }

    let mut sql = format!("SELECT {STATION_COLUMNS} FROM stations");
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY rowid ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), parse_station_row)?;

    let needle = search.map(str::to_lowercase);
    let mut stations = vec![];
    for row in rows {
        let mut station = row?;
        if let Some(needle) = &needle {
            if !station.name.to_lowercase().contains(needle.as_str()) {
                continue;
            }
        }
        station.connectors = find_connectors(conn, &station.id)?;
        stations.push(station);
    }
    Ok(stations)
}

pub fn find_station_by_id(conn: &Connection, id: &str) -> Result<Option<Station>, AppError> {
    let station = conn
        .query_row(
            &format!("SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"),
            params![id],
            parse_station_row,
        )
        .optional()?;

    match station {
        Some(mut station) => {
            station.connectors = find_connectors(conn, &station.id)?;
            Ok(Some(station))
        }
        None => Ok(None),
    }
}

/// Connector ids are unique across the catalog, so at most one station matches.
pub fn find_station_by_connector_id(
    conn: &Connection,
    connector_id: &str,
) -> Result<Option<Station>, AppError> {
    let station_id: Option<String> = conn
        .query_row(
            "SELECT station_id FROM connectors WHERE connector_id = ?1",
            params![connector_id],
            |row| row.get(0),
        )
        .optional()?;

    match station_id {
        Some(station_id) => find_station_by_id(conn, &station_id),
        None => Ok(None),
    }
}

/// Replaces every scalar field and the connector list. A requested connector
/// identical in type, plug, price and power to a stored one keeps that
/// connector's id and booking; the rest are inserted fresh and stored
/// connectors left unclaimed are deleted.
pub fn update_station(
    conn: &Connection,
    id: &str,
    station: &NewStation,
) -> Result<Station, AppError> {
    let tx = conn.unchecked_transaction()?;

    let count = tx.execute(
        "UPDATE stations SET name = ?1, latitude = ?2, longitude = ?3, company = ?4,
           open_hours = ?5, close_hours = ?6, is_open = ?7
         WHERE id = ?8",
        params![
            station.name,
            station.latitude,
            station.longitude,
            station.company,
            station.status.open_hours,
            station.status.close_hours,
            station.status.is_open,
            id,
        ],
    )?;
    if count == 0 {
        return Err(AppError::not_found("station not found"));
    }

    reconcile_connectors(&tx, id, station)?;
    tx.commit()?;

    find_station_by_id(conn, id)?.ok_or_else(|| AppError::not_found("station not found"))
}

pub fn remove_station(conn: &Connection, id: &str) -> Result<(), AppError> {
    let count = conn.execute("DELETE FROM stations WHERE id = ?1", params![id])?;
    if count == 0 {
        return Err(AppError::not_found("station not found"));
    }
    Ok(())
}

fn reconcile_connectors(
    conn: &Connection,
    station_id: &str,
    station: &NewStation,
) -> Result<(), AppError> {
    let mut stored: Vec<Option<Connector>> =
        find_connectors(conn, station_id)?.into_iter().map(Some).collect();

    let mut keep_stmt =
        conn.prepare("UPDATE connectors SET position = ?1 WHERE connector_id = ?2")?;
    let mut insert_stmt = conn.prepare(
        "INSERT INTO connectors (connector_id, station_id, position, type, plug_name, price_per_unit, power_output)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for (position, wanted) in station.connectors.iter().enumerate() {
        let claimed = stored.iter_mut().find_map(|slot| {
            let same = slot.as_ref().is_some_and(|c| {
                c.connector_type == wanted.connector_type
                    && c.plug_name == wanted.plug_name
                    && c.price_per_unit == wanted.price_per_unit
                    && c.power_output == wanted.power_output
            });
            if same {
                slot.take()
            } else {
                None
            }
        });

        match claimed {
            Some(existing) => {
                keep_stmt.execute(params![position as i64, existing.connector_id])?;
            }
            None => {
                insert_stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    station_id,
                    position as i64,
                    wanted.connector_type,
                    wanted.plug_name,
                    wanted.price_per_unit,
                    wanted.power_output,
                ])?;
            }
        }
    }

    for dropped in stored.into_iter().flatten() {
        if let Some(booking) = &dropped.booking {
            tracing::warn!(
                station_id = %station_id,
                connector_id = %dropped.connector_id,
                username = %booking.username,
                booking_end_time = %booking.end_time_str(),
                "edit removed a booked connector"
            );
        }
        conn.execute(
            "DELETE FROM connectors WHERE connector_id = ?1",
            params![dropped.connector_id],
        )?;
    }
    Ok(())
}

fn insert_connectors(conn: &Connection, station_id: &str, station: &NewStation) -> Result<(), AppError> {
    let mut stmt = conn.prepare(
        "INSERT INTO connectors (connector_id, station_id, position, type, plug_name, price_per_unit, power_output)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )?;

    for (position, connector) in station.connectors.iter().enumerate() {
        stmt.execute(params![
            Uuid::new_v4().to_string(),
            station_id,
            position as i64,
            connector.connector_type,
            connector.plug_name,
            connector.price_per_unit,
            connector.power_output,
        ])?;
    }
    Ok(())
}

fn find_connectors(conn: &Connection, station_id: &str) -> Result<Vec<Connector>, AppError> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {CONNECTOR_COLUMNS} FROM connectors WHERE station_id = ?1 ORDER BY position ASC"
    ))?;
    let rows = stmt.query_map(params![station_id], parse_connector_row)?;

    let mut connectors = vec![];
    for row in rows {
        connectors.push(row?);
    }
    Ok(connectors)
}

// ── Bookings ──

/// Sets the booking on a single connector, leaving its siblings and the
/// owning station untouched. The write only lands if the connector's current
/// booking is absent or already expired at `now`, so two admissions racing
/// for the same connector cannot both win.
pub fn update_connector_booking(
    conn: &Connection,
    connector_id: &str,
    booking: &Booking,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let count = conn.execute(
        "UPDATE connectors SET booking_username = ?1, booking_end_time = ?2
         WHERE connector_id = ?3 AND (booking_end_time IS NULL OR booking_end_time <= ?4)",
        params![
            booking.username,
            format_booking_time(&booking.booking_end_time),
            connector_id,
            format_booking_time(&now),
        ],
    )?;
    if count > 0 {
        return Ok(());
    }

    let current: Option<Option<String>> = conn
        .query_row(
            "SELECT booking_end_time FROM connectors WHERE connector_id = ?1",
            params![connector_id],
            |row| row.get(0),
        )
        .optional()?;

    match current {
        None => Err(AppError::not_found("connector not found")),
        Some(end_time) => Err(AppError::conflict(format!(
            "connector is already booked until {}",
            end_time.unwrap_or_default()
        ))),
    }
}

/// Every booking held by `username`, expired or not, in catalog order.
pub fn find_bookings_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT c.booking_username, c.booking_end_time
         FROM connectors c
         INNER JOIN stations s ON s.id = c.station_id
         WHERE c.booking_username = ?1 AND c.booking_end_time IS NOT NULL
         ORDER BY s.rowid ASC, c.position ASC",
    )?;

    let rows = stmt.query_map(params![username], |row| {
        Ok(Booking {
            username: row.get(0)?,
            booking_end_time: parse_time_column(row, 1)?,
        })
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// The first station holding a booking for `username`, with its connector
/// list narrowed to that user's booked connectors.
pub fn find_station_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<Station>, AppError> {
    let station_id: Option<String> = conn
        .query_row(
            "SELECT c.station_id
             FROM connectors c
             INNER JOIN stations s ON s.id = c.station_id
             WHERE c.booking_username = ?1
             ORDER BY s.rowid ASC, c.position ASC
             LIMIT 1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    let Some(station_id) = station_id else {
        return Ok(None);
    };

    let station = find_station_by_id(conn, &station_id)?.map(|mut station| {
        station.connectors.retain(|c| {
            c.booking
                .as_ref()
                .is_some_and(|b| b.username == username)
        });
        station
    });
    Ok(station)
}

fn parse_station_row(row: &rusqlite::Row) -> rusqlite::Result<Station> {
    Ok(Station {
        id: row.get(0)?,
        name: row.get(1)?,
        latitude: row.get(2)?,
        longitude: row.get(3)?,
        company: row.get(4)?,
        status: StationStatus {
            open_hours: row.get(5)?,
            close_hours: row.get(6)?,
            is_open: row.get(7)?,
        },
        connectors: vec![],
    })
}

fn parse_connector_row(row: &rusqlite::Row) -> rusqlite::Result<Connector> {
    let username: Option<String> = row.get(5)?;
    let end_time: Option<String> = row.get(6)?;

    let booking = match (username, end_time) {
        (Some(username), Some(_)) => Some(Booking {
            username,
            booking_end_time: parse_time_column(row, 6)?,
        }),
        _ => None,
    };

    Ok(Connector {
        connector_id: row.get(0)?,
        connector_type: row.get(1)?,
        plug_name: row.get(2)?,
        price_per_unit: row.get(3)?,
        power_output: row.get(4)?,
        booking,
    })
}

fn parse_time_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, BOOKING_TIME_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
