// src/storage/csv_format.rs
//
// Snapshot rows, one listing per line, under a header row. Readers find
// columns by name, so column order in older files does not matter.

use crate::domain::Listing;
use crate::storage::StorageError;
use std::io::{Read, Write};
use std::str::FromStr;
use tracing::{debug, warn};

/// Columns every snapshot must carry.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "id",
    "name",
    "address",
    "age",
    "floor",
    "rent",
    "management_fee",
    "deposit",
    "key_money",
    "layout",
    "area",
    "walk_minutes",
    "url",
];

/// Written after the required columns; optional on read.
pub const STATION_COLUMN: &str = "nearest_station";

/// Reads a snapshot. Rows may be short; missing or unreadable numeric
/// cells load as zero so one damaged row cannot block later cycles.
/// Rows without an id are skipped.
pub fn read_listings<R: Read>(reader: R) -> Result<Vec<Listing>, StorageError> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }

    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, col) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h == col)
            .ok_or(StorageError::MissingColumn(col))?;
    }
    let station = headers.iter().position(|h| h == STATION_COLUMN);

    let mut listings = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let text = |i: usize| record.get(i).unwrap_or("");
        let cell = |col: usize| text(index[col]);

        if cell(0).trim().is_empty() {
            warn!(row = row + 2, "skipping snapshot row without id");
            continue;
        }

        listings.push(Listing {
            id: cell(0).to_string(),
            name: cell(1).to_string(),
            address: cell(2).to_string(),
            age: lenient(cell(3), "age"),
            floor: lenient(cell(4), "floor"),
            rent: lenient(cell(5), "rent"),
            management_fee: lenient(cell(6), "management_fee"),
            deposit: cell(7).to_string(),
            key_money: cell(8).to_string(),
            layout: cell(9).to_string(),
            area: lenient(cell(10), "area"),
            walk_minutes: lenient(cell(11), "walk_minutes"),
            url: cell(12).to_string(),
            nearest_station: station.map(text).unwrap_or("").to_string(),
        });
    }

    Ok(listings)
}

fn lenient<T: FromStr + Default>(raw: &str, column: &'static str) -> T {
    let raw = raw.trim();
    if raw.is_empty() {
        return T::default();
    }
    raw.parse().unwrap_or_else(|_| {
        debug!(column, raw, "unreadable snapshot cell, using zero");
        T::default()
    })
}

pub fn write_listings<W: Write>(writer: W, listings: &[Listing]) -> Result<(), StorageError> {
    let mut wtr = csv::Writer::from_writer(writer);

    if listings.is_empty() {
        // serialize() only emits the header alongside the first row
        wtr.write_record(REQUIRED_COLUMNS.iter().chain([&STATION_COLUMN]))?;
    }
    for listing in listings {
        wtr.serialize(listing)?;
    }

    wtr.flush()?;
    Ok(())
}
