use crate::config::{Config, SourceConfig};
use crate::domain::logic::{clean_price, host_surrogate_id, parse_integer, parse_real};
use crate::domain::{CanonicalBatch, Listing, RawBatch, RawRecord};
use crate::errors::{EtlError, Result};
use crate::schema::{self, ColumnType, PRICE_MAX, PRICE_MIN};
use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info, warn};

/// Typed row between coercion and filtering.
#[derive(Debug, Clone, PartialEq)]
struct CoercedRow {
    id: i64,
    name: Option<String>,
    host_id: Option<i64>,
    neighbourhood: Option<String>,
    room_type: Option<String>,
    price: Option<f64>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    availability_365: Option<i64>,
}

/// Cleans a raw batch into canonical listings for one source.
pub struct Transformer<'a> {
    config: &'a Config,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn transform(&self, batch: RawBatch, source_id: &str) -> Result<CanonicalBatch> {
        self.transform_at(batch, source_id, Utc::now().naive_utc())
    }

    /// Same as `transform` with the ingestion instant supplied by the caller.
    pub fn transform_at(
        &self,
        mut batch: RawBatch,
        source_id: &str,
        now: NaiveDateTime,
    ) -> Result<CanonicalBatch> {
        let source = self.config.source(source_id).ok_or_else(|| {
            EtlError::Config(format!("source '{source_id}' is not configured"))
        })?;

        let empty = CanonicalBatch {
            source_id: source_id.to_string(),
            ingested_at: now,
            listings: Vec::new(),
        };

        // A zero-byte file has no header at all; nothing to validate.
        if batch.columns.is_empty() && batch.is_empty() {
            return Ok(empty);
        }

        let missing = schema::missing_required(&batch.columns);
        if !missing.is_empty() {
            return Err(EtlError::SchemaViolation {
                source_id: source_id.to_string(),
                missing,
            });
        }

        if batch.is_empty() {
            return Ok(empty);
        }
        let rows_in = batch.len();

        // Order matters: each step relies on the shape the previous one left.
        batch.retain_known_columns();
        backfill_coordinates(&mut batch, source);
        backfill_host_id(&mut batch);
        normalize_prices(&mut batch);
        let coerced = coerce(&batch, source_id);
        note_unusual_room_types(&coerced, source_id);
        let kept = filter_rows(coerced);
        let listings = stamp(kept, source_id, now);

        if listings.is_empty() {
            return Err(EtlError::EmptyResult {
                source_id: source_id.to_string(),
                rows_in,
            });
        }

        info!(
            source = source_id,
            valid = listings.len(),
            dropped = rows_in - listings.len(),
            "transformed rows"
        );

        Ok(CanonicalBatch {
            listings,
            ..empty
        })
    }
}

/// A missing coordinate column gets the source's centroid on every row.
fn backfill_coordinates(batch: &mut RawBatch, source: &SourceConfig) {
    if !batch.has_column("latitude") {
        warn!(source = %source.name, "no latitude column, using default centroid");
        batch.fill_column("latitude", &source.default_latitude.to_string());
    }
    if !batch.has_column("longitude") {
        warn!(source = %source.name, "no longitude column, using default centroid");
        batch.fill_column("longitude", &source.default_longitude.to_string());
    }
}

/// Without a numeric host id, the host name stands in for it.
fn backfill_host_id(batch: &mut RawBatch) {
    if batch.has_column("host_id") || !batch.has_column("host_name") {
        return;
    }
    batch.rename_column("host_name", "host_id");
    for record in &mut batch.records {
        let surrogate = record.get("host_id").map(|name| host_surrogate_id(name).to_string());
        record.set("host_id", surrogate);
    }
}

fn normalize_prices(batch: &mut RawBatch) {
    for record in &mut batch.records {
        let cleaned = record.get("price").and_then(clean_price).map(|p| p.to_string());
        record.set("price", cleaned);
    }
}

/// A raw cell cast to the type the registry declares for its column.
#[derive(Debug, Clone, PartialEq)]
enum Typed {
    Integer(i64),
    Real(f64),
    Text(String),
}

fn cast(record: &RawRecord, column: &str) -> Option<Typed> {
    let raw = record.get(column)?;
    match schema::input_type(column)? {
        ColumnType::Integer => parse_integer(raw).map(Typed::Integer),
        ColumnType::Real => parse_real(raw).map(Typed::Real),
        ColumnType::Text | ColumnType::Timestamp => Some(Typed::Text(raw.to_string())),
    }
}

fn integer(record: &RawRecord, column: &str) -> Option<i64> {
    match cast(record, column)? {
        Typed::Integer(i) => Some(i),
        _ => None,
    }
}

fn real(record: &RawRecord, column: &str) -> Option<f64> {
    match cast(record, column)? {
        Typed::Real(f) => Some(f),
        Typed::Integer(i) => Some(i as f64),
        Typed::Text(_) => None,
    }
}

fn text(record: &RawRecord, column: &str) -> Option<String> {
    match cast(record, column)? {
        Typed::Text(t) => Some(t),
        _ => None,
    }
}

fn coerce(batch: &RawBatch, source_id: &str) -> Vec<CoercedRow> {
    batch
        .records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| {
            let Some(id) = integer(r, "id") else {
                debug!(source = source_id, row = i, raw_id = ?r.get("id"), "dropping row without a usable id");
                return None;
            };
            Some(CoercedRow {
                id,
                name: text(r, "name"),
                host_id: integer(r, "host_id"),
                neighbourhood: text(r, "neighbourhood"),
                room_type: text(r, "room_type"),
                price: real(r, "price"),
                latitude: real(r, "latitude"),
                longitude: real(r, "longitude"),
                availability_365: integer(r, "availability_365"),
            })
        })
        .collect()
}

fn note_unusual_room_types(rows: &[CoercedRow], source_id: &str) {
    for r in rows {
        if let Some(rt) = r.room_type.as_deref().filter(|rt| !schema::ROOM_TYPES.contains(rt)) {
            debug!(source = source_id, id = r.id, room_type = rt, "unusual room type");
        }
    }
}

fn filter_rows(rows: Vec<CoercedRow>) -> Vec<CoercedRow> {
    rows.into_iter()
        .filter(|r| r.latitude.is_some() && r.longitude.is_some())
        .filter(|r| r.price.is_some_and(|p| (PRICE_MIN..=PRICE_MAX).contains(&p)))
        .collect()
}

fn stamp(rows: Vec<CoercedRow>, source_id: &str, now: NaiveDateTime) -> Vec<Listing> {
    rows.into_iter()
        .filter_map(|r| {
            Some(Listing {
                id: r.id,
                name: r.name,
                host_id: r.host_id,
                neighbourhood: r.neighbourhood,
                room_type: r.room_type,
                price: r.price?,
                latitude: r.latitude?,
                longitude: r.longitude?,
                availability_365: r.availability_365,
                city: source_id.to_string(),
                ingestion_date: now,
                last_updated: now,
            })
        })
        .collect()
}
