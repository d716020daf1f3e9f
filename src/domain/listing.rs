// src/domain/listing.rs

use crate::schema;
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use serde::Serialize;
use std::collections::HashMap;

/// One row as read from a source file. Empty cells are stored as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.set(k, Some(v.into()));
        }
        record
    }

    /// Non-empty, trimmed value of `column`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn set(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => {
                self.fields.insert(column, v);
            }
            None => {
                self.fields.remove(&column);
            }
        }
    }

    pub fn take(&mut self, column: &str) -> Option<String> {
        self.fields.remove(column)
    }

    pub fn retain_columns<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.fields.retain(|k, _| keep(k));
    }
}

/// Ordered rows of one source, plus the header they were read with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBatch {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            records: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_records(columns: &[&str], records: Vec<RawRecord>) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Drops every column the registry does not know about.
    pub fn retain_known_columns(&mut self) {
        self.columns.retain(|c| schema::is_known_column(c));
        for record in &mut self.records {
            record.retain_columns(schema::is_known_column);
        }
    }

    pub fn rename_column(&mut self, from: &str, to: &str) {
        for c in self.columns.iter_mut().filter(|c| c.as_str() == from) {
            *c = to.to_string();
        }
        for record in &mut self.records {
            let value = record.take(from);
            record.set(to, value);
        }
    }

    /// Adds `column` with the same value on every row.
    pub fn fill_column(&mut self, column: &str, value: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for record in &mut self.records {
            record.set(column, Some(value.to_string()));
        }
    }
}

/// A cleaned listing, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub id: i64,
    pub name: Option<String>,
    pub host_id: Option<i64>,
    pub neighbourhood: Option<String>,
    pub room_type: Option<String>,
    pub price: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub availability_365: Option<i64>,
    pub city: String,
    pub ingestion_date: NaiveDateTime,
    pub last_updated: NaiveDateTime,
}

/// Same layout rusqlite's chrono support writes and reads back.
const SQL_TIMESTAMP_FORMAT: &str = "%F %T%.f";

impl Listing {
    /// Value bound for a persisted column. `None` for columns outside the table.
    pub fn column_value(&self, column: &str) -> Option<Value> {
        let text = |s: &Option<String>| s.clone().map(Value::Text).unwrap_or(Value::Null);
        let int = |i: Option<i64>| i.map(Value::Integer).unwrap_or(Value::Null);
        let ts = |t: &NaiveDateTime| Value::Text(t.format(SQL_TIMESTAMP_FORMAT).to_string());

        let value = match column {
            "id" => Value::Integer(self.id),
            "name" => text(&self.name),
            "host_id" => int(self.host_id),
            "neighbourhood" => text(&self.neighbourhood),
            "room_type" => text(&self.room_type),
            "price" => Value::Real(self.price),
            "latitude" => Value::Real(self.latitude),
            "longitude" => Value::Real(self.longitude),
            "availability_365" => int(self.availability_365),
            "city" => Value::Text(self.city.clone()),
            "ingestion_date" => ts(&self.ingestion_date),
            "last_updated" => ts(&self.last_updated),
            _ => return None,
        };
        Some(value)
    }

    /// Values for the persisted table, in table order.
    pub fn table_row(&self) -> Vec<Value> {
        schema::TABLE_COLUMNS
            .iter()
            .filter_map(|c| self.column_value(c.name))
            .collect()
    }
}

/// Output of the transformer for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalBatch {
    pub source_id: String,
    pub ingested_at: NaiveDateTime,
    pub listings: Vec<Listing>,
}

impl CanonicalBatch {
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
