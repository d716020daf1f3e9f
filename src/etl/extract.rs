use crate::config::Config;
use crate::domain::{RawBatch, RawRecord};
use crate::errors::{EtlError, Result};
use crate::schema;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Reads one source's CSV into a `RawBatch`.
pub struct Extractor<'a> {
    config: &'a Config,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn extract(&self, source_id: &str) -> Result<RawBatch> {
        let path = self.config.raw_path(source_id);
        let batch = read_csv(source_id, &path)?;
        info!(source = source_id, rows = batch.len(), "extracted rows");
        Ok(batch)
    }
}

fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Reads `path`, keeping only registry-known columns. Row order is preserved.
pub fn read_csv(source_id: &str, path: &Path) -> Result<RawBatch> {
    let invalid = |reason: String| EtlError::InvalidFormat {
        source_id: source_id.to_string(),
        path: path.to_path_buf(),
        reason,
    };

    if !path.exists() {
        return Err(EtlError::MissingSource {
            source_id: source_id.to_string(),
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(invalid("not a regular file".into()));
    }
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return Err(invalid("expected a .csv file".into()));
    }

    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| invalid(format!("unreadable header: {e}")))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let dropped: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|h| !h.is_empty() && !schema::is_known_column(h))
        .collect();
    if !dropped.is_empty() {
        debug!(source = source_id, columns = ?dropped, "dropping unrecognized columns");
    }

    let keep: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| schema::is_known_column(h))
        .collect();

    let mut batch = RawBatch::new(keep.iter().map(|(_, h)| (*h).clone()).collect());

    for result in reader.records() {
        let record = result.map_err(|e| invalid(e.to_string()))?;
        let mut raw = RawRecord::new();
        for (idx, name) in &keep {
            raw.set(name.as_str(), record.get(*idx).map(str::to_string));
        }
        batch.records.push(raw);
    }

    Ok(batch)
}
