// src/tests/utils.rs
use crate::config::Config;
use crate::db::Database;
use crate::domain::{CanonicalBatch, Listing};
use crate::errors::EtlError;
use crate::etl::{Loader, Pipeline};
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: &str = "id,name,host_name,neighbourhood,room_type,price,latitude,longitude,availability_365";

/// Scratch directory with a config pointing every path inside it.
pub struct TestEnv {
    pub dir: TempDir,
    pub config: Config,
}

pub fn test_env() -> TestEnv {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path();
    let config = Config {
        raw_dir: root.join("raw"),
        processed_dir: root.join("processed"),
        db_path: root.join("db/listings.db"),
        log_dir: root.join("logs"),
        ..Config::default()
    };
    fs::create_dir_all(&config.raw_dir).expect("raw dir");
    TestEnv { dir, config }
}

impl TestEnv {
    pub fn write_source(&self, source_id: &str, content: &str) -> PathBuf {
        let path = self.config.raw_path(source_id);
        fs::write(&path, content).expect("write source");
        path
    }

    pub fn database(&self) -> Database {
        Database::new(&self.config.db_path)
    }

    pub fn run(&self, sources: &[&str]) -> Result<crate::etl::RunSummary, EtlError> {
        let sources: Vec<String> = sources.iter().map(|s| s.to_string()).collect();
        Pipeline::new(&self.config, Loader::new(self.database())).run(&sources)
    }
}

pub fn at(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn listing(id: i64, name: &str, price: f64, city: &str, when: NaiveDateTime) -> Listing {
    Listing {
        id,
        name: Some(name.to_string()),
        host_id: Some(42),
        neighbourhood: Some("Sandton".to_string()),
        room_type: Some("Entire home/apt".to_string()),
        price,
        latitude: -26.1,
        longitude: 28.05,
        availability_365: Some(150),
        city: city.to_string(),
        ingestion_date: when,
        last_updated: when,
    }
}

pub fn batch(source_id: &str, when: NaiveDateTime, listings: Vec<Listing>) -> CanonicalBatch {
    CanonicalBatch {
        source_id: source_id.to_string(),
        ingested_at: when,
        listings,
    }
}

/// Every stored row, ordered by id.
pub fn stored_listings(db: &Database) -> Vec<Listing> {
    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, name, host_id, neighbourhood, room_type, price,
                       latitude, longitude, availability_365, city,
                       ingestion_date, last_updated
                FROM listings
                ORDER BY id
                "#,
            )
            .map_err(|e| EtlError::Query(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Listing {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    host_id: row.get(2)?,
                    neighbourhood: row.get(3)?,
                    room_type: row.get(4)?,
                    price: row.get(5)?,
                    latitude: row.get(6)?,
                    longitude: row.get(7)?,
                    availability_365: row.get(8)?,
                    city: row.get(9)?,
                    ingestion_date: row.get(10)?,
                    last_updated: row.get(11)?,
                })
            })
            .map_err(|e| EtlError::Query(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r.map_err(|e| EtlError::Query(e.to_string()))?);
        }
        Ok(out)
    })
    .expect("read stored listings")
}
