// Sample source files in the exact layout the extractor reads.

use crate::errors::{EtlError, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SampleListing {
    pub id: i64,
    pub name: &'static str,
    pub host_name: &'static str,
    pub neighbourhood: &'static str,
    pub room_type: &'static str,
    pub price: i64,
    pub number_of_reviews: i64,
    pub availability_365: i64,
}

const fn sample(
    id: i64,
    name: &'static str,
    host_name: &'static str,
    neighbourhood: &'static str,
    room_type: &'static str,
    price: i64,
    number_of_reviews: i64,
    availability_365: i64,
) -> SampleListing {
    SampleListing {
        id,
        name,
        host_name,
        neighbourhood,
        room_type,
        price,
        number_of_reviews,
        availability_365,
    }
}

pub const CAPE_TOWN: &[SampleListing] = &[
    sample(1001, "Seaside Apartment in Muizenberg", "John", "Muizenberg", "Entire home/apt", 850, 42, 180),
    sample(1002, "Cozy Studio in City Bowl", "Mary", "City Bowl", "Private room", 500, 58, 200),
    sample(1003, "Camps Bay Villa with View", "Richard", "Camps Bay", "Entire home/apt", 2500, 12, 365),
];

pub const JOHANNESBURG: &[SampleListing] = &[
    sample(2001, "Sandton High-Rise Apartment", "Lerato", "Sandton", "Entire home/apt", 1200, 33, 150),
    sample(2002, "Braamfontein Budget Room", "Themba", "Braamfontein", "Shared room", 300, 76, 220),
    sample(2003, "Maboneng Loft", "Ayanda", "Maboneng", "Entire home/apt", 700, 21, 365),
];

pub fn write_listings_csv(path: &Path, rows: &[SampleListing]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| EtlError::Io(e.into()))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| EtlError::Io(e.into()))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes `cape_town_listings.csv` and `johannesburg_listings.csv` into `dir`.
pub fn write_sample_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (source_id, rows) in [("cape_town", CAPE_TOWN), ("johannesburg", JOHANNESBURG)] {
        let path = dir.join(format!("{source_id}_listings.csv"));
        write_listings_csv(&path, rows)?;
        info!(path = %path.display(), rows = rows.len(), "wrote sample source");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::extract::read_csv;
    use crate::schema;

    #[test]
    fn samples_carry_every_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_sample_sources(dir.path()).unwrap();
        assert_eq!(paths.len(), 2);

        let batch = read_csv("cape_town", &paths[0]).unwrap();
        assert!(schema::missing_required(&batch.columns).is_empty());
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.records[2].get("name"), Some("Camps Bay Villa with View"));
        assert_eq!(batch.records[0].get("host_name"), Some("John"));
    }
}
