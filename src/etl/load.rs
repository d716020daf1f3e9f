use crate::db::listings::{count_listings, ensure_listings_table, upsert_listings};
use crate::db::Database;
use crate::domain::CanonicalBatch;
use crate::errors::{EtlError, Result};
use tracing::info;

/// Upserts canonical batches into the listings table.
pub struct Loader {
    db: Database,
}

impl Loader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All-or-nothing: either every listing in `batch` is written, or the
    /// transaction is rolled back and `LoadFailure` is returned.
    pub fn load(&self, batch: &CanonicalBatch) -> Result<usize> {
        let (written, table_rows) = self.db.with_conn(|conn| {
            let tx = conn
                .transaction()
                .map_err(|e| EtlError::LoadFailure(format!("begin failed: {e}")))?;

            ensure_listings_table(&tx)?;
            let written = upsert_listings(&tx, &batch.listings)?;

            tx.commit()
                .map_err(|e| EtlError::LoadFailure(format!("commit failed: {e}")))?;
            Ok((written, count_listings(conn).ok()))
        })?;

        info!(source = %batch.source_id, records = written, table_rows, "loaded records");
        Ok(written)
    }
}
