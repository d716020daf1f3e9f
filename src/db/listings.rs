use crate::domain::Listing;
use crate::errors::EtlError;
use crate::schema::{self, KEY_COLUMN, TABLE_NAME};
use rusqlite::{params_from_iter, Connection, Transaction};

/// `CREATE TABLE IF NOT EXISTS`. An existing table is left exactly as it is.
pub fn ensure_listings_table(conn: &Connection) -> Result<(), EtlError> {
    conn.execute_batch(&schema::create_table_sql())
        .map_err(|e| EtlError::LoadFailure(format!("create table failed: {e}")))
}

/// Insert-or-overwrite keyed on `id`. The key itself is never in the SET list.
pub fn upsert_sql() -> String {
    let columns = schema::table_column_names();
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .filter(|c| **c != KEY_COLUMN)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!(
        "INSERT INTO {TABLE_NAME} ({}) VALUES ({placeholders})\n\
         ON CONFLICT({KEY_COLUMN}) DO UPDATE SET\n    {updates}",
        columns.join(", ")
    )
}

/// Writes every listing inside `tx`. The caller commits; dropping `tx`
/// after an error rolls back everything written here.
pub fn upsert_listings(tx: &Transaction<'_>, listings: &[Listing]) -> Result<usize, EtlError> {
    let mut stmt = tx
        .prepare(&upsert_sql())
        .map_err(|e| EtlError::LoadFailure(format!("prepare upsert failed: {e}")))?;

    for listing in listings {
        stmt.execute(params_from_iter(listing.table_row()))
            .map_err(|e| EtlError::LoadFailure(format!("upsert of id {} failed: {e}", listing.id)))?;
    }

    Ok(listings.len())
}

pub fn count_listings(conn: &Connection) -> Result<i64, EtlError> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {TABLE_NAME}"), [], |r| r.get(0))
        .map_err(|e| EtlError::Query(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_never_updates_the_key() {
        let sql = upsert_sql();
        assert!(sql.contains("ON CONFLICT(id) DO UPDATE SET"));
        assert!(!sql.contains("id = excluded.id"));
        assert!(sql.contains("host_id = excluded.host_id"));
        assert!(sql.contains("last_updated = excluded.last_updated"));
        assert!(sql.contains("?12"));
        assert!(!sql.contains("?13"));
    }

    #[test]
    fn ensure_table_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_listings_table(&conn).unwrap();
        ensure_listings_table(&conn).unwrap();
        assert_eq!(count_listings(&conn).unwrap(), 0);
    }
}
