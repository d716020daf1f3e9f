// Read-only queries behind the `explore` subcommand.

use crate::db::connection::Database;
use crate::errors::EtlError;
use crate::schema::TABLE_NAME;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Params, Statement};
use std::fmt;

const SQL_LATEST_LISTINGS: &str = include_str!("../../sql/latest_listings.sql");
const SQL_CITY_STATS: &str = include_str!("../../sql/city_stats.sql");

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<ValueRef<'_>> for Cell {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Text(format!("<blob {} bytes>", b.len())),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, ""),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Real(r) => write!(f, "{r}"),
            Cell::Text(t) => write!(f, "{t}"),
        }
    }
}

/// Column headers plus rows, as returned by any explorer query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn query_grid<P: Params>(stmt: &mut Statement<'_>, params: P) -> Result<Grid, EtlError> {
    let headers: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = headers.len();

    let mut rows = stmt
        .query(params)
        .map_err(|e| EtlError::Query(e.to_string()))?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(|e| EtlError::Query(e.to_string()))? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            let v = row.get_ref(i).map_err(|e| EtlError::Query(e.to_string()))?;
            cells.push(Cell::from(v));
        }
        out.push(cells);
    }

    Ok(Grid { headers, rows: out })
}

pub fn table_exists(conn: &Connection) -> Result<bool, EtlError> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![TABLE_NAME],
            |r| r.get(0),
        )
        .map_err(|e| EtlError::Query(e.to_string()))?;
    Ok(n > 0)
}

/// Read-only view over a populated listings database.
pub struct Explorer<'a> {
    db: &'a Database,
}

impl<'a> Explorer<'a> {
    /// Fails with `NotPopulated` if the file or the table is missing.
    pub fn open(db: &'a Database) -> Result<Self, EtlError> {
        let populated = db.with_read_only_conn(table_exists)?;
        if !populated {
            return Err(EtlError::NotPopulated(format!(
                "table '{TABLE_NAME}' does not exist in '{}', run the pipeline first",
                db.path().display()
            )));
        }
        Ok(Self { db })
    }

    /// Column layout (`PRAGMA table_info`) and indexes (`PRAGMA index_list`).
    pub fn schema(&self) -> Result<(Grid, Grid), EtlError> {
        self.db.with_read_only_conn(|conn| {
            let mut info = conn
                .prepare(&format!("PRAGMA table_info({TABLE_NAME})"))
                .map_err(|e| EtlError::Query(e.to_string()))?;
            let columns = query_grid(&mut info, [])?;

            let mut idx = conn
                .prepare(&format!("PRAGMA index_list({TABLE_NAME})"))
                .map_err(|e| EtlError::Query(e.to_string()))?;
            let indexes = query_grid(&mut idx, [])?;

            Ok((columns, indexes))
        })
    }

    pub fn latest(&self, limit: usize) -> Result<Grid, EtlError> {
        self.db.with_read_only_conn(|conn| {
            let mut stmt = conn
                .prepare(SQL_LATEST_LISTINGS)
                .map_err(|e| EtlError::Query(e.to_string()))?;
            query_grid(&mut stmt, params![i64::try_from(limit).unwrap_or(i64::MAX)])
        })
    }

    pub fn city_stats(&self) -> Result<Grid, EtlError> {
        self.db.with_read_only_conn(|conn| {
            let mut stmt = conn
                .prepare(SQL_CITY_STATS)
                .map_err(|e| EtlError::Query(e.to_string()))?;
            query_grid(&mut stmt, [])
        })
    }

    /// Runs a free-form statement. Anything that would write is rejected
    /// before execution.
    pub fn query(&self, sql: &str) -> Result<Grid, EtlError> {
        let sql = sql.trim().trim_end_matches(';');
        if sql.is_empty() {
            return Err(EtlError::Query("empty query".into()));
        }
        self.db.with_read_only_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| EtlError::Query(e.to_string()))?;
            if !stmt.readonly() {
                return Err(EtlError::Query(
                    "only read-only statements are allowed".into(),
                ));
            }
            query_grid(&mut stmt, [])
        })
    }
}
