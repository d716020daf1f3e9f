// src/schema.rs
//
// Column registry shared by the extractor, transformer and loader. Nothing
// else in the crate spells out column names for the listings table.

/// Semantic type a column is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
}

const fn col(name: &'static str, ty: ColumnType) -> ColumnDef {
    ColumnDef { name, ty }
}

pub const TABLE_NAME: &str = "listings";

/// The primary key of the persisted table.
pub const KEY_COLUMN: &str = "id";

/// Columns a source file must carry.
pub const REQUIRED_INPUT_COLUMNS: &[&str] = &["id", "name", "price", "neighbourhood", "room_type"];

/// Every column a source file may carry that the pipeline understands.
/// Anything else is dropped on read.
pub const INPUT_COLUMNS: &[ColumnDef] = &[
    col("id", ColumnType::Integer),
    col("name", ColumnType::Text),
    col("host_id", ColumnType::Integer),
    col("host_name", ColumnType::Text),
    col("neighbourhood", ColumnType::Text),
    col("room_type", ColumnType::Text),
    col("price", ColumnType::Real),
    col("latitude", ColumnType::Real),
    col("longitude", ColumnType::Real),
    col("number_of_reviews", ColumnType::Integer),
    col("availability_365", ColumnType::Integer),
];

/// Persisted columns, in table order.
pub const TABLE_COLUMNS: &[ColumnDef] = &[
    col("id", ColumnType::Integer),
    col("name", ColumnType::Text),
    col("host_id", ColumnType::Integer),
    col("neighbourhood", ColumnType::Text),
    col("room_type", ColumnType::Text),
    col("price", ColumnType::Real),
    col("latitude", ColumnType::Real),
    col("longitude", ColumnType::Real),
    col("availability_365", ColumnType::Integer),
    col("city", ColumnType::Text),
    col("ingestion_date", ColumnType::Timestamp),
    col("last_updated", ColumnType::Timestamp),
];

/// Room type categories seen in practice. Not enforced.
pub const ROOM_TYPES: &[&str] = &["Entire home/apt", "Private room", "Shared room", "Hotel room"];

/// Accepted nightly price range, inclusive on both ends.
pub const PRICE_MIN: f64 = 10.0;
pub const PRICE_MAX: f64 = 10_000.0;

pub fn is_known_column(name: &str) -> bool {
    INPUT_COLUMNS.iter().any(|c| c.name == name) || TABLE_COLUMNS.iter().any(|c| c.name == name)
}

/// Declared type of an input column, if the registry knows it.
pub fn input_type(name: &str) -> Option<ColumnType> {
    INPUT_COLUMNS.iter().find(|c| c.name == name).map(|c| c.ty)
}

pub fn table_column_names() -> Vec<&'static str> {
    TABLE_COLUMNS.iter().map(|c| c.name).collect()
}

/// Required columns absent from `columns`, in registry order.
pub fn missing_required<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    REQUIRED_INPUT_COLUMNS
        .iter()
        .filter(|req| !columns.iter().any(|c| c.as_ref() == **req))
        .map(|req| req.to_string())
        .collect()
}

pub fn create_table_sql() -> String {
    let cols = TABLE_COLUMNS
        .iter()
        .map(|c| {
            if c.name == KEY_COLUMN {
                format!("    {} {} PRIMARY KEY", c.name, c.ty.sql_type())
            } else {
                format!("    {} {}", c.name, c.ty.sql_type())
            }
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!("CREATE TABLE IF NOT EXISTS {TABLE_NAME} (\n{cols}\n)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_columns_are_known_input_columns() {
        for req in REQUIRED_INPUT_COLUMNS {
            assert!(INPUT_COLUMNS.iter().any(|c| c.name == *req), "{req}");
        }
    }

    #[test]
    fn missing_required_reports_in_registry_order() {
        let cols = ["room_type", "id", "extra"];
        assert_eq!(missing_required(&cols), vec!["name", "price", "neighbourhood"]);
    }

    #[test]
    fn create_table_declares_key_and_every_column() {
        let sql = create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS listings"));
        assert!(sql.contains("id INTEGER PRIMARY KEY"));
        for c in TABLE_COLUMNS {
            assert!(sql.contains(c.name), "{}", c.name);
        }
    }

    #[test]
    fn unknown_columns_are_not_known() {
        assert!(is_known_column("host_name"));
        assert!(is_known_column("city"));
        assert!(!is_known_column("license"));
    }
}
