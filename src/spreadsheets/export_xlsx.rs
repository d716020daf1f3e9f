use crate::db::explorer::{Cell, Grid};
use crate::errors::EtlError;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Writes `grid` to a single-sheet workbook at `path`: headers on row 0,
/// numbers as numbers, NULL as an empty cell.
pub fn export_grid_xlsx(grid: &Grid, sheet_name: &str, path: &Path) -> Result<(), EtlError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet
        .set_name(sheet_name)
        .map_err(|e| EtlError::Export(format!("Invalid sheet name '{}': {}", sheet_name, e)))?;

    for (col, header) in grid.headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, header)
            .map_err(|e| {
                EtlError::Export(format!("Failed to write header '{}': {}", header, e))
            })?;
    }

    for (i, row) in grid.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            let written = match cell {
                Cell::Null => continue,
                Cell::Integer(n) => worksheet.write_number(r, c, *n as f64),
                Cell::Real(x) => worksheet.write_number(r, c, *x),
                Cell::Text(t) => worksheet.write_string(r, c, t),
            };
            written.map_err(|e| {
                EtlError::Export(format!("Failed to write row {} column {}: {}", r, c, e))
            })?;
        }
    }

    workbook
        .save(path)
        .map_err(|e| EtlError::Export(format!("Failed to save workbook: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_workbook_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.xlsx");
        let grid = Grid {
            headers: vec!["city".into(), "total_listings".into(), "avg_price".into()],
            rows: vec![
                vec![Cell::Text("cape_town".into()), Cell::Integer(2), Cell::Real(675.0)],
                vec![Cell::Text("johannesburg".into()), Cell::Integer(3), Cell::Null],
            ],
        };

        export_grid_xlsx(&grid, "City Stats", &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        // xlsx is a zip container
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn rejects_invalid_sheet_names() {
        let dir = tempfile::tempdir().unwrap();
        let grid = Grid::default();
        match export_grid_xlsx(&grid, "bad[name]", &dir.path().join("x.xlsx")) {
            Err(EtlError::Export(_)) => {}
            other => panic!("expected Export error, got: {:?}", other),
        }
    }
}
