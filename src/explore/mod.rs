// Read-only explorer over the listings database.

mod render;

pub use render::render_table;

use crate::db::explorer::{Explorer, Grid};
use crate::db::Database;
use crate::errors::EtlError;
use crate::spreadsheets::export_grid_xlsx;
use std::io::{BufRead, Write};
use std::path::Path;

const DEFAULT_LATEST: usize = 5;

/// One explorer action, as picked on the command line or in the menu.
#[derive(Debug, Clone, PartialEq)]
pub enum ExploreAction {
    Latest(usize),
    Stats,
    Schema,
    Query(String),
}

fn write_grid<W: Write>(out: &mut W, title: &str, grid: &Grid) -> Result<(), EtlError> {
    writeln!(out, "\n=== {title} ===")?;
    writeln!(out, "{}", render_table(grid))?;
    if grid.is_empty() {
        writeln!(out, "(no rows)")?;
    }
    Ok(())
}

/// Runs `action`, prints the result and returns the main grid so callers can export it.
pub fn run_action<W: Write>(
    explorer: &Explorer<'_>,
    action: &ExploreAction,
    out: &mut W,
) -> Result<Grid, EtlError> {
    match action {
        ExploreAction::Latest(n) => {
            let grid = explorer.latest(*n)?;
            write_grid(out, &format!("Latest {n} Entries"), &grid)?;
            Ok(grid)
        }
        ExploreAction::Stats => {
            let grid = explorer.city_stats()?;
            write_grid(out, "City Statistics", &grid)?;
            Ok(grid)
        }
        ExploreAction::Schema => {
            let (columns, indexes) = explorer.schema()?;
            write_grid(out, "Table Schema", &columns)?;
            write_grid(out, "Indexes", &indexes)?;
            Ok(columns)
        }
        ExploreAction::Query(sql) => {
            let grid = explorer.query(sql)?;
            write_grid(out, "Query Results", &grid)?;
            writeln!(out, "\nReturned {} rows", grid.len())?;
            Ok(grid)
        }
    }
}

/// Non-interactive entry point: one action, optionally exported to xlsx.
pub fn explore_once<W: Write>(
    db: &Database,
    action: &ExploreAction,
    export: Option<&Path>,
    out: &mut W,
) -> Result<(), EtlError> {
    let explorer = Explorer::open(db)?;
    let grid = run_action(&explorer, action, out)?;
    if let Some(path) = export {
        export_grid_xlsx(&grid, sheet_name(action), path)?;
        writeln!(out, "Exported {} rows to {}", grid.len(), path.display())?;
    }
    Ok(())
}

fn sheet_name(action: &ExploreAction) -> &'static str {
    match action {
        ExploreAction::Latest(_) => "Latest",
        ExploreAction::Stats => "City Stats",
        ExploreAction::Schema => "Schema",
        ExploreAction::Query(_) => "Query",
    }
}

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> Result<Option<String>, EtlError> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Menu loop. Query errors are printed and the loop continues; end of input exits.
pub fn interactive<R: BufRead, W: Write>(db: &Database, input: &mut R, out: &mut W) -> Result<(), EtlError> {
    let explorer = Explorer::open(db)?;
    writeln!(out, "\n🏠 Listings Database Explorer")?;

    loop {
        writeln!(out, "\nOptions:")?;
        writeln!(out, "1. Show latest listings")?;
        writeln!(out, "2. View city statistics")?;
        writeln!(out, "3. Show table schema")?;
        writeln!(out, "4. Run custom query")?;
        writeln!(out, "5. Exit")?;

        let Some(choice) = prompt(input, out, "\nEnter choice (1-5): ")? else {
            return Ok(());
        };

        let action = match choice.as_str() {
            "1" => {
                let Some(limit) = prompt(input, out, &format!("How many entries to show? (default {DEFAULT_LATEST}): "))? else {
                    return Ok(());
                };
                match limit.as_str() {
                    "" => ExploreAction::Latest(DEFAULT_LATEST),
                    n => match n.parse::<usize>() {
                        Ok(n) => ExploreAction::Latest(n),
                        Err(_) => {
                            writeln!(out, "Not a number: {n}")?;
                            continue;
                        }
                    },
                }
            }
            "2" => ExploreAction::Stats,
            "3" => ExploreAction::Schema,
            "4" => {
                let Some(sql) = prompt(input, out, "Enter SQL query: ")? else {
                    return Ok(());
                };
                ExploreAction::Query(sql)
            }
            "5" => {
                writeln!(out, "Goodbye! 👋")?;
                return Ok(());
            }
            _ => {
                writeln!(out, "Invalid choice. Please try again.")?;
                continue;
            }
        };

        match run_action(&explorer, &action, out) {
            Ok(_) => {}
            Err(e @ EtlError::Query(_)) => writeln!(out, "\n⚠️ {e}")?,
            Err(e) => return Err(e),
        }
    }
}
