use crate::db::explorer::Grid;

/// Renders `grid` as a boxed, left-aligned text table.
pub fn render_table(grid: &Grid) -> String {
    let cells: Vec<Vec<String>> = grid
        .rows
        .iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = grid.headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let line = |values: &[String]| {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let v = values.get(i).map(String::as_str).unwrap_or("");
                format!(" {}{} ", v, " ".repeat(w - v.chars().count()))
            })
            .collect();
        format!("|{}|", padded.join("|"))
    };

    let mut out = Vec::with_capacity(cells.len() + 4);
    out.push(border.clone());
    out.push(line(&grid.headers));
    out.push(border.clone());
    for row in &cells {
        out.push(line(row));
    }
    out.push(border);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::explorer::Cell;

    #[test]
    fn pads_columns_to_widest_value() {
        let grid = Grid {
            headers: vec!["city".into(), "n".into()],
            rows: vec![
                vec![Cell::Text("johannesburg".into()), Cell::Integer(3)],
                vec![Cell::Text("cape_town".into()), Cell::Null],
            ],
        };
        let expected = "\
+--------------+---+
| city         | n |
+--------------+---+
| johannesburg | 3 |
| cape_town    |   |
+--------------+---+";
        assert_eq!(render_table(&grid), expected);
    }
}
