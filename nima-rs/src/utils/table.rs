//! Table formatting utilities

use prettytable::{Cell, Row, Table};

/// Create a table with bold headers
pub fn create_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).style_spec("b"))
        .collect();
    table.set_titles(Row::new(header_cells));

    table
}

/// Add a row to a table; cells that parse as numbers are right-aligned
pub fn add_table_row(table: &mut Table, cells: Vec<String>) {
    let row_cells: Vec<Cell> = cells
        .into_iter()
        .map(|s| {
            if s.parse::<f64>().is_ok() {
                Cell::new(&s).style_spec("r")
            } else {
                Cell::new(&s)
            }
        })
        .collect();
    table.add_row(Row::new(row_cells));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_rows() {
        let mut table = create_table(&["Name", "Count"]);
        add_table_row(&mut table, vec!["walk".to_string(), "3".to_string()]);
        assert_eq!(table.len(), 1);
        let rendered = table.to_string();
        assert!(rendered.contains("walk"));
        assert!(rendered.contains("Count"));
    }
}
