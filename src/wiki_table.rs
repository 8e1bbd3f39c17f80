use std::collections::HashMap;

use crate::error::{Error, Result};

const TABLE_MARKER: &str = "table{";

/// One data row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    cells: HashMap<String, String>,
}

impl TableRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiTable {
    columns: Vec<String>,
    rows: Vec<TableRow>,
}

impl WikiTable {
    /// Parse the first table in `text`.
    ///
    /// The table starts at its `table{...}.` directive. The first pipe line
    /// after it is the header, which may wrap onto lines not starting with a
    /// pipe. The first blank line closes the table.
    ///
    /// Cells of `link_column` additionally lose a wrapping `[[...]]` page link.
    pub fn parse(text: &str, link_column: Option<&str>) -> Result<Self> {
        let text = text.replace('\r', "");
        let lines: Vec<&str> = text.split('\n').collect();

        let marker = lines
            .iter()
            .position(|l| l.trim_start().starts_with(TABLE_MARKER))
            .ok_or_else(|| Error::TableParse("no table{...} directive found".to_string()))?;

        let header_start = lines[marker + 1..]
            .iter()
            .position(|l| is_pipe_line(l))
            .map(|offset| marker + 1 + offset)
            .ok_or_else(|| Error::TableParse("table has no header row".to_string()))?;

        let mut body_start = header_start + 1;
        while body_start < lines.len()
            && !is_pipe_line(lines[body_start])
            && !lines[body_start].trim().is_empty()
        {
            body_start += 1;
        }

        let body_end = lines[body_start..]
            .iter()
            .position(|l| l.trim().is_empty())
            .map_or(lines.len(), |offset| body_start + offset);

        let columns = parse_columns(&lines[header_start..body_start].join("\n"));
        if columns.is_empty() {
            return Err(Error::TableParse("table header has no columns".to_string()));
        }

        let rows = lines[body_start..body_end]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .map(|l| parse_row(l, &columns, link_column))
            .collect();

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Fail unless every name in `expected` is a column of this table.
    pub fn require_columns(&self, expected: &[&str]) -> Result<()> {
        let missing: Vec<&str> = expected
            .iter()
            .copied()
            .filter(|name| !self.columns.iter().any(|c| c == name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::TableParse(format!(
                "missing column(s): {} (found: {})",
                missing.join(", "),
                self.columns.join(", ")
            )))
        }
    }
}

fn is_pipe_line(line: &str) -> bool {
    line.trim_start().starts_with('|')
}

fn parse_columns(header: &str) -> Vec<String> {
    header
        .split('|')
        .filter(|fragment| !fragment.trim().is_empty())
        .map(clean_column_name)
        .collect()
}

/// `_{background:#ffa}.From (YYYY-MM-DD)` -> `From`
fn clean_column_name(fragment: &str) -> String {
    let name = fragment
        .split_once('.')
        .map_or(fragment, |(_style, name)| name);
    let name = name.split_once('(').map_or(name, |(name, _hint)| name);
    name.trim().to_string()
}

fn parse_row(line: &str, columns: &[String], link_column: Option<&str>) -> TableRow {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);

    // Ragged rows are padded with empty cells.
    let mut fields = line.split('|').map(str::trim);
    let cells = columns
        .iter()
        .map(|column| {
            let field = fields.next().unwrap_or_default();
            let field = if link_column == Some(column.as_str()) {
                strip_page_link(field)
            } else {
                field
            };
            (column.clone(), field.to_string())
        })
        .collect();

    TableRow { cells }
}

fn strip_page_link(cell: &str) -> &str {
    cell.strip_prefix("[[")
        .and_then(|c| c.strip_suffix("]]"))
        .unwrap_or(cell)
        .trim()
}
