//! Plain-text table rendering for operator listings.

use std::fmt::Write as _;

use unicode_width::UnicodeWidthStr;

const COLUMN_GAP: &str = "  ";

/// Column-aligned table of strings.
///
/// The renderer is a pure function of its headers and rows; each column is
/// padded to the display width of its widest cell and the header row is
/// underlined with dashes.
#[derive(Debug, Clone, Default)]
pub struct Table {
    title: Option<String>,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given column headers.
    #[must_use]
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: None,
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Adds a heading rendered above the columns.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Appends a row. Missing cells render empty and surplus cells are dropped.
    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cells: Vec<String> = row.into_iter().map(Into::into).collect();
        cells.resize(self.headers.len(), String::new());
        self.rows.push(cells);
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the table into a text block terminated by a newline.
    #[must_use]
    pub fn render(&self) -> String {
        let widths = self.column_widths();
        let mut output = String::new();

        if let Some(title) = &self.title {
            let _ = writeln!(output, "{title}");
            let _ = writeln!(output, "{}", "=".repeat(title.width()));
            output.push('\n');
        }

        push_line(&mut output, &self.headers, &widths);
        let underline: Vec<String> = self
            .headers
            .iter()
            .map(|header| "-".repeat(header.width()))
            .collect();
        push_line(&mut output, &underline, &widths);
        for row in &self.rows {
            push_line(&mut output, row, &widths);
        }
        output
    }

    fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.width())
                    .chain(std::iter::once(header.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (index, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.width())));
    }
    output.push_str(line.trim_end());
    output.push('\n');
}
