use std::io::{self, Write};

/// A header row plus rows of string cells, rendered as a plain text table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Listing {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row<I, S>(&mut self, row: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }

        // Calculate column widths
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(widths.len()) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let border: String = widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+");
        let border = format!("+{}+", border);

        writeln!(out, "{}", border)?;
        writeln!(out, "{}", Self::format_row(&self.columns, &widths))?;
        writeln!(out, "{}", border)?;
        for row in &self.rows {
            writeln!(out, "{}", Self::format_row(row, &widths))?;
        }
        writeln!(out, "{}", border)?;
        Ok(())
    }

    fn format_row(cells: &[String], widths: &[usize]) -> String {
        let padded: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, width)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!(" {:width$} ", cell, width = width)
            })
            .collect();
        format!("|{}|", padded.join("|"))
    }
}
