use std::fmt::{self, Display};
use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

use passgen::HistoryEntry;

const HEADERS: [&str; 3] = ["#", "Password", "Created"];

/// Write the history as an aligned table, one entry per row, in the order given.
pub fn display_history(entries: &[HistoryEntry], mut output: impl Write) -> io::Result<()> {
    let rows = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            [
                (index + 1).to_string(),
                entry.password.as_str().to_owned(),
                entry.created_at.clone(),
            ]
        })
        .collect::<Vec<_>>();

    let mut column_widths = HEADERS.map(|header| header.width());
    for row in &rows {
        for (width, cell) in column_widths.iter_mut().zip(row) {
            *width = std::cmp::max(cell.width(), *width);
        }
    }

    output_row(&mut output, |column_index| {
        Padded(HEADERS[column_index], column_widths[column_index])
    })?;
    output_row(&mut output, |column_index| Divider(column_widths[column_index]))?;
    for row in &rows {
        output_row(&mut output, |column_index| {
            Padded(&row[column_index], column_widths[column_index])
        })?;
    }

    Ok(())
}

fn output_row<F, D>(mut output: impl Write, get_column_display: F) -> io::Result<()>
where
    D: Display,
    F: Fn(usize) -> D,
{
    for column_index in 0..HEADERS.len() {
        if column_index > 0 {
            write!(&mut output, "  ")?;
        }
        write!(&mut output, "{}", get_column_display(column_index))?;
    }
    writeln!(&mut output)?;
    Ok(())
}

struct Divider(usize);

impl Display for Divider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            write!(f, "─")?;
        }
        Ok(())
    }
}

struct Padded<'a>(&'a str, usize);

impl Display for Padded<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let padding = self.1.saturating_sub(self.0.width());
        write!(f, "{}", self.0)?;
        for _ in 0..padding {
            write!(f, " ")?;
        }
        Ok(())
    }
}
