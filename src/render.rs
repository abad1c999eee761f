use std::io::{Read, Write};

use crate::error::AppError;
use crate::model::price::{sort_by_date, PriceRecord, PriceTable};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    /// Order rows ascending by date instead of page order (newest first).
    pub oldest_first: bool,
}

/// Render `table` according to `opts`.
pub fn render_table<W: Write>(
    table: PriceTable,
    opts: &RenderOptions,
    out: W,
) -> Result<(), AppError> {
    match opts.format {
        OutputFormat::Csv => {
            let table = if opts.oldest_first {
                table.into_oldest_first()?
            } else {
                table
            };
            render_csv(&table, out)
        }
        OutputFormat::Json => {
            let mut records = table.records()?;
            if opts.oldest_first {
                sort_by_date(&mut records);
            }
            render_json(&records, out)
        }
    }
}

/// Write the table as comma-joined lines, header first. Cells are written
/// verbatim: no quoting or escaping.
pub fn render_csv<W: Write>(table: &PriceTable, mut out: W) -> Result<(), AppError> {
    writeln!(out, "{}", table.header.join(","))?;
    for row in &table.rows {
        writeln!(out, "{}", row.join(","))?;
    }
    out.flush()?;
    Ok(())
}

/// Write the records as a pretty-printed JSON array.
pub fn render_json<W: Write>(records: &[PriceRecord], mut out: W) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// Load a table previously written by [`render_csv`]. The first line is the
/// header, and every row must have as many cells as the header.
pub fn read_csv<R: Read>(input: R) -> Result<PriceTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    if header.iter().all(|h| h.is_empty()) {
        return Err(AppError::Input("CSV input has no header row".to_string()));
    }

    let rows = reader
        .records()
        .map(|record| -> Result<Vec<String>, AppError> {
            Ok(record?.iter().map(|c| c.to_string()).collect())
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(PriceTable::new(header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PriceTable {
        PriceTable::new(
            vec!["Date".to_string(), "High".to_string(), "Low".to_string()],
            vec![
                vec!["Jan 02 2018".to_string(), "2".to_string(), "1".to_string()],
                vec!["Jan 01 2018".to_string(), "4".to_string(), "3".to_string()],
            ],
        )
    }

    #[test]
    fn csv_is_comma_joined_with_header_first() {
        let mut out = Vec::new();
        render_csv(&table(), &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Date,High,Low\nJan 02 2018,2,1\nJan 01 2018,4,3\n"
        );
    }

    #[test]
    fn csv_does_not_quote_cells() {
        let t = PriceTable::new(
            vec!["Date".to_string()],
            vec![vec!["Jan 02, 2018".to_string()]],
        );
        let mut out = Vec::new();
        render_csv(&t, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Date\nJan 02, 2018\n");
    }

    #[test]
    fn empty_table_renders_header_only() {
        let t = PriceTable::new(vec!["Date".to_string()], vec![]);
        let mut out = Vec::new();
        render_csv(&t, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Date\n");
    }

    #[test]
    fn read_csv_loads_rendered_output() {
        let mut out = Vec::new();
        render_csv(&table(), &mut out).unwrap();
        let loaded = read_csv(out.as_slice()).unwrap();
        assert_eq!(loaded, table());
    }

    #[test]
    fn read_csv_rejects_missing_header() {
        assert!(matches!(read_csv("".as_bytes()), Err(AppError::Input(_))));
    }

    #[test]
    fn read_csv_rejects_ragged_rows() {
        let input = "Date,High,Low\nJan 01 2018,4\n";
        assert!(matches!(read_csv(input.as_bytes()), Err(AppError::Csv(_))));
    }
}
