use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AppError;

/// Header of the derived column appended to every extracted table.
pub const AVERAGE_COLUMN: &str = "Average (High + Low / 2)";

/// Date formats seen in the `Date` column, tried in order.
const DATE_FORMATS: [&str; 3] = ["%b %d, %Y", "%b %d %Y", "%Y-%m-%d"];

/// Price history as scraped: column names plus string cells, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One typed row of a [`PriceTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub average: f64,
}

struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    market_cap: usize,
    average: usize,
}

impl PriceTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, ignoring surrounding whitespace and case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    fn require_column(&self, name: &str) -> Result<usize, AppError> {
        self.column_index(name)
            .ok_or_else(|| AppError::Extract(format!("missing '{}' column", name)))
    }

    fn column_map(&self) -> Result<ColumnMap, AppError> {
        Ok(ColumnMap {
            date: self.require_column("Date")?,
            open: self.require_column("Open")?,
            high: self.require_column("High")?,
            low: self.require_column("Low")?,
            close: self.require_column("Close")?,
            volume: self.require_column("Volume")?,
            market_cap: self.require_column("Market Cap")?,
            average: self.require_column(AVERAGE_COLUMN)?,
        })
    }

    /// Convert every row into a [`PriceRecord`], keeping row order.
    pub fn records(&self) -> Result<Vec<PriceRecord>, AppError> {
        let cols = self.column_map()?;
        self.rows
            .iter()
            .map(|row| -> Result<PriceRecord, AppError> {
                let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
                Ok(PriceRecord {
                    date: parse_date(cell(cols.date))?,
                    open: parse_price("Open", cell(cols.open))?,
                    high: parse_price("High", cell(cols.high))?,
                    low: parse_price("Low", cell(cols.low))?,
                    close: parse_price("Close", cell(cols.close))?,
                    volume: parse_optional_price("Volume", cell(cols.volume))?,
                    market_cap: parse_optional_price("Market Cap", cell(cols.market_cap))?,
                    average: parse_price(AVERAGE_COLUMN, cell(cols.average))?,
                })
            })
            .collect()
    }

    /// Reorder rows ascending by the `Date` column. Cells are left untouched.
    pub fn into_oldest_first(self) -> Result<Self, AppError> {
        let date_idx = self.require_column("Date")?;
        let mut keyed = self
            .rows
            .into_iter()
            .map(|row| -> Result<(NaiveDate, Vec<String>), AppError> {
                let date = parse_date(row.get(date_idx).map(String::as_str).unwrap_or(""))?;
                Ok((date, row))
            })
            .collect::<Result<Vec<_>, AppError>>()?;
        keyed.sort_by_key(|(date, _)| *date);
        Ok(Self {
            header: self.header,
            rows: keyed.into_iter().map(|(_, row)| row).collect(),
        })
    }
}

/// Sort records ascending by date. Stable for duplicate dates.
pub fn sort_by_date(records: &mut [PriceRecord]) {
    records.sort_by_key(|r| r.date);
}

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| AppError::Parse {
            field: "Date".to_string(),
            value: value.to_string(),
        })
}

/// Parse a price cell, ignoring thousands separators.
pub fn parse_price(field: &str, value: &str) -> Result<f64, AppError> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().map_err(|_| AppError::Parse {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Like [`parse_price`], but `-` and empty cells mean "not reported".
pub fn parse_optional_price(field: &str, value: &str) -> Result<Option<f64>, AppError> {
    match value.trim() {
        "" | "-" => Ok(None),
        _ => parse_price(field, value).map(Some),
    }
}
