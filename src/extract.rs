//! Scrape the historical-data table out of a CoinMarketCap page.
//!
//! The page carries a single `<table>` with one header row and seven cells
//! per data row (Date, Open, High, Low, Close, Volume, Market Cap). The table
//! is located with regular expressions rather than a DOM parser, so anything
//! that does not match the expected shape is skipped or reported as an
//! [`AppError::Extract`].

use regex::Regex;

use crate::error::AppError;
use crate::model::price::{parse_price, PriceTable, AVERAGE_COLUMN};

/// Number of `<td>` cells in a data row of the source table.
pub const SOURCE_COLUMNS: usize = 7;

/// Extract the price table from `html` and append the average column.
pub fn extract_table(html: &str) -> Result<PriceTable, AppError> {
    let header = extract_header(html)?;
    let raw_rows = extract_rows(html)?;

    let high_idx = index_of(&header, "High")?;
    let low_idx = index_of(&header, "Low")?;

    let rows = raw_rows
        .into_iter()
        .map(|mut row| -> Result<Vec<String>, AppError> {
            let average = average_of(&row, high_idx, low_idx)?;
            row.push(average);
            Ok(row)
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    tracing::debug!(
        columns = header.len(),
        rows = rows.len(),
        "Extracted price table"
    );
    Ok(PriceTable::new(header, rows))
}

/// Column names from `<thead>`, `*` footnote markers removed, with the
/// average column appended.
pub fn extract_header(html: &str) -> Result<Vec<String>, AppError> {
    let head_re = Regex::new(r"(?s)<thead>(.*)</thead>").expect("thead regex is valid");
    let th_re = Regex::new(r"<th .*>([\w /*]+)</th>").expect("th regex is valid");

    let head = head_re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| AppError::Extract("no <thead> block found".to_string()))?
        .as_str();

    let mut header: Vec<String> = th_re
        .captures_iter(head)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();
    header.push(AVERAGE_COLUMN.to_string());

    Ok(header.into_iter().map(|h| h.replace('*', "")).collect())
}

/// Data rows from `<tbody>` with thousands separators stripped from every cell.
/// Rows that do not have exactly seven text cells are skipped.
pub fn extract_rows(html: &str) -> Result<Vec<Vec<String>>, AppError> {
    let body_re = Regex::new(r"(?s)<tbody>(.*)</tbody>").expect("tbody regex is valid");
    let row_pattern = format!(
        r"<tr[^>]*>{}\s*</tr>",
        r"\s*<td[^>]*>([^<]+)</td>".repeat(SOURCE_COLUMNS)
    );
    let row_re = Regex::new(&row_pattern).expect("row regex is valid");

    let body = body_re
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| AppError::Extract("no <tbody> block found".to_string()))?
        .as_str();

    let rows: Vec<Vec<String>> = row_re
        .captures_iter(body)
        .map(|c| {
            c.iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().replace(',', ""))
                .collect()
        })
        .collect();

    let candidates = body.matches("<tr").count();
    if candidates > rows.len() {
        tracing::debug!(
            skipped = candidates - rows.len(),
            "Skipped table rows without {} text cells",
            SOURCE_COLUMNS
        );
    }
    Ok(rows)
}

fn index_of(header: &[String], name: &str) -> Result<usize, AppError> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| AppError::Extract(format!("missing '{}' column in header", name)))
}

/// (High + Low) / 2 rounded to two decimals.
fn average_of(row: &[String], high_idx: usize, low_idx: usize) -> Result<String, AppError> {
    let cell = |idx: usize, name: &str| {
        row.get(idx).ok_or_else(|| {
            AppError::Extract(format!(
                "row has {} cells, '{}' is column {}",
                row.len(),
                name,
                idx + 1
            ))
        })
    };
    let high = parse_price("High", cell(high_idx, "High")?)?;
    let low = parse_price("Low", cell(low_idx, "Low")?)?;
    Ok(format!("{:.2}", (high + low) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<table class="table">
<thead>
<tr>
<th class="text-left">Date</th>
<th class="text-right">Open*</th>
<th class="text-right">High</th>
<th class="text-right">Low</th>
<th class="text-right">Close**</th>
<th class="text-right">Volume</th>
<th class="text-right">Market Cap</th>
</tr>
</thead>
<tbody>
<tr class="text-right">
<td class="text-left">Jan 02, 2018</td>
<td>13625.00</td>
<td>15444.60</td>
<td>13163.60</td>
<td>14982.10</td>
<td>16,846,600,192</td>
<td>228,579,000,000</td>
</tr>
<tr class="text-right">
<td class="text-left">Jan 01, 2018</td>
<td>14112.20</td>
<td>14112.20</td>
<td>13154.80</td>
<td>13657.20</td>
<td>10,291,200,000</td>
<td>236,725,000,000</td>
</tr>
</tbody>
</table>
</body></html>"#;

    #[test]
    fn header_strips_markers_and_appends_average() {
        let header = extract_header(PAGE).unwrap();
        assert_eq!(
            header,
            vec![
                "Date",
                "Open",
                "High",
                "Low",
                "Close",
                "Volume",
                "Market Cap",
                "Average (High + Low / 2)"
            ]
        );
    }

    #[test]
    fn rows_strip_commas() {
        let rows = extract_rows(PAGE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][5], "16846600192");
        assert_eq!(rows[1][6], "236725000000");
    }

    #[test]
    fn table_appends_two_decimal_average() {
        let table = extract_table(PAGE).unwrap();
        assert_eq!(table.rows[0].len(), 8);
        assert_eq!(table.rows[0][7], "14304.10");
        assert_eq!(table.rows[1][7], "13633.50");
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let page = PAGE.replace("<td>13657.20</td>", "");
        let table = extract_table(&page).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "Jan 02 2018");
    }

    #[test]
    fn missing_thead_is_an_error() {
        let page = PAGE.replace("<thead>", "<thead class=\"x\">");
        assert!(matches!(extract_table(&page), Err(AppError::Extract(_))));
    }

    #[test]
    fn missing_tbody_is_an_error() {
        let page = PAGE.replace("</tbody>", "");
        assert!(matches!(extract_rows(&page), Err(AppError::Extract(_))));
    }

    #[test]
    fn non_numeric_high_is_a_parse_error() {
        let page = PAGE.replace("<td>15444.60</td>", "<td>n/a</td>");
        assert!(matches!(
            extract_table(&page),
            Err(AppError::Parse { ref field, .. }) if field == "High"
        ));
    }
}
