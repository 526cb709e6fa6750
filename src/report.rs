//! Plain-text export of yearly scores.
//!
//! The layout is the one spreadsheet users in Brazil open directly: `;`
//! separates fields and `,` is the decimal mark.

use crate::identifier::format_decimal;
use crate::types::{QualityTier, YearlyScoreRow};

/// Field separator of the report.
pub const REPORT_DELIMITER: char = ';';
/// Decimal places of every number in the report.
pub const REPORT_DECIMALS: usize = 3;

/// Header line, without the trailing newline.
pub fn report_header() -> String {
    let mut columns = vec!["Year"];
    columns.extend(QualityTier::ALL.iter().map(QualityTier::as_str));
    columns.extend(["Total A", "Total B", "Total", "% A", "% B"]);
    columns.join(&REPORT_DELIMITER.to_string())
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format_decimal(v, REPORT_DECIMALS)).unwrap_or_default()
}

/// Render yearly scores, one line per year after the header.
pub fn format_report(rows: &[YearlyScoreRow]) -> String {
    let mut out = report_header();
    out.push('\n');

    for row in rows {
        let mut fields = vec![row.year.to_string()];
        fields.extend(
            QualityTier::ALL
                .iter()
                .map(|tier| cell(row.subscores.get(tier).copied().flatten())),
        );
        fields.extend(
            [row.total_a, row.total_b, row.total, row.percent_a, row.percent_b]
                .into_iter()
                .map(cell),
        );
        out.push_str(&fields.join(&REPORT_DELIMITER.to_string()));
        out.push('\n');
    }

    out
}

/// File name offered for a report download.
pub fn report_file_name(owner_name: &str) -> String {
    format!("{}_curriculum.csv", owner_name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(year: i32, a1: f64) -> YearlyScoreRow {
        let mut subscores: BTreeMap<QualityTier, Option<f64>> =
            QualityTier::ALL.into_iter().map(|t| (t, Some(0.0))).collect();
        subscores.insert(QualityTier::A1, Some(a1));
        YearlyScoreRow {
            year,
            subscores,
            total_a: Some(a1),
            total_b: Some(0.0),
            total: Some(a1),
            percent_a: Some(if a1 > 0.0 { 100.0 } else { 0.0 }),
            percent_b: Some(0.0),
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(
            report_header(),
            "Year;A1;A2;A3;A4;B1;B2;B3;B4;C;NP;Total A;Total B;Total;% A;% B"
        );
    }

    #[test]
    fn test_rows_use_decimal_comma() {
        let text = format_report(&[row(2020, 0.5)]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "2020;0,500;0,000;0,000;0,000;0,000;0,000;0,000;0,000;0,000;0,000;0,500;0,000;0,500;100,000;0,000"
        );
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let mut r = row(2018, 0.0);
        r.total = None;
        r.subscores.remove(&QualityTier::C);
        let text = format_report(&[r]);
        let fields: Vec<&str> = text.lines().nth(1).unwrap().split(';').collect();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[9], "");
        assert_eq!(fields[13], "");
    }

    #[test]
    fn test_empty_report_is_header_only() {
        assert_eq!(format_report(&[]).lines().count(), 1);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(report_file_name("Maria Souza"), "Maria Souza_curriculum.csv");
    }
}
