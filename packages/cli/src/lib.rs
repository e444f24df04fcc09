#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Row-file input and report output for the `ward_stats` binary.
//!
//! Rows are read from `.csv` files (headers `entity_id,category,count`) or
//! `.json` files holding an array of row objects.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use clap::ValueEnum;
use ward_stats_domains::{DomainError, DomainReport};
use ward_stats_indicator_models::RawIndicatorRow;

/// Errors raised by the command-line harness.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The row file extension is not `.csv` or `.json`.
    #[error("Unsupported row file format: {0}")]
    UnsupportedFormat(String),

    /// Loading or running the domain failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// What `process` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// The full report as pretty-printed JSON.
    Json,
    /// One narrative sentence per line.
    Narrative,
    /// The narrative followed by the JSON report.
    #[default]
    Both,
}

/// Reads indicator rows from a `.csv` or `.json` file.
///
/// # Errors
///
/// * [`CliError::UnsupportedFormat`] if the extension is not recognized
/// * [`CliError::Io`], [`CliError::Csv`] or [`CliError::Json`] if the file
///   cannot be read or parsed
pub fn read_rows(path: &Path) -> Result<Vec<RawIndicatorRow>, CliError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let rows = match extension.as_deref() {
        Some("csv") => parse_csv(File::open(path)?)?,
        Some("json") => parse_json(File::open(path)?)?,
        _ => return Err(CliError::UnsupportedFormat(path.display().to_string())),
    };

    log::info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parses CSV rows. Headers may use `entity_id`, `entityId` or `ward` for
/// the ward column.
///
/// # Errors
///
/// Returns [`CliError::Csv`] if a record is malformed.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawIndicatorRow>, CliError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawIndicatorRow>, _>>()?;
    Ok(rows)
}

/// Parses a JSON array of rows.
///
/// # Errors
///
/// Returns [`CliError::Json`] if the document is not an array of rows.
pub fn parse_json<R: Read>(reader: R) -> Result<Vec<RawIndicatorRow>, CliError> {
    Ok(serde_json::from_reader(BufReader::new(reader))?)
}

/// Renders a report for printing.
///
/// # Errors
///
/// Returns [`CliError::Json`] if the report cannot be serialized.
pub fn render_report(report: &DomainReport, format: OutputFormat) -> Result<String, CliError> {
    let narrative = report.narrative.sentences.join("\n");
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Narrative => narrative,
        OutputFormat::Both => {
            format!("{narrative}\n\n{}", serde_json::to_string_pretty(report)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_stats_domains::{Domain, RunOptions, run_domain};
    use ward_stats_engine::PlainFormatter;

    const CSV: &str = "entity_id, category, count\n1, OWNED, 10\n1, rented, 5\n2, OWNED, 3\n";

    #[test]
    fn parses_csv_with_snake_case_headers() {
        let rows = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].entity_id, 1);
        assert_eq!(rows[1].category, "rented");
        assert_eq!(rows[2].count, 3);
    }

    #[test]
    fn parses_csv_with_ward_header() {
        let rows = parse_csv("ward,category,count\n7,PADDY,4\n".as_bytes()).unwrap();
        assert_eq!(rows[0].entity_id, 7);
    }

    #[test]
    fn rejects_negative_counts() {
        let err = parse_csv("entity_id,category,count\n1,OWNED,-4\n".as_bytes()).unwrap_err();
        assert!(matches!(err, CliError::Csv(_)), "{err}");
    }

    #[test]
    fn parses_json_rows() {
        let json = r#"[
            { "entityId": 1, "category": "BCG", "count": 12 },
            { "entity_id": 2, "category": "OPV", "count": 8 }
        ]"#;
        let rows = parse_json(json.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].entity_id, 2);
        assert_eq!(rows[1].category, "OPV");
    }

    #[test]
    fn unsupported_extension() {
        let err = read_rows(Path::new("rows.xlsx")).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedFormat(_)));
    }

    #[test]
    fn renders_each_format() {
        let rows = parse_csv(CSV.as_bytes()).unwrap();
        let report = run_domain(
            Domain::HousingTenure,
            &rows,
            RunOptions::default(),
            &PlainFormatter::default(),
        )
        .unwrap();

        let narrative = render_report(&report, OutputFormat::Narrative).unwrap();
        assert!(narrative.starts_with("A total of 18 households"), "{narrative}");
        assert_eq!(narrative.lines().count(), report.narrative.sentences.len());

        let json = render_report(&report, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["domain"], "housing_tenure");
        assert_eq!(value["result"]["grandTotal"], 18);

        let both = render_report(&report, OutputFormat::Both).unwrap();
        assert!(both.starts_with(&narrative));
        assert!(both.ends_with(&json));
    }
}
