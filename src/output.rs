//! Output formatting and persistence for evaluation results.
//!
//! Results go to `.xlsx` (one row per station) or `.csv`; whole evaluations
//! can also be logged as pretty-printed JSON.

use calamine::{Data, Reader, Xlsx, open_workbook};
use csv::WriterBuilder;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{MetricTable, StationSummary};
use crate::error::{RaterError, Result};

/// Worksheet name of the result workbook.
pub const RESULT_SHEET: &str = "Erreichbarkeitsindex";
pub const STATION_HEADER: &str = "Bahnhof";
pub const INDEX_HEADER: &str = "Erreichbarkeitsindex";

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "Bahnhof")]
    pub station: String,
    #[serde(rename = "Erreichbarkeitsindex")]
    pub index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("xlsx") => Ok(OutputFormat::Xlsx),
            Some("csv") => Ok(OutputFormat::Csv),
            _ => Err(RaterError::Format(path.to_path_buf())),
        }
    }
}

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes one row per station to `path`, as `.xlsx` or `.csv` depending on
/// the extension.
#[tracing::instrument(skip_all, fields(path = %path.display(), stations = stations.len()))]
pub fn write_results(path: &Path, stations: &[StationSummary]) -> Result<()> {
    let rows: Vec<ResultRow> = stations
        .iter()
        .map(|s| ResultRow {
            station: s.station.clone(),
            index: s.index,
        })
        .collect();

    match OutputFormat::from_path(path)? {
        OutputFormat::Csv => write_csv(path, &rows)?,
        OutputFormat::Xlsx => {
            let mut workbook = Workbook::new();
            let sheet = workbook.add_worksheet();
            sheet.set_name(RESULT_SHEET)?;
            sheet.write_string(0, 0, STATION_HEADER)?;
            sheet.write_string(0, 1, INDEX_HEADER)?;
            for (i, row) in rows.iter().enumerate() {
                let r = i as u32 + 1;
                sheet.write_string(r, 0, &row.station)?;
                sheet.write_number(r, 1, row.index)?;
            }
            workbook.save(path)?;
        }
    }

    info!("Results written");
    Ok(())
}

/// Reads a result workbook written by [`write_results`].
///
/// Only `.xlsx` result files can be read back.
pub fn read_results(path: &Path) -> Result<Vec<ResultRow>> {
    if OutputFormat::from_path(path)? != OutputFormat::Xlsx {
        return Err(RaterError::Format(path.to_path_buf()));
    }

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook.worksheet_range(RESULT_SHEET)?;

    range
        .rows()
        .enumerate()
        .skip(1)
        .map(|(idx, cells)| {
            let bad = |column: usize, reason: &str| RaterError::Schema {
                station: RESULT_SHEET.to_string(),
                row: idx + 1,
                column,
                reason: reason.to_string(),
            };
            let station = match cells.first() {
                Some(Data::String(s)) => s.clone(),
                _ => return Err(bad(1, "missing station name")),
            };
            let index = match cells.get(1) {
                Some(Data::Float(f)) => *f,
                Some(Data::Int(i)) => *i as f64,
                _ => return Err(bad(2, "missing index")),
            };
            Ok(ResultRow { station, index })
        })
        .collect()
}

/// Writes the raw metric tables of several stations into one CSV file.
///
/// All tables must share the same metric columns.
pub fn write_metric_tables(path: &Path, tables: &[(String, MetricTable)]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    if let Some((_, first)) = tables.first() {
        let mut header = vec!["station", "destination"];
        header.extend(first.columns.iter().map(|m| m.label()));
        writer.write_record(&header)?;
    }

    for (station, table) in tables {
        for row in &table.rows {
            let mut record = vec![station.clone(), row.destination.clone()];
            record.extend(row.values.iter().map(|v| v.to_string()));
            writer.write_record(&record)?;
        }
    }

    writer.flush()?;
    debug!(path = %path.display(), tables = tables.len(), "Metric tables written");
    Ok(())
}

fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{LineScore, Metric, MetricRow};
    use std::fs;

    fn summary(station: &str, index: f64) -> StationSummary {
        let line = LineScore {
            destination: "X".into(),
            score: index,
        };
        StationSummary {
            station: station.to_string(),
            index,
            connections: 1,
            line_stddev: 0.0,
            best_line: line.clone(),
            worst_line: line,
        }
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&summary("A", 100.0));
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&summary("A", 100.0)).unwrap();
    }

    #[test]
    fn test_xlsx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.xlsx");
        let stations = vec![summary("Köln Hbf", 101.37), summary("Aachen Hbf", 97.5)];

        write_results(&path, &stations).unwrap();
        let rows = read_results(&path).unwrap();

        assert_eq!(
            rows,
            vec![
                ResultRow {
                    station: "Köln Hbf".into(),
                    index: 101.37
                },
                ResultRow {
                    station: "Aachen Hbf".into(),
                    index: 97.5
                },
            ]
        );
    }

    #[test]
    fn test_csv_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");

        write_results(&path, &[summary("A", 100.0), summary("B", 98.25)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["Bahnhof,Erreichbarkeitsindex", "A,100.0", "B,98.25"]);
    }

    #[test]
    fn test_read_results_requires_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.csv");
        write_results(&path, &[summary("A", 100.0)]).unwrap();

        assert!(matches!(read_results(&path), Err(RaterError::Format(_))));
        assert!(matches!(
            read_results(&dir.path().join("result.ods")),
            Err(RaterError::Format(_))
        ));
    }

    #[test]
    fn test_unknown_output_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.ods");
        assert!(matches!(
            write_results(&path, &[summary("A", 100.0)]),
            Err(RaterError::Format(_))
        ));
    }

    #[test]
    fn test_metric_tables_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let table = MetricTable {
            columns: Metric::columns(false).to_vec(),
            rows: vec![MetricRow {
                destination: "B".into(),
                values: vec![1.5, 1.67, 0.83, 2.0],
            }],
        };

        write_metric_tables(&path, &[("A".to_string(), table)]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(
            lines[0],
            "station,destination,Reisezeit Verhältnis,Beförderungsgeschwindigkeit,Komfort,Taktfrequenz"
        );
        assert_eq!(lines[1], "A,B,1.5,1.67,0.83,2");
    }
}
