//! Workbook reader: one worksheet per departure station.
//!
//! Columns are read by position, starting at the first used column of the
//! sheet: destination, rail time, car time, rail distance, car distance,
//! frequency and, when transfers are considered, transfer time and transfer
//! count. The first row is a header and its text is ignored.

use calamine::{Data, Reader, Xlsx, open_workbook};
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::types::{Connection, StationSheet, Transfer};
use crate::error::{RaterError, Result};

/// Columns required without transfer data.
pub const DIRECT_COLUMNS: usize = 6;
/// Columns required with transfer data.
pub const TRANSFER_COLUMNS: usize = 8;

static EMPTY: Data = Data::Empty;

/// Fails with [`RaterError::Format`] unless `path` ends in `.xlsx`.
pub fn check_format(path: &Path) -> Result<()> {
    if path.extension().and_then(|e| e.to_str()) == Some("xlsx") {
        Ok(())
    } else {
        Err(RaterError::Format(path.to_path_buf()))
    }
}

/// Reads every worksheet of an `.xlsx` workbook into a [`StationSheet`].
///
/// # Errors
///
/// Returns a format error before opening anything if the extension is not
/// `.xlsx`, and a schema error for sheets with too few columns or cells that
/// cannot be read.
#[tracing::instrument(skip_all, fields(path = %path.display(), include_transfers = include_transfers))]
pub fn read_workbook(path: &Path, include_transfers: bool) -> Result<Vec<StationSheet>> {
    check_format(path)?;

    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let names = workbook.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());

    for name in names {
        let range = workbook.worksheet_range(&name)?;
        debug!(station = %name, width = range.width(), height = range.height(), "Worksheet loaded");
        sheets.push(parse_sheet(&name, range.width(), range.rows(), include_transfers)?);
    }

    info!(stations = sheets.len(), "Workbook read");
    Ok(sheets)
}

/// Builds the connections of one station from its worksheet rows, header
/// row included.
pub fn parse_sheet<'a>(
    station: &str,
    width: usize,
    rows: impl Iterator<Item = &'a [Data]>,
    include_transfers: bool,
) -> Result<StationSheet> {
    let required = if include_transfers {
        TRANSFER_COLUMNS
    } else {
        DIRECT_COLUMNS
    };
    if width < required {
        return Err(RaterError::MissingColumns {
            station: station.to_string(),
            required,
            found: width,
        });
    }

    let mut connections = Vec::new();
    for (idx, cells) in rows.enumerate().skip(1) {
        if cells.iter().all(is_blank) {
            continue;
        }
        let cell = RowReader {
            station,
            row: idx + 1,
            cells,
        };

        let transfer = if include_transfers {
            Some(Transfer {
                time: cell.optional_number(6)?.unwrap_or(0.0),
                count: cell.count(7)?,
            })
        } else {
            None
        };

        connections.push(Connection {
            destination: cell.text(0)?,
            rail_time: cell.number(1)?,
            car_time: cell.number(2)?,
            rail_distance: cell.number(3)?,
            car_distance: cell.number(4)?,
            frequency: cell.number(5)?,
            transfer,
        });
    }

    Ok(StationSheet {
        station: station.to_string(),
        connections,
    })
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

struct RowReader<'a> {
    station: &'a str,
    row: usize,
    cells: &'a [Data],
}

impl RowReader<'_> {
    fn error(&self, column: usize, reason: impl Into<String>) -> RaterError {
        RaterError::Schema {
            station: self.station.to_string(),
            row: self.row,
            column: column + 1,
            reason: reason.into(),
        }
    }

    fn cell(&self, column: usize) -> &Data {
        self.cells.get(column).unwrap_or(&EMPTY)
    }

    fn text(&self, column: usize) -> Result<String> {
        let cell = self.cell(column);
        if is_blank(cell) {
            return Err(self.error(column, "missing destination"));
        }
        Ok(cell.to_string().trim().to_string())
    }

    fn optional_number(&self, column: usize) -> Result<Option<f64>> {
        match self.cell(column) {
            Data::Float(f) => Ok(Some(*f)),
            Data::Int(i) => Ok(Some(*i as f64)),
            Data::String(s) if s.trim().is_empty() => Ok(None),
            Data::String(s) => parse_number(s)
                .map(Some)
                .ok_or_else(|| self.error(column, format!("'{s}' is not a number"))),
            Data::Empty => Ok(None),
            other => Err(self.error(column, format!("expected a number, found '{other}'"))),
        }
    }

    fn number(&self, column: usize) -> Result<f64> {
        self.optional_number(column)?
            .ok_or_else(|| self.error(column, "missing value"))
    }

    fn count(&self, column: usize) -> Result<u32> {
        let value = self.optional_number(column)?.unwrap_or(0.0);
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(self.error(
                column,
                format!("transfer count {value} is not a non-negative integer"),
            ));
        }
        Ok(value as u32)
    }
}

/// Parses numeric text, accepting a decimal comma.
fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    text.parse::<f64>()
        .or_else(|_| text.replace(',', ".").parse::<f64>())
        .ok()
        .filter(|v| v.is_finite())
}
