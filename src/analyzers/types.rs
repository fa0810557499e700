//! Data types used by the evaluation pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer data of a connection: waiting time and number of changes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transfer {
    pub time: f64,
    pub count: u32,
}

/// One direct connection from a departure station to a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub destination: String,
    /// minutes
    pub rail_time: f64,
    /// minutes
    pub car_time: f64,
    /// km
    pub rail_distance: f64,
    /// km
    pub car_distance: f64,
    /// trains per hour
    pub frequency: f64,
    pub transfer: Option<Transfer>,
}

/// All connections of one departure station, as read from one worksheet.
#[derive(Debug, Clone, PartialEq)]
pub struct StationSheet {
    pub station: String,
    pub connections: Vec<Connection>,
}

/// The comparative metrics computed per connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TimeRatio,
    Speed,
    Comfort,
    Frequency,
    TransferTimeRatio,
    TransferBurden,
}

/// Whether a large or a small raw value of a metric is favourable for rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

impl Metric {
    const DIRECT: [Metric; 4] = [
        Metric::TimeRatio,
        Metric::Speed,
        Metric::Comfort,
        Metric::Frequency,
    ];

    const WITH_TRANSFERS: [Metric; 6] = [
        Metric::TimeRatio,
        Metric::Speed,
        Metric::Comfort,
        Metric::Frequency,
        Metric::TransferTimeRatio,
        Metric::TransferBurden,
    ];

    /// Metric columns in table order for the given mode.
    pub fn columns(include_transfers: bool) -> &'static [Metric] {
        if include_transfers {
            &Self::WITH_TRANSFERS
        } else {
            &Self::DIRECT
        }
    }

    /// Stable identifier, also used as key in weight files.
    pub fn id(&self) -> &'static str {
        match self {
            Metric::TimeRatio => "time_ratio",
            Metric::Speed => "speed",
            Metric::Comfort => "comfort",
            Metric::Frequency => "frequency",
            Metric::TransferTimeRatio => "transfer_time_ratio",
            Metric::TransferBurden => "transfer_burden",
        }
    }

    /// Column label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::TimeRatio => "Reisezeit Verhältnis",
            Metric::Speed => "Beförderungsgeschwindigkeit",
            Metric::Comfort => "Komfort",
            Metric::Frequency => "Taktfrequenz",
            Metric::TransferTimeRatio => "Umsteigezeitverhältnis",
            Metric::TransferBurden => "Umsteigezwang",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One row of a metric or weighted table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub destination: String,
    pub values: Vec<f64>,
}

/// Raw comparative metrics of a station, one row per connection.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricTable {
    pub columns: Vec<Metric>,
    pub rows: Vec<MetricRow>,
}

/// Normalized and weighted contributions, same shape as the [`MetricTable`]
/// it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTable {
    pub columns: Vec<Metric>,
    pub rows: Vec<MetricRow>,
}

impl MetricTable {
    /// Values of column `idx` across all rows, `None` if any row is too short.
    pub fn column(&self, idx: usize) -> Option<Vec<f64>> {
        self.rows.iter().map(|r| r.values.get(idx).copied()).collect()
    }

    /// First row whose width differs from the number of columns.
    pub fn ragged_row(&self) -> Option<&MetricRow> {
        self.rows.iter().find(|r| r.values.len() != self.columns.len())
    }

    /// Value of `metric` in row `row`, if the table carries that metric.
    pub fn value(&self, row: usize, metric: Metric) -> Option<f64> {
        let idx = self.columns.iter().position(|m| *m == metric)?;
        self.rows.get(row)?.values.get(idx).copied()
    }
}

impl WeightedTable {
    pub fn value(&self, row: usize, metric: Metric) -> Option<f64> {
        let idx = self.columns.iter().position(|m| *m == metric)?;
        self.rows.get(row)?.values.get(idx).copied()
    }
}

/// Summed weighted contribution of a single connection ("Erschliessungsqualität").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineScore {
    pub destination: String,
    pub score: f64,
}

/// Accessibility index of one departure station ("Erreichbarkeitsindex").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: String,
    pub index: f64,
    pub connections: usize,
    pub line_stddev: f64,
    pub best_line: LineScore,
    pub worst_line: LineScore,
}

/// A station whose evaluation failed under [`FailurePolicy::SkipStation`].
///
/// [`FailurePolicy::SkipStation`]: crate::config::FailurePolicy::SkipStation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationFailure {
    pub station: String,
    pub error: String,
}

/// Result of evaluating a whole workbook.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub generated_at: DateTime<Utc>,
    pub include_transfers: bool,
    pub stations: Vec<StationSummary>,
    pub failures: Vec<StationFailure>,
}
