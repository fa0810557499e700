//! Normalization of metric columns against their station mean ("Gewichtung").

use tracing::trace;

use crate::analyzers::types::{MetricRow, MetricTable, Polarity, WeightedTable};
use crate::analyzers::utility::mean;
use crate::analyzers::weights::{PolarityRules, WeightTable};
use crate::error::{RaterError, Result};

/// Rescales every column to a percentage of its mean and applies the weight
/// of its metric.
///
/// For each column, `ratio = value / mean(column)`. Higher-is-better metrics
/// map to `ratio * 100`, lower-is-better metrics to `(2 - ratio) * 100`. The
/// result is multiplied by the metric's weight. The input table is left
/// untouched.
pub fn weight_metrics(
    table: &MetricTable,
    weights: &WeightTable,
    polarity: &PolarityRules,
) -> Result<WeightedTable> {
    if table.ragged_row().is_some() {
        return Err(row_width_error(table));
    }

    let mut rows: Vec<MetricRow> = table
        .rows
        .iter()
        .map(|r| MetricRow {
            destination: r.destination.clone(),
            values: Vec::with_capacity(table.columns.len()),
        })
        .collect();

    for (idx, metric) in table.columns.iter().enumerate() {
        let weight = weights.weight(*metric)?;
        let column = table.column(idx).ok_or_else(|| row_width_error(table))?;
        let column_mean = match mean(&column) {
            Some(m) if m != 0.0 && m.is_finite() => m,
            _ => return Err(RaterError::ZeroMean(*metric)),
        };
        let rule = polarity.polarity(*metric);

        trace!(%metric, column_mean, weight, ?rule, "Weighting column");

        for (row, value) in rows.iter_mut().zip(column) {
            let ratio = value / column_mean;
            let normalized = match rule {
                Polarity::HigherIsBetter => ratio * 100.0,
                Polarity::LowerIsBetter => (2.0 - ratio) * 100.0,
            };
            row.values.push(normalized * weight);
        }
    }

    Ok(WeightedTable {
        columns: table.columns.clone(),
        rows,
    })
}

fn row_width_error(table: &MetricTable) -> RaterError {
    let row = table.ragged_row();
    RaterError::RowWidth {
        destination: row.map(|r| r.destination.clone()).unwrap_or_default(),
        expected: table.columns.len(),
        found: row.map_or(0, |r| r.values.len()),
    }
}
