//! Per-connection comparison of rail against car travel.
//!
//! Every metric is rounded to two decimals. Divisions are checked: a zero or
//! negative denominator, or a non-finite result, is an arithmetic error for
//! the connection rather than an infinity flowing downstream.

use tracing::debug;

use crate::analyzers::types::{Connection, Metric, MetricRow, MetricTable};
use crate::analyzers::utility::round2;
use crate::error::{RaterError, Result};

/// Computes the metric table for the connections of one station.
///
/// With `include_transfers` the transfer time is subtracted from the rail
/// travel time for the speed and the two transfer metrics are appended.
pub fn compute_metrics(connections: &[Connection], include_transfers: bool) -> Result<MetricTable> {
    let columns = Metric::columns(include_transfers).to_vec();
    let rows = connections
        .iter()
        .map(|c| metric_row(c, include_transfers))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        rows = rows.len(),
        columns = columns.len(),
        "Metric table computed"
    );

    Ok(MetricTable { columns, rows })
}

fn metric_row(c: &Connection, include_transfers: bool) -> Result<MetricRow> {
    let transfer = c.transfer.unwrap_or_default();
    let transfer_offset = if include_transfers { transfer.time } else { 0.0 };

    let mut values = vec![
        time_ratio(c)?,
        speed(c, transfer_offset)?,
        comfort(c)?,
        round2(c.frequency),
    ];

    if include_transfers {
        values.push(round2(
            divide(&c.destination, "transfer time ratio", transfer.time, c.rail_time)? * 100.0,
        ));
        values.push(round2(divide(
            &c.destination,
            "transfer burden",
            transfer.count as f64 * 100.0,
            c.rail_distance,
        )?));
    }

    Ok(MetricRow {
        destination: c.destination.clone(),
        values,
    })
}

/// Car travel time over rail travel time; values above 1 favour rail.
pub fn time_ratio(c: &Connection) -> Result<f64> {
    divide(&c.destination, "time ratio", c.car_time, c.rail_time).map(round2)
}

/// Rail distance over the effective rail travel time, in km per minute.
pub fn speed(c: &Connection, transfer_offset: f64) -> Result<f64> {
    let effective_time = c.rail_time - transfer_offset;
    if effective_time <= 0.0 {
        return Err(RaterError::arithmetic(
            &c.destination,
            "speed",
            format!(
                "rail time {} does not exceed transfer time {}",
                c.rail_time, transfer_offset
            ),
        ));
    }
    divide(&c.destination, "speed", c.rail_distance, effective_time).map(round2)
}

/// Rail distance over car distance, a proxy for directness.
pub fn comfort(c: &Connection) -> Result<f64> {
    divide(&c.destination, "comfort", c.rail_distance, c.car_distance).map(round2)
}

fn divide(destination: &str, quantity: &'static str, numerator: f64, denominator: f64) -> Result<f64> {
    if denominator.is_nan() || denominator <= 0.0 {
        return Err(RaterError::arithmetic(
            destination,
            quantity,
            format!("denominator is {denominator}"),
        ));
    }
    let value = numerator / denominator;
    if !value.is_finite() {
        return Err(RaterError::arithmetic(
            destination,
            quantity,
            format!("result {numerator}/{denominator} is not finite"),
        ));
    }
    Ok(value)
}
