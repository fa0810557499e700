use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::analyzers::aggregate::{line_scores, summarize_station};
use crate::analyzers::types::{Evaluation, MetricTable, StationFailure, StationSheet, StationSummary};
use crate::analyzers::weighting::weight_metrics;
use crate::config::{EvalOptions, FailurePolicy};
use crate::error::{RaterError, Result};
use crate::metrics::compute_metrics;

/// Raw metric table of one station.
pub fn station_metrics(sheet: &StationSheet, include_transfers: bool) -> Result<MetricTable> {
    compute_metrics(&sheet.connections, include_transfers)
}

/// Runs metrics, weighting, line aggregation and summary for one station.
#[tracing::instrument(skip_all, fields(station = %sheet.station))]
pub fn evaluate_station(sheet: &StationSheet, options: &EvalOptions) -> Result<StationSummary> {
    if sheet.connections.is_empty() {
        return Err(RaterError::EmptyStation(sheet.station.clone()));
    }

    let metrics = compute_metrics(&sheet.connections, options.include_transfers)?;
    let weighted = weight_metrics(&metrics, &options.weights, &options.polarity)?;
    let scores = line_scores(&weighted);
    let summary = summarize_station(&sheet.station, &scores)?;

    debug!(
        index = summary.index,
        connections = summary.connections,
        best = %summary.best_line.destination,
        worst = %summary.worst_line.destination,
        "Station evaluated"
    );

    Ok(summary)
}

/// Evaluates all stations in order, applying the configured [`FailurePolicy`].
#[tracing::instrument(skip_all, fields(stations = sheets.len(), include_transfers = options.include_transfers))]
pub fn evaluate_workbook(sheets: &[StationSheet], options: &EvalOptions) -> Result<Evaluation> {
    let mut stations = Vec::with_capacity(sheets.len());
    let mut failures = Vec::new();

    for sheet in sheets {
        match evaluate_station(sheet, options) {
            Ok(summary) => stations.push(summary),
            Err(e) => match options.policy {
                FailurePolicy::FailFast => {
                    error!(station = %sheet.station, error = %e, "Station evaluation failed");
                    return Err(e);
                }
                FailurePolicy::SkipStation => {
                    warn!(station = %sheet.station, error = %e, "Skipping station");
                    failures.push(StationFailure {
                        station: sheet.station.clone(),
                        error: e.to_string(),
                    });
                }
            },
        }
    }

    info!(
        evaluated = stations.len(),
        failed = failures.len(),
        "Workbook evaluated"
    );

    Ok(Evaluation {
        generated_at: Utc::now(),
        include_transfers: options.include_transfers,
        stations,
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{Connection, Transfer};
    use crate::analyzers::weights::PolarityRules;

    fn connection(destination: &str, rail_time: f64, car_time: f64) -> Connection {
        Connection {
            destination: destination.to_string(),
            rail_time,
            car_time,
            rail_distance: 100.0,
            car_distance: 120.0,
            frequency: 2.0,
            transfer: None,
        }
    }

    fn sheet(station: &str, connections: Vec<Connection>) -> StationSheet {
        StationSheet {
            station: station.to_string(),
            connections,
        }
    }

    #[test]
    fn test_single_connection_station_scores_hundred() {
        let a = sheet("A", vec![connection("B", 60.0, 90.0)]);
        let summary = evaluate_station(&a, &EvalOptions::new(false)).unwrap();
        assert_eq!(summary.index, 100.0);
        assert_eq!(summary.connections, 1);
    }

    #[test]
    fn test_single_connection_with_transfers_scores_hundred() {
        let mut c = connection("B", 120.0, 150.0);
        c.transfer = Some(Transfer {
            time: 15.0,
            count: 1,
        });
        let summary = evaluate_station(&sheet("A", vec![c]), &EvalOptions::new(true)).unwrap();
        assert_eq!(summary.index, 100.0);
    }

    #[test]
    fn test_station_mean_is_weight_sum_times_hundred() {
        // ratios of every column average to 1
        let a = sheet(
            "A",
            vec![connection("B", 60.0, 90.0), connection("C", 90.0, 60.0)],
        );
        let summary = evaluate_station(&a, &EvalOptions::new(false)).unwrap();
        assert_eq!(summary.index, 100.0);
        assert_eq!(summary.best_line.destination, "B");
    }

    #[test]
    fn test_time_ratio_inversion_changes_ranking() {
        let a = sheet(
            "A",
            vec![connection("B", 60.0, 90.0), connection("C", 90.0, 60.0)],
        );
        let options = EvalOptions::new(false).with_polarity(PolarityRules {
            invert_time_ratio: true,
        });
        let summary = evaluate_station(&a, &options).unwrap();
        assert_eq!(summary.best_line.destination, "C");
    }

    #[test]
    fn test_empty_station_fails() {
        let result = evaluate_station(&sheet("A", vec![]), &EvalOptions::new(false));
        assert!(matches!(result, Err(RaterError::EmptyStation(_))));
    }

    #[test]
    fn test_fail_fast_aborts_run() {
        let sheets = vec![
            sheet("A", vec![connection("B", 60.0, 90.0)]),
            sheet("Broken", vec![]),
            sheet("C", vec![connection("D", 60.0, 90.0)]),
        ];
        let result = evaluate_workbook(&sheets, &EvalOptions::new(false));
        assert!(matches!(result, Err(RaterError::EmptyStation(s)) if s == "Broken"));
    }

    #[test]
    fn test_skip_station_isolates_failure() {
        let sheets = vec![
            sheet("A", vec![connection("B", 60.0, 90.0)]),
            sheet("Broken", vec![connection("X", 0.0, 90.0)]),
            sheet("C", vec![connection("D", 60.0, 90.0)]),
        ];
        let options = EvalOptions::new(false).with_policy(FailurePolicy::SkipStation);

        let evaluation = evaluate_workbook(&sheets, &options).unwrap();

        let names: Vec<_> = evaluation.stations.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(evaluation.failures.len(), 1);
        assert_eq!(evaluation.failures[0].station, "Broken");
    }

    #[test]
    fn test_station_metrics_exposes_raw_table() {
        let table = station_metrics(&sheet("A", vec![connection("B", 60.0, 90.0)]), false).unwrap();
        assert_eq!(table.rows[0].values, vec![1.5, 1.67, 0.83, 2.0]);
    }
}
