use crate::analyzers::types::{LineScore, StationSummary, WeightedTable};
use crate::analyzers::utility::{mean, round2, stddev};
use crate::error::{RaterError, Result};

/// Sums the weighted contributions of each connection into one score per line.
///
/// Missing or NaN contributions propagate into the score.
pub fn line_scores(weighted: &WeightedTable) -> Vec<LineScore> {
    weighted
        .rows
        .iter()
        .map(|row| LineScore {
            destination: row.destination.clone(),
            score: row.values.iter().sum(),
        })
        .collect()
}

/// Averages the line scores of a station into its accessibility index.
///
/// The index is rounded to two decimals. The spread and the best and worst
/// line are reported unrounded.
///
/// Every metric column is normalized against its own station mean, so the
/// line scores of a station average to 100 times the weight sum. The index
/// only departs from 100 through rounding or a weight table that does not
/// sum to 1; the ranking between lines lives in the spread and extremes.
pub fn summarize_station(station: &str, scores: &[LineScore]) -> Result<StationSummary> {
    if let Some(bad) = scores.iter().find(|s| !s.score.is_finite()) {
        return Err(RaterError::arithmetic(
            &bad.destination,
            "line score",
            format!("score is {}", bad.score),
        ));
    }

    let values: Vec<f64> = scores.iter().map(|s| s.score).collect();
    let avg = mean(&values).ok_or_else(|| RaterError::EmptyStation(station.to_string()))?;

    // non-empty and finite past this point
    let best = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| RaterError::EmptyStation(station.to_string()))?;
    let worst = scores
        .iter()
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .ok_or_else(|| RaterError::EmptyStation(station.to_string()))?;

    Ok(StationSummary {
        station: station.to_string(),
        index: round2(avg),
        connections: scores.len(),
        line_stddev: stddev(&values, avg),
        best_line: best.clone(),
        worst_line: worst.clone(),
    })
}
