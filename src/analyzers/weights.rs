//! Weight tables ("Gewichtungsfaktoren") and metric polarity.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::analyzers::types::{Metric, Polarity};
use crate::error::{RaterError, Result};

/// Allowed deviation of a weight table's sum from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Weights for direct connections, four metrics.
static DIRECT_WEIGHTS: &[(Metric, f64)] = &[
    (Metric::Comfort, 0.294),
    (Metric::TimeRatio, 0.460),
    (Metric::Speed, 0.159),
    (Metric::Frequency, 0.087),
];

/// Weights when transfers are considered, six metrics.
static TRANSFER_WEIGHTS: &[(Metric, f64)] = &[
    (Metric::Comfort, 0.242),
    (Metric::TimeRatio, 0.379),
    (Metric::Speed, 0.131),
    (Metric::Frequency, 0.072),
    (Metric::TransferTimeRatio, 0.088),
    (Metric::TransferBurden, 0.088),
];

/// Read-only mapping from metric to its share of the composite index.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct WeightTable {
    weights: BTreeMap<Metric, f64>,
}

impl WeightTable {
    /// Built-in table for the given mode.
    pub fn for_mode(include_transfers: bool) -> Self {
        let entries = if include_transfers {
            TRANSFER_WEIGHTS
        } else {
            DIRECT_WEIGHTS
        };
        Self {
            weights: entries.iter().copied().collect(),
        }
    }

    /// Loads a table from a JSON object keyed by metric id, e.g.
    /// ```json
    /// { "time_ratio": 0.46, "speed": 0.159, "comfort": 0.294, "frequency": 0.087 }
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table: WeightTable = serde_json::from_str(&content)?;
        table.validate()?;
        Ok(table)
    }

    /// Checks every weight lies in [0, 1] and the weights sum to 1.
    pub fn validate(&self) -> Result<()> {
        if let Some((metric, w)) = self
            .weights
            .iter()
            .find(|(_, w)| !(0.0..=1.0).contains(*w))
        {
            return Err(RaterError::InvalidWeights(format!(
                "weight {w} for '{metric}' is outside [0, 1]"
            )));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(RaterError::InvalidWeights(format!(
                "weights sum to {sum}, expected 1.0"
            )));
        }
        Ok(())
    }

    /// Checks the table carries a weight for each of `metrics` and for
    /// nothing else, so the weights in use are the ones that sum to 1.
    pub fn check_columns(&self, metrics: &[Metric]) -> Result<()> {
        if let Some(missing) = metrics.iter().find(|m| !self.weights.contains_key(*m)) {
            return Err(RaterError::UnknownMetric(*missing));
        }
        if let Some(extra) = self.weights.keys().find(|m| !metrics.contains(m)) {
            return Err(RaterError::InvalidWeights(format!(
                "weight for '{extra}' is not used in this mode"
            )));
        }
        Ok(())
    }

    pub fn weight(&self, metric: Metric) -> Result<f64> {
        self.weights
            .get(&metric)
            .copied()
            .ok_or(RaterError::UnknownMetric(metric))
    }

    pub fn sum(&self) -> f64 {
        self.weights.values().sum()
    }
}

/// Which metrics count as "lower is better" during normalization.
///
/// Transfer metrics are always inverted. The time ratio is car time over
/// rail time and is left uninverted unless `invert_time_ratio` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolarityRules {
    pub invert_time_ratio: bool,
}

impl PolarityRules {
    pub fn polarity(&self, metric: Metric) -> Polarity {
        match metric {
            Metric::TimeRatio if self.invert_time_ratio => Polarity::LowerIsBetter,
            Metric::TimeRatio | Metric::Speed | Metric::Comfort | Metric::Frequency => {
                Polarity::HigherIsBetter
            }
            Metric::TransferTimeRatio | Metric::TransferBurden => Polarity::LowerIsBetter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_tables_sum_to_one() {
        for include_transfers in [false, true] {
            let table = WeightTable::for_mode(include_transfers);
            assert!((table.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE);
            table.validate().unwrap();
            table.check_columns(Metric::columns(include_transfers)).unwrap();
        }
    }

    #[test]
    fn test_direct_table_has_no_transfer_weights() {
        let table = WeightTable::for_mode(false);
        assert!(matches!(
            table.weight(Metric::TransferBurden),
            Err(RaterError::UnknownMetric(Metric::TransferBurden))
        ));
        assert!(matches!(
            table.check_columns(Metric::columns(true)),
            Err(RaterError::UnknownMetric(Metric::TransferTimeRatio))
        ));
        assert!(matches!(
            WeightTable::for_mode(true).check_columns(Metric::columns(false)),
            Err(RaterError::InvalidWeights(_))
        ));
        assert_eq!(table.weight(Metric::TimeRatio).unwrap(), 0.460);
    }

    #[test]
    fn test_load_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"time_ratio": 0.4, "speed": 0.2, "comfort": 0.3, "frequency": 0.1}}"#
        )
        .unwrap();

        let table = WeightTable::load(file.path()).unwrap();
        assert_eq!(table.weight(Metric::Speed).unwrap(), 0.2);
    }

    #[test]
    fn test_load_rejects_bad_sum() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"time_ratio": 0.5, "speed": 0.2}}"#).unwrap();

        assert!(matches!(
            WeightTable::load(file.path()),
            Err(RaterError::InvalidWeights(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_metric_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"Reisezeit Vehältnis": 1.0}}"#).unwrap();

        assert!(matches!(
            WeightTable::load(file.path()),
            Err(RaterError::Json(_))
        ));
    }

    #[test]
    fn test_polarity_rules() {
        let default = PolarityRules::default();
        assert_eq!(default.polarity(Metric::TimeRatio), Polarity::HigherIsBetter);
        assert_eq!(default.polarity(Metric::TransferBurden), Polarity::LowerIsBetter);
        assert_eq!(default.polarity(Metric::TransferTimeRatio), Polarity::LowerIsBetter);

        let inverted = PolarityRules {
            invert_time_ratio: true,
        };
        assert_eq!(inverted.polarity(Metric::TimeRatio), Polarity::LowerIsBetter);
        assert_eq!(inverted.polarity(Metric::Comfort), Polarity::HigherIsBetter);
    }
}
