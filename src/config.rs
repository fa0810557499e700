//! Run configuration passed explicitly into every pipeline call.

use std::path::Path;

use crate::analyzers::types::Metric;
use crate::analyzers::weights::{PolarityRules, WeightTable};
use crate::error::Result;

/// What to do when one station cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing station.
    #[default]
    FailFast,
    /// Record the failure, leave the station out of the results and continue.
    SkipStation,
}

/// Options for one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOptions {
    pub include_transfers: bool,
    pub polarity: PolarityRules,
    pub policy: FailurePolicy,
    pub weights: WeightTable,
}

impl EvalOptions {
    /// Options with the built-in weight table for the mode.
    pub fn new(include_transfers: bool) -> Self {
        Self {
            include_transfers,
            polarity: PolarityRules::default(),
            policy: FailurePolicy::default(),
            weights: WeightTable::for_mode(include_transfers),
        }
    }

    /// Replaces the weight table with one loaded from `path`.
    ///
    /// The loaded table must weight exactly the metrics of the active mode.
    pub fn with_weights_file(mut self, path: &Path) -> Result<Self> {
        let weights = WeightTable::load(path)?;
        weights.check_columns(Metric::columns(self.include_transfers))?;
        self.weights = weights;
        Ok(self)
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_polarity(mut self, polarity: PolarityRules) -> Self {
        self.polarity = polarity;
        self
    }
}
