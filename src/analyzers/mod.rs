//! Accessibility evaluation of departure stations.
//!
//! Connection metrics are normalized against their station mean, weighted,
//! summed per line and averaged into one index per station.

pub mod aggregate;
pub mod analyzer;
pub mod types;
pub mod utility;
pub mod weighting;
pub mod weights;
