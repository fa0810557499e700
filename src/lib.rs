pub mod analyzers;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod parser;
