//! Health-risk scoring for environmental forecasts.
//!
//! A [`scoring::RiskEngine`] turns a day of environmental time series
//! (pollen, particulates, gases, UV) into a 1-10 risk score for a health
//! profile, along with per-variable sub-scores and the periods of the day
//! when alert thresholds are exceeded.

pub mod config;
pub mod error;
pub mod fetch;
pub mod output;
pub mod scoring;
pub mod series;

pub use error::RiskError;
pub use fetch::{assess_profiles, ProfileOutcome};
pub use scoring::{Catalog, HealthProfile, RiskAssessment, RiskEngine};
pub use series::{DataLoader, DirectoryLoader, EnvironmentalVariable, MemoryLoader, SeriesSet, TimeSeries};
