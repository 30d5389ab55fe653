pub mod config;
pub mod engine;
pub mod factors;
pub mod pollen;
pub mod profile;
pub mod validation;
pub mod windows;

pub use config::*;
pub use engine::{confidence, EngineOptions, RiskAssessment, RiskEngine};
pub use factors::{hazard_fraction, sub_score, AggregationWindow, CurveKind};
pub use pollen::{aggregate_pollen, PollenScore};
pub use profile::HealthProfile;
pub use validation::validate_catalog;
pub use windows::{detect_peak_windows, TimeWindow};
