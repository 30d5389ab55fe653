use serde::Serialize;
use std::fmt;

use super::types::TimeSeries;
use super::variable::EnvironmentalVariable;
use crate::error::RiskError;
use crate::scoring::ThresholdSpec;

/// Multiple of the danger bound above which safety-critical readings are flagged.
const EXTREME_FACTOR: f64 = 2.0;

/// Non-fatal data-quality finding. Logged, never aborts processing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DataWarning {
    /// Some samples are NaN
    NotANumber {
        variable: EnvironmentalVariable,
        count: usize,
    },
    /// A safety-critical variable exceeded twice its danger bound
    Extreme {
        variable: EnvironmentalVariable,
        max: f64,
        danger: f64,
    },
}

impl fmt::Display for DataWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataWarning::NotANumber { variable, count } => {
                write!(f, "{} NaN values found in {} data", count, variable)
            }
            DataWarning::Extreme {
                variable,
                max,
                danger,
            } => write!(
                f,
                "Extreme values (>{}x danger threshold {}) found in {} data: max {}",
                EXTREME_FACTOR, danger, variable, max
            ),
        }
    }
}

/// Sanity-check a series before it is used for scoring or peak detection.
///
/// Negative samples (or an empty series) fail with `InvalidData`. NaN
/// samples and extreme safety-critical readings only produce warnings.
/// Warnings are logged even when the series is then rejected.
pub fn validate_series(
    variable: EnvironmentalVariable,
    series: &TimeSeries,
    threshold: &ThresholdSpec,
) -> Result<Vec<DataWarning>, RiskError> {
    if series.is_empty() {
        return Err(RiskError::InvalidData {
            variable,
            reason: "series has no samples".to_string(),
        });
    }

    let warnings = data_warnings(variable, series, threshold);
    for warning in &warnings {
        tracing::warn!(%variable, "{}", warning);
    }

    if let Some(negative) = series.samples().iter().find(|s| s.value < 0.0) {
        return Err(RiskError::InvalidData {
            variable,
            reason: format!("negative value {} at {}", negative.value, negative.time),
        });
    }

    Ok(warnings)
}

/// Non-fatal findings for a series, gathered whether or not it is rejected.
fn data_warnings(
    variable: EnvironmentalVariable,
    series: &TimeSeries,
    threshold: &ThresholdSpec,
) -> Vec<DataWarning> {
    let mut warnings = Vec::new();

    let nan_count = series.samples().iter().filter(|s| s.value.is_nan()).count();
    if nan_count > 0 {
        warnings.push(DataWarning::NotANumber {
            variable,
            count: nan_count,
        });
    }

    if variable.is_safety_critical() {
        let limit = threshold.danger * EXTREME_FACTOR;
        let max = series
            .samples()
            .iter()
            .map(|s| s.value)
            .filter(|v| !v.is_nan())
            .fold(f64::NEG_INFINITY, f64::max);
        if max > limit {
            warnings.push(DataWarning::Extreme {
                variable,
                max,
                danger: threshold.danger,
            });
        }
    }

    warnings
}
