use chrono::NaiveDate;
use thiserror::Error;

use crate::scoring::HealthProfile;
use crate::series::EnvironmentalVariable;

/// Errors raised while assessing risk.
///
/// `NoData` aborts a single assessment request. `InvalidData` only ever
/// disqualifies one variable; the engine records it as missing and
/// carries on with the rest of the profile.
#[derive(Debug, Clone, Error)]
pub enum RiskError {
    #[error("no environmental data found for date {date}")]
    NoData { date: NaiveDate },

    #[error("invalid data for {variable}: {reason}")]
    InvalidData {
        variable: EnvironmentalVariable,
        reason: String,
    },

    #[error("no usable catalog entry for profile {0}")]
    UnknownProfile(HealthProfile),

    #[error("invalid time series: {0}")]
    InvalidSeries(String),

    #[error("assessment task failed: {0}")]
    Task(String),
}

impl RiskError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, RiskError::NoData { .. })
    }
}
