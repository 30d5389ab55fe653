use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::config::{Catalog, ThresholdSpec};
use super::factors::{hazard_fraction, round_half_even, sub_score};
use super::pollen::aggregate_pollen;
use super::profile::HealthProfile;
use super::windows::{detect_peak_windows, TimeWindow, DEFAULT_MIN_DURATION_HOURS};
use crate::error::RiskError;
use crate::series::{validate_series, DataLoader, EnvironmentalVariable, SeriesSet};

/// Sub-score given to variables with no usable data.
const MISSING_SUB_SCORE: u8 = 1;

/// A sub-score at or above this replaces the weighted blend.
const OVERRIDE_SUB_SCORE: u8 = 9;

/// Representative values above this multiple of the danger bound are clamped.
const BEYOND_SCALE_FACTOR: f64 = 1.5;

/// Maximum confidence lost when every required variable is missing.
const MAX_CONFIDENCE_PENALTY: f64 = 0.5;

/// Personalized risk for one profile on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub profile: HealthProfile,
    pub date: NaiveDate,
    /// Weighted blend of sub-scores, or the worst sub-score when it reaches
    /// the top of the scale. Not clamped: unnormalized weights can push it
    /// outside 1-10.
    pub final_score: i32,
    pub sub_scores: BTreeMap<EnvironmentalVariable, u8>,
    pub top_contributor: (EnvironmentalVariable, u8),
    pub confidence: f64,
    pub beyond_scale: bool,
    pub risk_windows: BTreeMap<EnvironmentalVariable, Vec<TimeWindow>>,
    pub missing_variables: Vec<EnvironmentalVariable>,
    pub extreme_events: BTreeMap<EnvironmentalVariable, f64>,
}

impl RiskAssessment {
    pub fn is_complete(&self) -> bool {
        self.missing_variables.is_empty()
    }

    pub fn window_count(&self) -> usize {
        self.risk_windows.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineOptions {
    /// Exponent applied to shaped hazard fractions of non-pollen variables
    pub sensitivity: f64,
    /// Shortest exceedance reported as a risk window
    pub min_window_duration: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            min_window_duration: Duration::hours(DEFAULT_MIN_DURATION_HOURS),
        }
    }
}

/// Scores profiles against a date's environmental series.
///
/// Holds only the shared read-only catalog, so clones are cheap and can be
/// moved into worker threads freely.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    catalog: Arc<Catalog>,
    options: EngineOptions,
}

impl RiskEngine {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Load the date's data and assess one profile.
    ///
    /// Fails only when the loader has nothing at all for the date. Missing
    /// or invalid variables lower the confidence instead.
    pub fn assess(
        &self,
        profile: HealthProfile,
        date: NaiveDate,
        loader: &dyn DataLoader,
    ) -> Result<RiskAssessment, RiskError> {
        let data = loader.load(date)?;
        self.assess_profile(profile, date, &data)
    }

    /// Assess one profile against already-loaded data.
    pub fn assess_profile(
        &self,
        profile: HealthProfile,
        date: NaiveDate,
        data: &SeriesSet,
    ) -> Result<RiskAssessment, RiskError> {
        let spec = self
            .catalog
            .profile(profile)
            .ok_or(RiskError::UnknownProfile(profile))?;
        let first = spec
            .weights
            .first()
            .ok_or(RiskError::UnknownProfile(profile))?;

        let mut sub_scores = BTreeMap::new();
        let mut missing_variables = Vec::new();
        let mut extreme_events = BTreeMap::new();
        let mut beyond_scale = false;

        for entry in &spec.weights {
            let var = entry.variable;
            let Some((mut value, threshold)) = self.representative_value(var, data) else {
                missing_variables.push(var);
                sub_scores.insert(var, MISSING_SUB_SCORE);
                continue;
            };

            if value > threshold.danger * BEYOND_SCALE_FACTOR {
                tracing::warn!(
                    "{} mean {} is beyond scale (danger {}), clamping",
                    var,
                    value,
                    threshold.danger
                );
                beyond_scale = true;
                extreme_events.insert(var, value);
                value = threshold.danger;
            }

            let score = if self.catalog.family_of(var).is_some() {
                aggregate_pollen(&BTreeMap::from([(var, value)]), &self.catalog).score
            } else {
                let hazard = hazard_fraction(value, threshold.safe, threshold.danger);
                let hazard = (hazard * spec.hazard_multiplier).min(1.0);
                sub_score(hazard, threshold.curve, self.options.sensitivity)
            };
            sub_scores.insert(var, score);
        }

        let weighted: f64 = spec
            .weights
            .iter()
            .map(|w| w.weight * f64::from(sub_scores.get(&w.variable).copied().unwrap_or(MISSING_SUB_SCORE)))
            .sum();
        let mut final_score = round_half_even(weighted) as i32;

        // Top contributor: first variable in weight order with the highest score
        let mut top_contributor = (first.variable, MISSING_SUB_SCORE);
        let mut best: Option<u8> = None;
        for entry in &spec.weights {
            let score = sub_scores.get(&entry.variable).copied().unwrap_or(MISSING_SUB_SCORE);
            if best.map_or(true, |b| score > b) {
                best = Some(score);
                top_contributor = (entry.variable, score);
            }
        }

        // Dominant-pollutant override
        if top_contributor.1 >= OVERRIDE_SUB_SCORE {
            final_score = i32::from(top_contributor.1);
        }

        let confidence = confidence(missing_variables.len(), spec.weights.len());

        tracing::debug!(
            "{}: final score {} (weighted {:.2}), confidence {:.2}, {} missing",
            profile,
            final_score,
            weighted,
            confidence,
            missing_variables.len()
        );

        Ok(RiskAssessment {
            profile,
            date,
            final_score,
            sub_scores,
            top_contributor,
            confidence,
            beyond_scale,
            risk_windows: self.risk_windows(data),
            missing_variables,
            extreme_events,
        })
    }

    /// Risk windows for every supplied variable that has an alert threshold,
    /// regardless of profile.
    pub fn risk_windows(&self, data: &SeriesSet) -> BTreeMap<EnvironmentalVariable, Vec<TimeWindow>> {
        let mut windows = BTreeMap::new();
        for (var, series) in data {
            let (Some(alert), Some(threshold)) = (self.catalog.alert(*var), self.catalog.threshold(*var)) else {
                continue;
            };
            let detected = match validate_series(*var, series, threshold) {
                Ok(_) => detect_peak_windows(
                    series,
                    alert.window,
                    alert.alert_threshold,
                    self.options.min_window_duration,
                ),
                Err(e) => {
                    tracing::error!("Data validation failed for {}: {}", var, e);
                    Vec::new()
                }
            };
            windows.insert(*var, detected);
        }
        windows
    }

    /// Horizon mean of a validated series with its thresholds, or None when
    /// the variable has to be treated as missing.
    fn representative_value(
        &self,
        var: EnvironmentalVariable,
        data: &SeriesSet,
    ) -> Option<(f64, &ThresholdSpec)> {
        let series = data.get(&var)?;
        let Some(threshold) = self.catalog.threshold(var) else {
            tracing::error!("{} has no threshold definition, treating as missing", var);
            return None;
        };
        if let Err(e) = validate_series(var, series, threshold) {
            tracing::error!("Error processing {}: {}", var, e);
            return None;
        }
        match series.mean() {
            Some(mean) => Some((mean, threshold)),
            None => {
                tracing::warn!("No usable samples for {}, treating as missing", var);
                None
            }
        }
    }
}

/// `1 - 0.5 * missing / required`; 1.0 when nothing is required.
pub fn confidence(missing: usize, required: usize) -> f64 {
    if required == 0 {
        return 1.0;
    }
    let ratio = (missing.min(required)) as f64 / required as f64;
    1.0 - MAX_CONFIDENCE_PENALTY * ratio
}
