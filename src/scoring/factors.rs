use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Steepness of the logistic curve around the midpoint.
const LOGISTIC_STEEPNESS: f64 = 12.0;

/// Averaging horizon applied before a value is compared to a threshold.
///
/// Textual form is either `instant` or a duration such as `8h` / `24h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AggregationWindow {
    Instant,
    Rolling(Duration),
}

impl AggregationWindow {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("instant") {
            return Ok(AggregationWindow::Instant);
        }
        let duration = humantime::parse_duration(s)?;
        if duration.is_zero() {
            bail!("Rolling window must be longer than zero: {}", s)
        }
        if chrono::Duration::from_std(duration).is_err() {
            bail!("Rolling window out of range: {}", s)
        }
        Ok(AggregationWindow::Rolling(duration))
    }

    /// Rolling duration, or None for instant windows.
    pub fn rolling_duration(&self) -> Option<chrono::Duration> {
        match self {
            AggregationWindow::Instant => None,
            AggregationWindow::Rolling(d) => chrono::Duration::from_std(*d).ok(),
        }
    }
}

impl fmt::Display for AggregationWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationWindow::Instant => f.write_str("instant"),
            AggregationWindow::Rolling(d) if d.as_secs() % 3600 == 0 && d.subsec_nanos() == 0 => {
                write!(f, "{}h", d.as_secs() / 3600)
            }
            AggregationWindow::Rolling(d) => write!(f, "{}", humantime::format_duration(*d)),
        }
    }
}

impl TryFrom<String> for AggregationWindow {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        AggregationWindow::parse(&s)
    }
}

impl From<AggregationWindow> for String {
    fn from(window: AggregationWindow) -> Self {
        window.to_string()
    }
}

/// Shape applied to a hazard fraction before it becomes a sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    #[default]
    Linear,
    /// Sharpens the transition around the midpoint so near-threshold
    /// crossings swing the score quickly.
    Logistic,
}

impl CurveKind {
    pub fn apply(self, fraction: f64) -> f64 {
        match self {
            CurveKind::Linear => fraction,
            CurveKind::Logistic => 1.0 / (1.0 + (-LOGISTIC_STEEPNESS * (fraction - 0.5)).exp()),
        }
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveKind::Linear => f.write_str("linear"),
            CurveKind::Logistic => f.write_str("logistic"),
        }
    }
}

/// Normalized position of `value` between the safe and danger bounds, in [0, 1].
///
/// NaN yields 0. Callers guarantee `danger > safe` (checked at catalog load).
pub fn hazard_fraction(value: f64, safe: f64, danger: f64) -> f64 {
    let fraction = (value - safe) / (danger - safe);
    if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    }
}

/// Convert a hazard fraction to a 1-10 sub-score.
///
/// The curve is applied first, then the sensitivity exponent: values above
/// 1.0 desensitize (mid-range fractions drop), values below 1.0 sensitize.
pub fn sub_score(fraction: f64, curve: CurveKind, sensitivity: f64) -> u8 {
    let fraction = if fraction.is_nan() {
        0.0
    } else {
        fraction.clamp(0.0, 1.0)
    };
    let shaped = curve.apply(fraction).powf(sensitivity);
    score_from_fraction(shaped)
}

/// `round(1 + 9 * fraction)`, clamped to [1, 10].
pub(crate) fn score_from_fraction(fraction: f64) -> u8 {
    let score = round_half_even(1.0 + 9.0 * fraction);
    if score.is_nan() {
        1
    } else {
        score.clamp(1.0, 10.0) as u8
    }
}

/// Banker's rounding, used for every score in the engine.
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}
