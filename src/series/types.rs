use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use super::variable::EnvironmentalVariable;
use crate::error::RiskError;

/// All series supplied for one date, keyed by variable.
pub type SeriesSet = BTreeMap<EnvironmentalVariable, TimeSeries>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    /// A `null` in the file format reads as NaN (missing reading)
    #[serde(deserialize_with = "null_as_nan")]
    pub value: f64,
}

fn null_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

impl Sample {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Chronological forecast samples for a single variable.
///
/// Construction rejects out-of-order and duplicate timestamps, so every
/// consumer can rely on strictly increasing time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Sample>", into = "Vec<Sample>")]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> Result<Self, RiskError> {
        for pair in samples.windows(2) {
            if pair[1].time == pair[0].time {
                return Err(RiskError::InvalidSeries(format!(
                    "duplicate timestamp {}",
                    pair[1].time
                )));
            }
            if pair[1].time < pair[0].time {
                return Err(RiskError::InvalidSeries(format!(
                    "timestamp {} precedes {}",
                    pair[1].time, pair[0].time
                )));
            }
        }
        Ok(Self { samples })
    }

    /// Build an evenly spaced series starting at `start`.
    pub fn from_values(start: DateTime<Utc>, step: Duration, values: &[f64]) -> Result<Self, RiskError> {
        if step <= Duration::zero() && values.len() > 1 {
            return Err(RiskError::InvalidSeries("step must be positive".to_string()));
        }
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, v)| Sample::new(start + step * i as i32, *v))
            .collect();
        Self::new(samples)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Mean over the whole horizon, skipping NaN samples.
    /// Returns None when there is no usable sample.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .samples
            .iter()
            .filter(|s| !s.value.is_nan())
            .fold((0.0, 0usize), |(sum, count), s| (sum + s.value, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Duration covered from the first to the last sample.
    pub fn horizon(&self) -> Duration {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => Duration::zero(),
        }
    }

    /// Forecast lead time of the sample at `index`, relative to the first sample.
    pub fn lead_time(&self, index: usize) -> Option<Duration> {
        let first = self.samples.first()?;
        self.samples.get(index).map(|s| s.time - first.time)
    }

    /// Sampling interval between the first two samples.
    pub fn step(&self) -> Option<Duration> {
        match self.samples.as_slice() {
            [a, b, ..] => Some(b.time - a.time),
            _ => None,
        }
    }

    /// Trailing rolling mean over `window`, aligned with the samples.
    ///
    /// The mean at sample `i` averages every sample with `t > t_i - window`.
    /// Points where the series does not yet cover the full window are None.
    /// A NaN inside the window makes that point NaN.
    pub fn rolling_mean(&self, window: Duration) -> Vec<Option<f64>> {
        let Some(first) = self.samples.first() else {
            return Vec::new();
        };
        let step = self.step().unwrap_or_else(Duration::zero);

        let mut out = Vec::with_capacity(self.samples.len());
        let mut start = 0usize;

        for (i, sample) in self.samples.iter().enumerate() {
            while start < i && self.samples[start].time <= sample.time - window {
                start += 1;
            }

            if sample.time - first.time + step < window {
                out.push(None);
                continue;
            }

            // Each point sums its own slice, no running total
            let slice = &self.samples[start..=i];
            if slice.iter().any(|s| s.value.is_nan()) {
                out.push(Some(f64::NAN));
            } else {
                let sum: f64 = slice.iter().map(|s| s.value).sum();
                out.push(Some(sum / slice.len() as f64));
            }
        }
        out
    }
}

impl TryFrom<Vec<Sample>> for TimeSeries {
    type Error = RiskError;

    fn try_from(samples: Vec<Sample>) -> Result<Self, Self::Error> {
        TimeSeries::new(samples)
    }
}

impl From<TimeSeries> for Vec<Sample> {
    fn from(series: TimeSeries) -> Self {
        series.samples
    }
}
