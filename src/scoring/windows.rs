use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::factors::AggregationWindow;
use crate::series::TimeSeries;

/// Shortest exceedance that counts as a risk window by default.
pub const DEFAULT_MIN_DURATION_HOURS: i64 = 3;

/// A sustained exceedance of an alert threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Highest (windowed) value observed inside the window
    #[serde(rename = "value")]
    pub peak_value: f64,
}

impl TimeWindow {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

enum State {
    Outside,
    Inside { start: DateTime<Utc>, peak: f64 },
}

/// Scan a series for periods above `threshold` lasting at least `min_duration`.
///
/// Instant windows compare raw samples; rolling windows compare the
/// trailing mean (see `TimeSeries::rolling_mean`). A window closes at the
/// first sample at or below the threshold, and that sample's timestamp is
/// its end. A window still open at the end of the series ends at the last
/// timestamp. Windows shorter than `min_duration` are dropped.
pub fn detect_peak_windows(
    series: &TimeSeries,
    window: AggregationWindow,
    threshold: f64,
    min_duration: Duration,
) -> Vec<TimeWindow> {
    let values: Vec<Option<f64>> = match window.rolling_duration() {
        None => series.samples().iter().map(|s| Some(s.value)).collect(),
        Some(duration) => series.rolling_mean(duration),
    };

    let mut windows = Vec::new();
    let mut state = State::Outside;

    for (sample, value) in series.samples().iter().zip(values) {
        let exceeds = matches!(value, Some(v) if v > threshold);

        state = match (state, exceeds) {
            (State::Outside, true) => State::Inside {
                start: sample.time,
                peak: value.unwrap_or(threshold),
            },
            (State::Outside, false) => State::Outside,
            (State::Inside { start, peak }, true) => State::Inside {
                start,
                peak: peak.max(value.unwrap_or(peak)),
            },
            (State::Inside { start, peak }, false) => {
                push_if_long_enough(&mut windows, start, sample.time, peak, min_duration);
                State::Outside
            }
        };
    }

    if let (State::Inside { start, peak }, Some(last)) = (state, series.samples().last()) {
        push_if_long_enough(&mut windows, start, last.time, peak, min_duration);
    }

    windows
}

fn push_if_long_enough(
    windows: &mut Vec<TimeWindow>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    peak_value: f64,
    min_duration: Duration,
) {
    if end > start && end - start >= min_duration {
        windows.push(TimeWindow {
            start,
            end,
            peak_value,
        });
    }
}
