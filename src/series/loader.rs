use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{SeriesSet, TimeSeries};
use super::variable::EnvironmentalVariable;
use crate::error::RiskError;

/// Supplies the per-variable series for a date.
///
/// Implementations return `RiskError::NoData` only when nothing at all is
/// available for the date. A single missing variable is simply absent from
/// the returned map.
pub trait DataLoader: Send + Sync {
    fn load(&self, date: NaiveDate) -> Result<SeriesSet, RiskError>;
}

/// Reads `<YYYY-MM-DD>_<variable>.json` files from a directory.
///
/// Each file holds a JSON array of `{"time": RFC3339, "value": number}`
/// samples, where a `null` value marks a missing reading. Unreadable or
/// malformed files are logged and skipped.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a series file for `date` and `variable` is expected at.
    pub fn file_path(&self, date: NaiveDate, variable: EnvironmentalVariable) -> PathBuf {
        self.dir.join(format!("{}_{}.json", date.format("%Y-%m-%d"), variable.id()))
    }

    fn read_series(path: &Path) -> anyhow::Result<TimeSeries> {
        use anyhow::Context;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read series file at {}", path.display()))?;
        let series = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse series file at {}", path.display()))?;
        Ok(series)
    }
}

impl DataLoader for DirectoryLoader {
    fn load(&self, date: NaiveDate) -> Result<SeriesSet, RiskError> {
        let prefix = format!("{}_", date.format("%Y-%m-%d"));
        let pattern = format!(
            "{}/{}*.json",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            prefix
        );

        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!("Invalid data directory pattern {}: {}", pattern, e);
                return Err(RiskError::NoData { date });
            }
        };

        let mut data = SeriesSet::new();
        for entry in paths {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("Error reading data directory entry: {}", e);
                    continue;
                }
            };

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = stem.strip_prefix(&prefix).unwrap_or(stem);
            let variable = match EnvironmentalVariable::parse(id) {
                Ok(v) => v,
                Err(_) => {
                    tracing::debug!("Skipping {}: not a tracked variable", path.display());
                    continue;
                }
            };

            match Self::read_series(&path) {
                Ok(series) => {
                    tracing::debug!("Loaded {} samples for {}", series.len(), variable);
                    data.insert(variable, series);
                }
                Err(e) => tracing::error!("Error loading {} data: {:#}", variable, e),
            }
        }

        if data.is_empty() {
            return Err(RiskError::NoData { date });
        }
        Ok(data)
    }
}

/// In-memory loader keyed by date.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    days: HashMap<NaiveDate, SeriesSet>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, variable: EnvironmentalVariable, series: TimeSeries) {
        self.days.entry(date).or_default().insert(variable, series);
    }

    pub fn with_day(mut self, date: NaiveDate, data: SeriesSet) -> Self {
        self.days.insert(date, data);
        self
    }
}

impl DataLoader for MemoryLoader {
    fn load(&self, date: NaiveDate) -> Result<SeriesSet, RiskError> {
        match self.days.get(&date) {
            Some(data) if !data.is_empty() => Ok(data.clone()),
            _ => Err(RiskError::NoData { date }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::env;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_memory_loader_missing_date_is_no_data() {
        let loader = MemoryLoader::new();
        assert!(matches!(loader.load(date()), Err(RiskError::NoData { .. })));
    }

    #[test]
    fn test_memory_loader_returns_series() {
        let start = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
        let series = TimeSeries::from_values(start, Duration::hours(1), &[1.0, 2.0]).unwrap();
        let mut loader = MemoryLoader::new();
        loader.insert(date(), EnvironmentalVariable::Uv, series);

        let data = loader.load(date()).unwrap();
        assert_eq!(data.len(), 1);
        assert!(data.contains_key(&EnvironmentalVariable::Uv));
    }

    #[test]
    fn test_directory_loader_reads_matching_files() {
        let dir = temp_dir("skywell_test_loader_reads");
        let loader = DirectoryLoader::new(&dir);
        fs::write(
            loader.file_path(date(), EnvironmentalVariable::Pm2p5),
            r#"[{"time": "2025-06-05T00:00:00Z", "value": 12.5},
                {"time": "2025-06-05T01:00:00Z", "value": 14.0}]"#,
        )
        .unwrap();
        // Another date and an unknown variable are ignored
        fs::write(dir.join("2025-06-06_pm10_conc.json"), "[]").unwrap();
        fs::write(dir.join("2025-06-05_mold.json"), "[]").unwrap();

        let data = loader.load(date()).unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[&EnvironmentalVariable::Pm2p5].len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_loader_skips_malformed_files() {
        let dir = temp_dir("skywell_test_loader_malformed");
        let loader = DirectoryLoader::new(&dir);
        fs::write(loader.file_path(date(), EnvironmentalVariable::No2), "not json").unwrap();
        fs::write(
            loader.file_path(date(), EnvironmentalVariable::So2),
            r#"[{"time": "2025-06-05T00:00:00Z", "value": 3.0}]"#,
        )
        .unwrap();

        let data = loader.load(date()).unwrap();
        assert!(!data.contains_key(&EnvironmentalVariable::No2));
        assert!(data.contains_key(&EnvironmentalVariable::So2));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_loader_keeps_series_with_null_samples() {
        let dir = temp_dir("skywell_test_loader_nulls");
        let loader = DirectoryLoader::new(&dir);
        fs::write(
            loader.file_path(date(), EnvironmentalVariable::Pm2p5),
            r#"[{"time": "2025-06-05T00:00:00Z", "value": 40.0},
                {"time": "2025-06-05T01:00:00Z", "value": null},
                {"time": "2025-06-05T02:00:00Z", "value": 50.0}]"#,
        )
        .unwrap();
        fs::write(
            loader.file_path(date(), EnvironmentalVariable::Uv),
            r#"[{"time": "2025-06-05T00:00:00Z", "value": 3.0}]"#,
        )
        .unwrap();

        let data = loader.load(date()).unwrap();
        let pm25 = &data[&EnvironmentalVariable::Pm2p5];
        assert_eq!(pm25.len(), 3);
        assert!(pm25.samples()[1].value.is_nan());
        assert_eq!(pm25.mean(), Some(45.0));
        assert!(data.contains_key(&EnvironmentalVariable::Uv));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_directory_loader_empty_is_no_data() {
        let dir = temp_dir("skywell_test_loader_empty");
        let loader = DirectoryLoader::new(&dir);
        assert!(matches!(loader.load(date()), Err(RiskError::NoData { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
