use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::{validate_catalog, Catalog, CatalogOverrides, EngineOptions, HealthProfile};

/// Contents of `~/.config/skywell/config.yaml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<date>_<variable>.json` series files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Shortest exceedance reported as a risk window, e.g. "3h"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_window_duration: Option<String>,

    /// Sensitivity exponent for non-pollen sub-scores (default: 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<f64>,

    /// Profiles assessed when none are given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiles: Option<Vec<HealthProfile>>,

    /// Replacements for built-in catalog entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogOverrides>,
}

impl Config {
    /// Built-in catalog with this config's overrides applied.
    pub fn build_catalog(&self) -> Catalog {
        match self.catalog {
            Some(ref overrides) => Catalog::default().with_overrides(overrides),
            None => Catalog::default(),
        }
    }

    pub fn engine_options(&self) -> Result<EngineOptions> {
        let mut options = EngineOptions::default();
        if let Some(sensitivity) = self.sensitivity {
            options.sensitivity = sensitivity;
        }
        if let Some(ref duration) = self.min_window_duration {
            let parsed = humantime::parse_duration(duration)
                .with_context(|| format!("Invalid min_window_duration '{}'", duration))?;
            options.min_window_duration = chrono::Duration::from_std(parsed)
                .with_context(|| format!("min_window_duration out of range: '{}'", duration))?;
        }
        Ok(options)
    }
}

/// Validate the whole configuration, catalog included.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(sensitivity) = config.sensitivity {
        if !(sensitivity.is_finite() && sensitivity > 0.0) {
            errors.push(format!("sensitivity: must be positive, got {}", sensitivity));
        }
    }

    if let Some(ref duration) = config.min_window_duration {
        if let Err(e) = humantime::parse_duration(duration) {
            errors.push(format!("min_window_duration: invalid format '{}' - {}", duration, e));
        }
    }

    if let Some(ref profiles) = config.profiles {
        if profiles.is_empty() {
            errors.push("profiles: must list at least one profile when set".to_string());
        }
    }

    if let Err(catalog_errors) = validate_catalog(&config.build_catalog()) {
        errors.extend(catalog_errors.into_iter().map(|e| format!("catalog.{}", e)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::EnvironmentalVariable;

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.engine_options().unwrap(), EngineOptions::default());
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
data_dir: /var/lib/skywell
min_window_duration: 2h
sensitivity: 0.8
profiles: [copd, asthma_child]
catalog:
  alerts:
    uv_biologically_effective_dose:
      window: instant
      alert_threshold: 5
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/skywell")));
        assert_eq!(
            config.profiles,
            Some(vec![HealthProfile::Copd, HealthProfile::AsthmaChild])
        );

        let options = config.engine_options().unwrap();
        assert_eq!(options.sensitivity, 0.8);
        assert_eq!(options.min_window_duration, chrono::Duration::hours(2));

        let catalog = config.build_catalog();
        let uv = catalog.alert(EnvironmentalVariable::Uv).unwrap();
        assert_eq!(uv.alert_threshold, 5.0);
        assert!(uv.relevant_profiles.is_empty());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = serde_saphyr::from_str("colour: blue");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_values_collected() {
        let config = Config {
            sensitivity: Some(0.0),
            min_window_duration: Some("soon".to_string()),
            ..Config::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("sensitivity"));
        assert!(errors[1].starts_with("min_window_duration"));
    }

    #[test]
    fn test_catalog_errors_prefixed() {
        let yaml = r#"
catalog:
  thresholds:
    pm10_conc: { safe: 50, danger: 50, unit: "µg m⁻³", window: 24h }
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("catalog.thresholds.pm10_conc"));
    }
}
