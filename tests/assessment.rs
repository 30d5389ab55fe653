use chrono::{Duration, NaiveDate, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use skywell_risk::config::Config;
use skywell_risk::scoring::TimeWindow;
use skywell_risk::{
    assess_profiles, Catalog, DataLoader, DirectoryLoader, EnvironmentalVariable, HealthProfile,
    RiskEngine,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()
}

/// Fresh directory under the system temp dir for one test.
fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("skywell_it_{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_hourly(dir: &PathBuf, variable: EnvironmentalVariable, values: &[f64]) {
    let start = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
    let samples: Vec<_> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::json!({
                "time": (start + Duration::hours(i as i64)).to_rfc3339(),
                "value": v,
            })
        })
        .collect();
    let loader = DirectoryLoader::new(dir.clone());
    fs::write(
        loader.file_path(date(), variable),
        serde_json::to_string(&samples).unwrap(),
    )
    .unwrap();
}

fn engine() -> RiskEngine {
    RiskEngine::new(Arc::new(Catalog::default()))
}

#[test]
fn test_assessment_from_series_files() {
    let dir = data_dir("blend");
    write_hourly(&dir, EnvironmentalVariable::Pm2p5, &[45.0; 24]);
    write_hourly(&dir, EnvironmentalVariable::No2, &[137.0; 24]);

    let loader = DirectoryLoader::new(dir.clone());
    let result = engine()
        .assess(HealthProfile::IschaemicHeartDisease, date(), &loader)
        .unwrap();

    assert_eq!(result.sub_scores[&EnvironmentalVariable::Pm2p5], 6);
    assert_eq!(result.sub_scores[&EnvironmentalVariable::No2], 4);
    assert_eq!(result.final_score, 5);
    assert_eq!(result.confidence, 1.0);
    assert!(result.missing_variables.is_empty());

    // Flat 137 over a 1h rolling mean stays above the NO2 alert of 100 all day
    let no2_windows = &result.risk_windows[&EnvironmentalVariable::No2];
    assert_eq!(no2_windows.len(), 1);
    assert_eq!(no2_windows[0].duration(), Duration::hours(23));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_uv_exceedance_window_from_files() {
    let dir = data_dir("uv");
    write_hourly(&dir, EnvironmentalVariable::Uv, &[1.0, 4.0, 5.0, 6.0, 2.0, 1.0]);

    let loader = DirectoryLoader::new(dir.clone());
    let result = engine().assess(HealthProfile::Vitiligo, date(), &loader).unwrap();

    let start = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
    assert_eq!(
        result.risk_windows[&EnvironmentalVariable::Uv],
        vec![TimeWindow {
            start: start + Duration::hours(1),
            end: start + Duration::hours(4),
            peak_value: 6.0,
        }]
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_malformed_file_counts_as_missing() {
    let dir = data_dir("malformed");
    write_hourly(&dir, EnvironmentalVariable::Pm2p5, &[45.0; 24]);
    let loader = DirectoryLoader::new(dir.clone());
    fs::write(loader.file_path(date(), EnvironmentalVariable::No2), "{ not json").unwrap();
    fs::write(dir.join("2025-06-05_notes.json"), "[]").unwrap();

    let result = engine()
        .assess(HealthProfile::IschaemicHeartDisease, date(), &loader)
        .unwrap();
    assert_eq!(result.missing_variables, vec![EnvironmentalVariable::No2]);
    assert_eq!(result.confidence, 0.75);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_other_dates_are_no_data() {
    let dir = data_dir("other_date");
    write_hourly(&dir, EnvironmentalVariable::Pm2p5, &[45.0; 24]);

    let loader = DirectoryLoader::new(dir.clone());
    let next_day = date().succ_opt().unwrap();
    let err = loader.load(next_day).unwrap_err();
    assert!(err.is_no_data());
    assert!(engine().assess(HealthProfile::Copd, next_day, &loader).is_err());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_config_overrides_reach_engine() {
    let yaml = r#"
sensitivity: 2.0
catalog:
  thresholds:
    pm2p5_conc: { safe: 15, danger: 75, unit: "µg m⁻³", window: 24h, curve: logistic }
"#;
    let config: Config = serde_saphyr::from_str(yaml).unwrap();
    assert!(skywell_risk::config::validate_config(&config).is_ok());

    let dir = data_dir("config");
    write_hourly(&dir, EnvironmentalVariable::Pm2p5, &[45.0; 24]);
    let loader = DirectoryLoader::new(dir.clone());

    let engine = RiskEngine::new(Arc::new(config.build_catalog()))
        .with_options(config.engine_options().unwrap());
    let result = engine
        .assess(HealthProfile::IschaemicHeartDisease, date(), &loader)
        .unwrap();

    // Logistic at the midpoint is 0.5; sensitivity 2 squares it: 1 + 9 * 0.25 = 3.25
    assert_eq!(result.sub_scores[&EnvironmentalVariable::Pm2p5], 3);

    let _ = fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_batch_over_all_profiles() {
    let dir = data_dir("batch");
    write_hourly(&dir, EnvironmentalVariable::Pm2p5, &[45.0; 24]);
    write_hourly(&dir, EnvironmentalVariable::BirchPollen, &[505.0; 24]);

    let loader: Arc<dyn DataLoader> = Arc::new(DirectoryLoader::new(dir.clone()));
    let outcomes = assess_profiles(&engine(), loader, date(), &HealthProfile::ALL).await;

    assert_eq!(outcomes.len(), HealthProfile::ALL.len());
    for (profile, result) in &outcomes {
        let assessment = result.as_ref().unwrap();
        assert_eq!(assessment.profile, *profile);
        assert!(assessment.confidence >= 0.5 && assessment.confidence <= 1.0);
        assert!(assessment
            .risk_windows
            .contains_key(&EnvironmentalVariable::Pm2p5));
    }

    let rhinitis = outcomes
        .iter()
        .find(|(p, _)| *p == HealthProfile::SeasonalAllergicRhinitis)
        .and_then(|(_, r)| r.as_ref().ok())
        .unwrap();
    assert_eq!(
        rhinitis.sub_scores[&EnvironmentalVariable::BirchPollen],
        6
    );

    let _ = fs::remove_dir_all(&dir);
}
