use chrono::Duration;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::fetch::ProfileOutcome;
use crate::scoring::{Catalog, HealthProfile, RiskAssessment, TimeWindow};

/// Coarse reading of a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn from_score(score: i32) -> Self {
        if score >= 8 {
            Severity::High
        } else if score >= 5 {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Severity::High => "Consider staying indoors or taking extra precautions.",
            Severity::Moderate => "Take normal precautions for your activities.",
            Severity::Low => "Conditions are generally safe for your profile.",
        }
    }
}

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a final score, appending an asterisk when some inputs were missing
pub fn format_score(score: i32, confidence: f64) -> String {
    if confidence < 1.0 {
        format!("{}*", score)
    } else {
        score.to_string()
    }
}

fn paint_score(text: &str, score: i32, use_colors: bool) -> String {
    if !use_colors {
        return text.to_string();
    }
    match Severity::from_score(score) {
        Severity::High => text.red().bold().to_string(),
        Severity::Moderate => text.yellow().bold().to_string(),
        Severity::Low => text.green().bold().to_string(),
    }
}

/// Format a duration compactly: "45m", "3h", "1d 6h"
pub fn format_duration(duration: Duration) -> String {
    let days = duration.num_days();
    let hours = duration.num_hours() - days * 24;
    if days >= 1 {
        if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    } else if duration.num_hours() >= 1 {
        format!("{}h", duration.num_hours())
    } else {
        format!("{}m", duration.num_minutes())
    }
}

/// Format a risk window as "start -> end (duration, peak value)"
pub fn format_window(window: &TimeWindow) -> String {
    format!(
        "{} -> {} ({}, peak {:.1})",
        window.start.format("%Y-%m-%d %H:%M"),
        window.end.format("%Y-%m-%d %H:%M"),
        format_duration(window.duration()),
        window.peak_value
    )
}

/// Multi-line report for one assessment
pub fn format_assessment(assessment: &RiskAssessment, catalog: &Catalog, use_colors: bool) -> String {
    let profile = assessment.profile;
    let severity = Severity::from_score(assessment.final_score);
    let score = paint_score(
        &format!("{}/10", assessment.final_score),
        assessment.final_score,
        use_colors,
    );

    let title = if use_colors {
        profile.label().bold().to_string()
    } else {
        profile.label().to_string()
    };

    let mut lines = vec![
        title,
        format!("  Date: {}", assessment.date),
        format!("  Risk: {} ({})", score, severity.label()),
        format!("  Confidence: {:.0}%", assessment.confidence * 100.0),
        format!(
            "  Top contributor: {} ({})",
            assessment.top_contributor.0, assessment.top_contributor.1
        ),
    ];

    if assessment.beyond_scale {
        lines.push("  Beyond scale values detected:".to_string());
        for (var, value) in &assessment.extreme_events {
            let unit = catalog.threshold(*var).map(|t| t.unit.as_str()).unwrap_or("");
            lines.push(format!("    {}: {:.1} {}", var, value, unit));
        }
    }

    if !assessment.missing_variables.is_empty() {
        let missing: Vec<_> = assessment.missing_variables.iter().map(|v| v.id()).collect();
        lines.push(format!("  Missing data: {}", missing.join(", ")));
    }

    lines.push("  Sub-scores:".to_string());
    if let Some(spec) = catalog.profile(profile) {
        for entry in &spec.weights {
            if let Some(sub) = assessment.sub_scores.get(&entry.variable) {
                lines.push(format!(
                    "    {:<32} {:>2}  (weight {})",
                    entry.variable.id(),
                    paint_score(&sub.to_string(), i32::from(*sub), use_colors),
                    entry.weight
                ));
            }
        }
    }

    let windows: Vec<_> = assessment
        .risk_windows
        .iter()
        .filter(|(_, w)| !w.is_empty())
        .collect();
    if !windows.is_empty() {
        lines.push("  Risk windows:".to_string());
        for (var, list) in windows {
            lines.push(format!("    {}:", var));
            for window in list {
                lines.push(format!("      {}", format_window(window)));
            }
        }
    }

    lines.push(format!("  {}", severity.advice()));
    lines.join("\n")
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// One line per profile: index, score, top contributor, label.
/// Failed profiles show their error in place of the score.
pub fn format_summary_table(outcomes: &[ProfileOutcome], use_colors: bool) -> String {
    if outcomes.is_empty() {
        return "No profiles assessed.".to_string();
    }

    let term_width = get_terminal_width();
    let score_width = 6;
    let contributor_width = 34;
    let separator = "  ";

    outcomes
        .iter()
        .enumerate()
        .map(|(idx, (profile, result))| {
            let index_str = format!("{:>2}.", idx + 1);
            let label = match term_width {
                Some(width) if width > score_width + contributor_width + 20 => {
                    truncate(profile.label(), width - score_width - contributor_width - 8)
                }
                Some(_) => truncate(profile.label(), 20),
                None => profile.label().to_string(),
            };

            match result {
                Ok(assessment) => {
                    let score = format!(
                        "{:>width$}",
                        format_score(assessment.final_score, assessment.confidence),
                        width = score_width
                    );
                    let contributor = format!(
                        "{:<width$}",
                        format!("{} ({})", assessment.top_contributor.0, assessment.top_contributor.1),
                        width = contributor_width
                    );
                    if use_colors {
                        format!(
                            "{} {}{}{}{}{}",
                            index_str.dimmed(),
                            paint_score(&score, assessment.final_score, true),
                            separator,
                            contributor.cyan(),
                            separator,
                            label
                        )
                    } else {
                        format!(
                            "{} {}{}{}{}{}",
                            index_str, score, separator, contributor, separator, label
                        )
                    }
                }
                Err(e) => {
                    let failed = format!("{:>width$}", "-", width = score_width);
                    if use_colors {
                        format!(
                            "{} {}{}{}{}",
                            index_str.dimmed(),
                            failed,
                            separator,
                            label,
                            format!(" ({})", e).red()
                        )
                    } else {
                        format!("{} {}{}{} ({})", index_str, failed, separator, label, e)
                    }
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format assessments as tab-separated values for scripting
/// Columns: profile, final_score, confidence, top_contributor, windows (no headers, no colors)
pub fn format_tsv(outcomes: &[ProfileOutcome]) -> String {
    outcomes
        .iter()
        .filter_map(|(profile, result)| result.as_ref().ok().map(|a| (profile, a)))
        .map(|(profile, a)| {
            format!(
                "{}\t{}\t{:.2}\t{}\t{}",
                profile,
                a.final_score,
                a.confidence,
                a.top_contributor.0,
                a.window_count()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Serialize)]
struct ReportEntry<'a> {
    profile: HealthProfile,
    label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assessment: Option<&'a RiskAssessment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Pretty JSON document with one entry per profile
pub fn format_json(outcomes: &[ProfileOutcome]) -> serde_json::Result<String> {
    let entries: Vec<ReportEntry> = outcomes
        .iter()
        .map(|(profile, result)| match result {
            Ok(assessment) => ReportEntry {
                profile: *profile,
                label: profile.label(),
                severity: Some(Severity::from_score(assessment.final_score)),
                assessment: Some(assessment),
                error: None,
            },
            Err(e) => ReportEntry {
                profile: *profile,
                label: profile.label(),
                severity: None,
                assessment: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::scoring::RiskEngine;
    use crate::series::{EnvironmentalVariable, SeriesSet, TimeSeries};
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 5).unwrap()
    }

    fn sample_assessment() -> RiskAssessment {
        let start = Utc.with_ymd_and_hms(2025, 6, 5, 0, 0, 0).unwrap();
        let mut data = SeriesSet::new();
        data.insert(
            EnvironmentalVariable::Uv,
            TimeSeries::from_values(start, Duration::hours(1), &[1.0, 4.0, 5.0, 6.0, 2.0, 30.0]).unwrap(),
        );
        RiskEngine::new(Arc::new(Catalog::default()))
            .assess_profile(HealthProfile::Lupus, date(), &data)
            .unwrap()
    }

    #[test]
    fn test_severity_bands() {
        assert_eq!(Severity::from_score(1), Severity::Low);
        assert_eq!(Severity::from_score(5), Severity::Moderate);
        assert_eq!(Severity::from_score(8), Severity::High);
        assert_eq!(Severity::from_score(12), Severity::High);
    }

    #[test]
    fn test_format_score_marks_incomplete() {
        assert_eq!(format_score(7, 1.0), "7");
        assert_eq!(format_score(7, 0.75), "7*");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::minutes(45)), "45m");
        assert_eq!(format_duration(Duration::hours(3)), "3h");
        assert_eq!(format_duration(Duration::hours(24)), "1d");
        assert_eq!(format_duration(Duration::hours(30)), "1d 6h");
    }

    #[test]
    fn test_format_assessment_plain() {
        let assessment = sample_assessment();
        let output = format_assessment(&assessment, &Catalog::default(), false);
        assert!(output.starts_with("Systemic lupus erythematosus"));
        assert!(output.contains("Missing data: pm2p5_conc"));
        assert!(output.contains("Risk windows:"));
        assert!(output.contains("2025-06-05 01:00 -> 2025-06-05 04:00 (3h, peak 6.0)"));
    }

    #[test]
    fn test_summary_table_includes_failures() {
        let outcomes = vec![
            (HealthProfile::Lupus, Ok(sample_assessment())),
            (HealthProfile::Copd, Err(RiskError::NoData { date: date() })),
        ];
        let output = format_summary_table(&outcomes, false);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("uv_biologically_effective_dose"));
        assert!(lines[1].contains("no environmental data found"));
    }

    #[test]
    fn test_tsv_skips_failures() {
        let outcomes = vec![
            (HealthProfile::Copd, Err(RiskError::NoData { date: date() })),
            (HealthProfile::Lupus, Ok(sample_assessment())),
        ];
        let output = format_tsv(&outcomes);
        assert_eq!(output.lines().count(), 1);
        assert!(output.starts_with("lupus\t"));
    }

    #[test]
    fn test_json_report() {
        let outcomes = vec![
            (HealthProfile::Lupus, Ok(sample_assessment())),
            (HealthProfile::Copd, Err(RiskError::NoData { date: date() })),
        ];
        let json: serde_json::Value = serde_json::from_str(&format_json(&outcomes).unwrap()).unwrap();
        assert_eq!(json[0]["profile"], "lupus");
        assert!(json[0]["assessment"]["risk_windows"]["uv_biologically_effective_dose"].is_array());
        assert!(json[1]["assessment"].is_null());
        assert!(json[1]["error"].as_str().unwrap().contains("2025-06-05"));
    }
}
