use std::collections::HashSet;

use super::config::Catalog;
use super::profile::HealthProfile;
use crate::series::EnvironmentalVariable;

/// Validate the catalog at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_catalog(catalog: &Catalog) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    for (var, spec) in &catalog.thresholds {
        if !spec.safe.is_finite() || !spec.danger.is_finite() {
            errors.push(format!("thresholds.{}: bounds must be finite numbers", var));
        } else if spec.danger <= spec.safe {
            errors.push(format!(
                "thresholds.{}: danger ({}) must be greater than safe ({})",
                var, spec.danger, spec.safe
            ));
        }
    }

    for profile in HealthProfile::ALL {
        let Some(spec) = catalog.profile(profile) else {
            errors.push(format!("profiles.{}: missing profile definition", profile));
            continue;
        };

        if spec.weights.is_empty() {
            errors.push(format!("profiles.{}.weights: must not be empty", profile));
        }

        let mut seen = HashSet::new();
        for (i, entry) in spec.weights.iter().enumerate() {
            if !(entry.weight.is_finite() && entry.weight > 0.0) {
                errors.push(format!(
                    "profiles.{}.weights[{}]: weight for {} must be positive, got {}",
                    profile, i, entry.variable, entry.weight
                ));
            }
            if !seen.insert(entry.variable) {
                errors.push(format!(
                    "profiles.{}.weights[{}]: {} listed more than once",
                    profile, i, entry.variable
                ));
            }
            if catalog.threshold(entry.variable).is_none() {
                errors.push(format!(
                    "profiles.{}.weights[{}]: {} has no threshold definition",
                    profile, i, entry.variable
                ));
            }
        }

        if !(spec.hazard_multiplier.is_finite() && spec.hazard_multiplier > 0.0) {
            errors.push(format!(
                "profiles.{}.hazard_multiplier: must be positive, got {}",
                profile, spec.hazard_multiplier
            ));
        }
    }

    let mut family_members = HashSet::new();
    for (i, family) in catalog.pollen_families.iter().enumerate() {
        if family.members.is_empty() || family.members.len() > 2 {
            errors.push(format!(
                "pollen_families[{}] ({}): must have one or two members",
                i, family.name
            ));
        }
        for member in &family.members {
            if !member.is_pollen() {
                errors.push(format!(
                    "pollen_families[{}] ({}): {} is not a pollen variable",
                    i, family.name, member
                ));
            }
            if !family_members.insert(*member) {
                errors.push(format!(
                    "pollen_families[{}] ({}): {} already belongs to another family",
                    i, family.name, member
                ));
            }
            if catalog.threshold(*member).is_none() {
                errors.push(format!(
                    "pollen_families[{}] ({}): {} has no threshold definition",
                    i, family.name, member
                ));
            }
        }
    }
    for var in EnvironmentalVariable::ALL.iter().filter(|v| v.is_pollen()) {
        if !family_members.contains(var) {
            errors.push(format!("pollen_families: {} is not in any family", var));
        }
    }

    for (var, spec) in &catalog.alerts {
        if !spec.alert_threshold.is_finite() {
            errors.push(format!("alerts.{}.alert_threshold: must be a finite number", var));
        }
        if catalog.threshold(*var).is_none() {
            errors.push(format!("alerts.{}: has no threshold definition", var));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
